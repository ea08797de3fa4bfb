use std::time::Duration;

use crate::services::{
    debounce::{Debouncer, DEFAULT_DELAY},
    order_validation::{validate_order, AccountSnapshot, FeeSchedule, OrderInput, ValidationReport},
};

/// Order ticket state. Edits are validated after the user pauses typing;
/// only the last edit inside the delay produces a report.
pub struct OrderForm {
    schedule: FeeSchedule,
    account: AccountSnapshot,
    market_price: f64,
    debouncer: Debouncer,
}

impl OrderForm {
    pub fn new(schedule: FeeSchedule, account: AccountSnapshot, market_price: f64) -> Self {
        Self::with_delay(schedule, account, market_price, DEFAULT_DELAY)
    }

    pub fn with_delay(schedule: FeeSchedule, account: AccountSnapshot, market_price: f64, delay: Duration) -> Self {
        Self {
            schedule,
            account,
            market_price,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn set_account(&mut self, account: AccountSnapshot) {
        self.account = account;
    }

    pub fn set_market_price(&mut self, price: f64) {
        self.market_price = price;
    }

    /// Validates immediately, e.g. on submit.
    pub fn validate_now(&self, input: &OrderInput) -> ValidationReport {
        validate_order(input, self.market_price, self.account, &self.schedule)
    }

    /// Debounced validation. Account and price are read when the edit is made.
    pub fn on_change<F>(&self, input: OrderInput, on_report: F)
    where
        F: FnOnce(ValidationReport) + Send + 'static,
    {
        let schedule = self.schedule;
        let account = self.account;
        let price = self.market_price;

        self.debouncer.call(move || {
            on_report(validate_order(&input, price, account, &schedule));
        });
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}

impl Drop for OrderForm {
    fn drop(&mut self) {
        self.debouncer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::models::{OrderMethod, OrderSide};

    fn input(qty: f64) -> OrderInput {
        OrderInput {
            symbol: "RELIANCE".into(),
            side: OrderSide::Buy,
            method: OrderMethod::Market,
            quantity: qty,
            limit_price: None,
        }
    }

    #[tokio::test]
    async fn rapid_edits_yield_one_report_for_the_last() {
        let form = OrderForm::with_delay(
            FeeSchedule::default(),
            AccountSnapshot { cash: 10_000.0, held_quantity: 0 },
            100.0,
            Duration::from_millis(30),
        );
        let reports = Arc::new(Mutex::new(Vec::<ValidationReport>::new()));

        for q in [1.0, 12.0, 5.0] {
            let reports = reports.clone();
            form.on_change(input(q), move |r| reports.lock().unwrap().push(r));
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].quantity, 5);
        assert!(reports[0].is_valid);
    }

    #[test]
    fn validate_now_uses_current_account() {
        let mut form = OrderForm::new(
            FeeSchedule::default(),
            AccountSnapshot { cash: 10_000.0, held_quantity: 0 },
            100.0,
        );
        assert!(form.validate_now(&input(50.0)).is_valid);

        form.set_account(AccountSnapshot { cash: 100.0, held_quantity: 0 });
        assert!(!form.validate_now(&input(50.0)).is_valid);
    }
}
