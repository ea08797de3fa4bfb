use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::FieldErrors,
    models::{OrderMethod, OrderSide, VirtualMoney},
};

// a buy using more than this share of cash gets a warning
const LARGE_ORDER_SHARE: f64 = 0.5;
// limit price this far from the market gets a warning
const LIMIT_DEVIATION_WARN: f64 = 0.10;

/// Brokerage: `rate` of the gross amount, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeSchedule {
    pub rate: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { rate: 0.001, min: 1.0, max: 100.0 }
    }
}

impl FeeSchedule {
    /// Unusable values (non-finite or negative) fall back to the defaults,
    /// and `max` is never below `min`, so `fee` cannot panic.
    pub fn from_settings(settings: &Settings) -> Self {
        let d = Self::default();
        let usable = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };

        let min = usable(settings.fee_min, d.min);
        Self {
            rate: usable(settings.fee_rate, d.rate),
            min,
            max: usable(settings.fee_max, d.max).max(min),
        }
    }

    pub fn fee(&self, gross: f64) -> f64 {
        round2((gross * self.rate).clamp(self.min, self.max))
    }

    pub fn amounts(&self, side: OrderSide, quantity: i64, price: f64) -> OrderAmounts {
        let gross = round2(quantity as f64 * price);
        let fee = self.fee(gross);
        let net = match side {
            OrderSide::Buy => gross + fee,
            OrderSide::Sell => gross - fee,
        };
        OrderAmounts { gross, fee, net: round2(net) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderAmounts {
    pub gross: f64,
    pub fee: f64,
    pub net: f64,
}

/// Raw order form values. Quantity arrives as a float so fractional or
/// non-finite input can be reported instead of failing to parse.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub method: OrderMethod,
    pub quantity: f64,
    #[serde(default)]
    pub limit_price: Option<f64>,
}

/// What the validator needs to know about the account.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccountSnapshot {
    pub cash: f64,
    pub held_quantity: i64,
}

impl AccountSnapshot {
    pub fn of(portfolio: &VirtualMoney, symbol: &str) -> Self {
        Self {
            cash: portfolio.balance,
            held_quantity: portfolio.held_quantity(symbol),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: FieldErrors,
    pub warnings: Vec<String>,
    pub quantity: i64,
    pub price: f64,
    pub amounts: Option<OrderAmounts>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Checks shape only: symbol present, whole positive quantity, usable limit price.
/// Returns the whole quantity on success.
pub fn check_shape(input: &OrderInput) -> Result<i64, FieldErrors> {
    let mut errs = FieldErrors::new();

    if input.symbol.trim().is_empty() {
        errs.insert("symbol".into(), "Missing symbol.".into());
    }

    let q = input.quantity;
    if !q.is_finite() || q <= 0.0 || q.fract() != 0.0 || q > i64::MAX as f64 {
        errs.insert("quantity".into(), "Enter a valid quantity.".into());
    }

    if input.method == OrderMethod::Limit {
        match input.limit_price {
            Some(p) if p.is_finite() && p > 0.0 => {}
            _ => {
                errs.insert("price".into(), "Enter a valid limit price.".into());
            }
        }
    }

    if errs.is_empty() { Ok(q as i64) } else { Err(errs) }
}

/// Full validation against an account. `market_price` is the current quote;
/// MARKET orders are priced at it, LIMIT orders at their limit.
pub fn validate_order(
    input: &OrderInput,
    market_price: f64,
    account: AccountSnapshot,
    schedule: &FeeSchedule,
) -> ValidationReport {
    let mut warnings: Vec<String> = vec![];

    let quantity = match check_shape(input) {
        Ok(q) => q,
        Err(errors) => {
            return ValidationReport {
                is_valid: false,
                errors,
                warnings,
                quantity: 0,
                price: 0.0,
                amounts: None,
            };
        }
    };

    let mut errors = FieldErrors::new();

    let price = match input.method {
        OrderMethod::Market => market_price,
        OrderMethod::Limit => input.limit_price.unwrap_or(market_price),
    };

    if !price.is_finite() || price <= 0.0 {
        errors.insert("price".into(), "Price unavailable.".into());
        return ValidationReport {
            is_valid: false,
            errors,
            warnings,
            quantity,
            price: 0.0,
            amounts: None,
        };
    }

    let amounts = schedule.amounts(input.side, quantity, price);

    match input.side {
        OrderSide::Buy => {
            if amounts.net > account.cash {
                errors.insert(
                    "balance".into(),
                    format!("Insufficient funds: need {:.2}, available {:.2}.", amounts.net, account.cash),
                );
            } else if amounts.net > account.cash * LARGE_ORDER_SHARE {
                warnings.push("This order uses more than half of your available cash.".into());
            }
        }
        OrderSide::Sell => {
            if account.held_quantity <= 0 {
                errors.insert("quantity".into(), "You have no position to sell.".into());
            } else if quantity > account.held_quantity {
                errors.insert(
                    "quantity".into(),
                    format!("You only hold {} shares.", account.held_quantity),
                );
            } else if quantity == account.held_quantity {
                warnings.push("This sells your entire position.".into());
            }
        }
    }

    if input.method == OrderMethod::Limit && market_price.is_finite() && market_price > 0.0 {
        let deviation = (price - market_price).abs() / market_price;
        if deviation > LIMIT_DEVIATION_WARN {
            warnings.push(format!(
                "Limit price is {:.1}% away from the market price.",
                deviation * 100.0
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        quantity,
        price,
        amounts: Some(amounts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(side: OrderSide, qty: f64) -> OrderInput {
        OrderInput {
            symbol: "AAPL".into(),
            side,
            method: OrderMethod::Market,
            quantity: qty,
            limit_price: None,
        }
    }

    #[test]
    fn fee_is_clamped_between_min_and_max() {
        let s = FeeSchedule::default();
        assert_eq!(s.fee(10.0), 1.0);
        assert_eq!(s.fee(50_000.0), 50.0);
        assert_eq!(s.fee(10_000_000.0), 100.0);
    }

    #[test]
    fn non_finite_fee_settings_use_defaults() {
        let mut settings = crate::config::load();
        settings.fee_rate = f64::NAN;
        settings.fee_min = f64::NAN;
        settings.fee_max = f64::INFINITY;

        let s = FeeSchedule::from_settings(&settings);
        assert_eq!(s, FeeSchedule::default());
        assert_eq!(s.fee(10.0), 1.0);

        settings.fee_rate = 0.002;
        settings.fee_min = 5.0;
        settings.fee_max = 2.0;
        let s = FeeSchedule::from_settings(&settings);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.fee(100.0), 5.0);
    }

    #[test]
    fn net_adds_fee_on_buy_and_subtracts_on_sell() {
        let s = FeeSchedule::default();
        let buy = s.amounts(OrderSide::Buy, 10, 500.0);
        let sell = s.amounts(OrderSide::Sell, 10, 500.0);

        assert_eq!(buy.gross, 5_000.0);
        assert_eq!(buy.fee, 5.0);
        assert_eq!(buy.net, 5_005.0);
        assert_eq!(sell.net, 4_995.0);
    }

    #[test]
    fn buy_rejected_when_cash_short() {
        let acct = AccountSnapshot { cash: 1_000.0, held_quantity: 0 };
        let r = validate_order(&input(OrderSide::Buy, 10.0), 100.0, acct, &FeeSchedule::default());

        // 1000 gross + 1 fee > 1000 cash
        assert!(!r.is_valid);
        assert!(r.errors.contains_key("balance"));
    }

    #[test]
    fn sell_rejected_when_holding_too_small() {
        let acct = AccountSnapshot { cash: 0.0, held_quantity: 3 };
        let r = validate_order(&input(OrderSide::Sell, 5.0), 100.0, acct, &FeeSchedule::default());

        assert!(!r.is_valid);
        assert_eq!(r.errors.get("quantity").unwrap(), "You only hold 3 shares.");
    }

    #[test]
    fn sell_of_whole_position_warns() {
        let acct = AccountSnapshot { cash: 0.0, held_quantity: 5 };
        let r = validate_order(&input(OrderSide::Sell, 5.0), 100.0, acct, &FeeSchedule::default());

        assert!(r.is_valid);
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn fractional_and_non_positive_quantities_fail_shape() {
        for q in [0.0, -1.0, 1.5, f64::NAN, f64::INFINITY] {
            let errs = check_shape(&input(OrderSide::Buy, q)).unwrap_err();
            assert!(errs.contains_key("quantity"), "qty {q}");
        }
    }

    #[test]
    fn limit_order_needs_price_and_uses_it() {
        let mut i = input(OrderSide::Buy, 2.0);
        i.method = OrderMethod::Limit;
        assert!(check_shape(&i).unwrap_err().contains_key("price"));

        i.limit_price = Some(80.0);
        let acct = AccountSnapshot { cash: 10_000.0, held_quantity: 0 };
        let r = validate_order(&i, 100.0, acct, &FeeSchedule::default());

        assert!(r.is_valid);
        assert_eq!(r.price, 80.0);
        assert!(r.warnings.iter().any(|w| w.contains("20.0%")));
    }

    #[test]
    fn missing_market_price_is_an_error() {
        let acct = AccountSnapshot { cash: 10_000.0, held_quantity: 0 };
        let r = validate_order(&input(OrderSide::Buy, 1.0), f64::NAN, acct, &FeeSchedule::default());
        assert!(r.errors.contains_key("price"));
    }
}
