use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use tokio::time;

use crate::{
    error::AppError,
    models::{Order, OrderMethod, OrderStatus},
    AppState,
};

use super::{
    stocks_service,
    trading_service::{self, FillOutcome},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub checked: usize,
    pub filled: usize,
    pub rejected: usize,
}

pub fn spawn_limit_order_monitor(state: AppState) -> tokio::task::JoinHandle<()> {
    let every = Duration::from_secs(state.settings.limit_order_poll_secs.max(1));

    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match run_tick(&state).await {
                Ok(r) if r.filled + r.rejected > 0 => {
                    tracing::info!("limit orders: {} checked, {} filled, {} rejected", r.checked, r.filled, r.rejected);
                }
                Ok(_) => {}
                Err(e) => tracing::error!("limit order monitor tick failed: {e}"),
            }
        }
    })
}

pub async fn run_tick(state: &AppState) -> Result<TickReport, AppError> {
    let orders = trading_service::collection(state);

    // oldest first so earlier orders claim cash first
    let find_opts = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
    let mut cursor = orders
        .find(
            doc! {
                "status": OrderStatus::Pending.as_str(),
                "method": "LIMIT",
            },
            find_opts,
        )
        .await?;

    let mut by_symbol: HashMap<String, Vec<Order>> = HashMap::new();
    while let Some(item) = cursor.next().await {
        let o = item?;
        if o.method == OrderMethod::Limit {
            by_symbol.entry(o.symbol.clone()).or_default().push(o);
        }
    }

    let mut report = TickReport::default();
    if by_symbol.is_empty() {
        return Ok(report);
    }

    for (sym, group) in by_symbol {
        report.checked += group.len();

        let price = match stocks_service::current_price(state, &sym).await {
            Ok(p) => p.price,
            Err(e) => {
                tracing::warn!("limit orders for {sym} skipped: {e}");
                continue;
            }
        };
        if !price.is_finite() || price <= 0.0 {
            continue;
        }

        for o in group.iter().filter(|o| trading_service::limit_reached(o, price)) {
            match trading_service::fill_pending(state, o, price).await {
                Ok(FillOutcome::Filled) => report.filled += 1,
                Ok(FillOutcome::Rejected(_)) => report.rejected += 1,
                Ok(FillOutcome::Skipped) => {}
                Err(e) => tracing::warn!("limit order {} not filled this tick: {e}", o.id),
            }
        }
    }

    Ok(report)
}
