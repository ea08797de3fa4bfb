use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use serde::Serialize;

use crate::{
    error::AppError,
    events,
    models::{DataSource, NotificationKind, Transaction, VirtualMoney},
    AppState,
};

use super::{notification_service, stocks_service};

fn collection(state: &AppState) -> mongodb::Collection<VirtualMoney> {
    state.db.collection::<VirtualMoney>("portfolios")
}

/// Gets the user's portfolio. If missing, creates it with the starting balance.
pub async fn get_or_create(state: &AppState, user_id: ObjectId) -> Result<VirtualMoney, AppError> {
    let portfolios = collection(state);

    if let Some(pf) = portfolios.find_one(doc! { "user_id": user_id }, None).await? {
        return Ok(pf);
    }

    let pf = VirtualMoney::new(user_id, state.settings.starting_balance, Utc::now().timestamp_millis());

    match portfolios.insert_one(&pf, None).await {
        Ok(_) => {
            tracing::info!("created portfolio for {user_id}");
            Ok(pf)
        }
        // another request created it first (unique user_id)
        Err(e) => match portfolios.find_one(doc! { "user_id": user_id }, None).await? {
            Some(existing) => Ok(existing),
            None => Err(AppError::Database(e)),
        },
    }
}

/// Write stamp for the next save; strictly after `prev` so the guard in
/// [`save`] can tell writes apart.
pub fn next_stamp(prev: i64) -> i64 {
    Utc::now().timestamp_millis().max(prev + 1)
}

/// Replaces the whole document, but only if nobody wrote since `prev_updated_at`.
pub async fn save(state: &AppState, pf: &VirtualMoney, prev_updated_at: i64) -> Result<(), AppError> {
    let res = collection(state)
        .replace_one(doc! { "_id": pf.id, "updated_at": prev_updated_at }, pf, None)
        .await?;

    if res.matched_count == 0 {
        return Err(AppError::Conflict(
            "Your portfolio changed while this request ran. Please try again.".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: i64,
    pub average_price: f64,
    pub current_price: f64,
    pub price_source: Option<DataSource>,
    pub invested: f64,
    pub market_value: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub balance: f64,
    pub holdings: Vec<HoldingView>,
    pub invested: f64,
    pub market_value: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub total_equity: f64,
    pub updated_at: i64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn pct(part: f64, of: f64) -> f64 {
    if of > 0.0 { round2(part / of * 100.0) } else { 0.0 }
}

pub async fn summary(state: &AppState, user_id: ObjectId) -> Result<PortfolioSummary, AppError> {
    let pf = get_or_create(state, user_id).await?;

    let mut holdings: Vec<HoldingView> = vec![];
    for h in &pf.holdings {
        // an unpriceable holding is shown at cost
        let (price, source) = match stocks_service::current_price(state, &h.symbol).await {
            Ok(p) => (p.price, Some(p.source)),
            Err(e) => {
                tracing::warn!("no price for {}: {e}", h.symbol);
                (h.average_price, None)
            }
        };

        let invested = h.average_price * h.quantity as f64;
        let market_value = price * h.quantity as f64;
        let pnl = market_value - invested;

        holdings.push(HoldingView {
            symbol: h.symbol.clone(),
            quantity: h.quantity,
            average_price: round2(h.average_price),
            current_price: round2(price),
            price_source: source,
            invested: round2(invested),
            market_value: round2(market_value),
            pnl: round2(pnl),
            pnl_percent: pct(pnl, invested),
        });
    }

    let invested: f64 = holdings.iter().map(|h| h.invested).sum();
    let market_value: f64 = holdings.iter().map(|h| h.market_value).sum();
    let pnl = market_value - invested;

    Ok(PortfolioSummary {
        balance: round2(pf.balance),
        holdings,
        invested: round2(invested),
        market_value: round2(market_value),
        pnl: round2(pnl),
        pnl_percent: pct(pnl, invested),
        total_equity: round2(pf.balance + market_value),
        updated_at: pf.updated_at,
    })
}

/// Newest first.
pub async fn transactions(state: &AppState, user_id: ObjectId, limit: Option<usize>) -> Result<Vec<Transaction>, AppError> {
    let pf = get_or_create(state, user_id).await?;
    let limit = limit.unwrap_or(50).clamp(1, 500);

    Ok(pf.transactions.into_iter().rev().take(limit).collect())
}

pub async fn reset(state: &AppState, user_id: ObjectId) -> Result<VirtualMoney, AppError> {
    let mut pf = get_or_create(state, user_id).await?;
    let prev = pf.updated_at;

    pf.reset(state.settings.starting_balance, next_stamp(prev));
    save(state, &pf, prev).await?;

    tracing::info!("portfolio reset for {user_id}");
    events::publish(&state.events_tx, user_id, &[events::PORTFOLIO_UPDATED]);

    notification_service::notify_quietly(
        state,
        user_id,
        NotificationKind::Portfolio,
        "Portfolio reset",
        &format!("Your balance is back to {:.2}.", state.settings.starting_balance),
    )
    .await;

    Ok(pf)
}
