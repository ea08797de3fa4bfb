use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use serde::Serialize;

use crate::{
    error::AppError,
    events,
    models::{NotificationKind, Order, OrderMethod, OrderSide, OrderStatus, OrderView},
    AppState,
};

use super::{
    live_chart_service::normalize_symbol,
    notification_service,
    order_validation::{check_shape, validate_order, AccountSnapshot, OrderInput, ValidationReport},
    portfolio_service,
    stocks_service,
};

pub(crate) fn collection(state: &AppState) -> mongodb::Collection<Order> {
    state.db.collection::<Order>("orders")
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: OrderView,
    pub warnings: Vec<String>,
    pub balance: f64,
}

fn verb(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "Bought",
        OrderSide::Sell => "Sold",
    }
}

/// Checks an order against the caller's portfolio without placing it.
pub async fn validate(state: &AppState, user_id: ObjectId, mut input: OrderInput) -> Result<ValidationReport, AppError> {
    check_shape(&input).map_err(AppError::Validation)?;
    input.symbol = normalize_symbol(&input.symbol)?;

    let market = stocks_service::current_price(state, &input.symbol).await?;
    let pf = portfolio_service::get_or_create(state, user_id).await?;

    Ok(validate_order(&input, market.price, AccountSnapshot::of(&pf, &input.symbol), &state.fees))
}

pub async fn place_order(state: &AppState, user_id: ObjectId, mut input: OrderInput) -> Result<PlacedOrder, AppError> {
    // shape first so bad input never costs a quote or a db read
    let quantity = check_shape(&input).map_err(AppError::Validation)?;
    input.symbol = normalize_symbol(&input.symbol)?;
    let sym = input.symbol.clone();

    let market = stocks_service::current_price(state, &sym).await?;
    let mut pf = portfolio_service::get_or_create(state, user_id).await?;

    let report = validate_order(&input, market.price, AccountSnapshot::of(&pf, &sym), &state.fees);
    if !report.is_valid {
        return Err(AppError::Validation(report.errors));
    }
    let amounts = report
        .amounts
        .ok_or_else(|| AppError::Internal("validated order has no amounts".into()))?;

    let now = Utc::now().timestamp();
    let order_id = ObjectId::new();

    if input.method == OrderMethod::Limit {
        let order = Order {
            id: order_id,
            user_id,
            symbol: sym.clone(),
            side: input.side,
            method: OrderMethod::Limit,
            quantity,
            price: report.price,
            fee: amounts.fee,
            total: amounts.net,
            status: OrderStatus::Pending,
            reason: None,
            created_at: now,
            filled_at: None,
        };
        collection(state).insert_one(&order, None).await?;

        tracing::info!("limit {} {quantity} {sym} @ {:.2} queued for {user_id}", input.side, report.price);
        events::publish(&state.events_tx, user_id, &[events::ORDERS_UPDATED]);
        notification_service::notify_quietly(
            state,
            user_id,
            NotificationKind::Order,
            "Limit order placed",
            &format!("{} {quantity} {sym} at {:.2} is waiting to fill.", input.side, report.price),
        )
        .await;

        return Ok(PlacedOrder {
            order: order.into(),
            warnings: report.warnings,
            balance: pf.balance,
        });
    }

    let prev = pf.updated_at;
    let stamp = portfolio_service::next_stamp(prev);
    let tx = match input.side {
        OrderSide::Buy => pf.apply_buy(&sym, quantity, report.price, amounts.fee, Some(order_id.to_hex()), stamp),
        OrderSide::Sell => pf.apply_sell(&sym, quantity, report.price, amounts.fee, Some(order_id.to_hex()), stamp),
    }
    .map_err(AppError::Validation)?;

    portfolio_service::save(state, &pf, prev).await?;

    let order = Order {
        id: order_id,
        user_id,
        symbol: sym.clone(),
        side: input.side,
        method: OrderMethod::Market,
        quantity,
        price: report.price,
        fee: amounts.fee,
        total: tx.total,
        status: OrderStatus::Completed,
        reason: None,
        created_at: now,
        filled_at: Some(now),
    };

    // the trade already happened; a missing order row is logged, not undone
    if let Err(e) = collection(state).insert_one(&order, None).await {
        tracing::error!("trade {order_id} applied but order insert failed: {e}");
    }

    tracing::info!(
        "market {} {quantity} {sym} @ {:.2} ({}) for {user_id}",
        input.side,
        report.price,
        market.source.as_str()
    );
    events::publish(&state.events_tx, user_id, &[events::ORDERS_UPDATED, events::PORTFOLIO_UPDATED]);
    notification_service::notify_quietly(
        state,
        user_id,
        NotificationKind::Order,
        "Order filled",
        &format!("{} {quantity} {sym} at {:.2}.", verb(input.side), report.price),
    )
    .await;

    Ok(PlacedOrder {
        order: order.into(),
        warnings: report.warnings,
        balance: pf.balance,
    })
}

pub async fn list_orders(
    state: &AppState,
    user_id: ObjectId,
    status: Option<OrderStatus>,
    limit: Option<i64>,
) -> Result<Vec<Order>, AppError> {
    let mut filter = doc! { "user_id": user_id };
    if let Some(s) = status {
        filter.insert("status", s.as_str());
    }

    let find_opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(limit.unwrap_or(50).clamp(1, 200))
        .build();

    let mut cursor = collection(state).find(filter, find_opts).await?;

    let mut out: Vec<Order> = vec![];
    while let Some(res) = cursor.next().await {
        out.push(res?);
    }
    Ok(out)
}

pub async fn get_order(state: &AppState, user_id: ObjectId, id: ObjectId) -> Result<Order, AppError> {
    collection(state)
        .find_one(doc! { "_id": id, "user_id": user_id }, None)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}

pub async fn cancel_order(state: &AppState, user_id: ObjectId, id: ObjectId) -> Result<Order, AppError> {
    let res = collection(state)
        .update_one(
            doc! { "_id": id, "user_id": user_id, "status": OrderStatus::Pending.as_str() },
            doc! { "$set": { "status": OrderStatus::Cancelled.as_str(), "reason": "Cancelled by user" } },
            None,
        )
        .await?;

    let order = get_order(state, user_id, id).await?;
    if res.matched_count == 0 {
        return Err(AppError::Conflict(format!(
            "Only pending orders can be cancelled (this one is {}).",
            order.status.as_str()
        )));
    }

    events::publish(&state.events_tx, user_id, &[events::ORDERS_UPDATED]);
    Ok(order)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    Filled,
    Rejected(String),
    // no longer pending when we got to it
    Skipped,
}

async fn reject(state: &AppState, order: &Order, reason: &str) -> Result<FillOutcome, AppError> {
    let res = collection(state)
        .update_one(
            doc! { "_id": order.id, "status": OrderStatus::Pending.as_str() },
            doc! { "$set": { "status": OrderStatus::Rejected.as_str(), "reason": reason } },
            None,
        )
        .await?;

    if res.matched_count == 0 {
        return Ok(FillOutcome::Skipped);
    }

    tracing::info!("limit order {} rejected: {reason}", order.id);
    events::publish(&state.events_tx, order.user_id, &[events::ORDERS_UPDATED]);
    notification_service::notify_quietly(
        state,
        order.user_id,
        NotificationKind::Order,
        "Limit order rejected",
        &format!("{} {} {}: {reason}", order.side, order.quantity, order.symbol),
    )
    .await;

    Ok(FillOutcome::Rejected(reason.to_string()))
}

/// Fills a triggered PENDING limit order at its limit price, re-validating
/// it against the portfolio as it is now.
pub async fn fill_pending(state: &AppState, order: &Order, market_price: f64) -> Result<FillOutcome, AppError> {
    let mut pf = portfolio_service::get_or_create(state, order.user_id).await?;

    let input = OrderInput {
        symbol: order.symbol.clone(),
        side: order.side,
        method: OrderMethod::Limit,
        quantity: order.quantity as f64,
        limit_price: Some(order.price),
    };
    let report = validate_order(&input, market_price, AccountSnapshot::of(&pf, &order.symbol), &state.fees);

    let amounts = match report.amounts {
        Some(a) if report.is_valid => a,
        _ => {
            let mut reasons: Vec<String> = report.errors.into_values().collect();
            reasons.sort();
            return reject(state, order, &reasons.join(" ")).await;
        }
    };

    let now = Utc::now().timestamp();

    // claim it first so a concurrent cancel cannot also win
    let claimed = collection(state)
        .update_one(
            doc! { "_id": order.id, "status": OrderStatus::Pending.as_str() },
            doc! { "$set": {
                "status": OrderStatus::Completed.as_str(),
                "fee": amounts.fee,
                "total": amounts.net,
                "filled_at": now,
            } },
            None,
        )
        .await?;
    if claimed.matched_count == 0 {
        return Ok(FillOutcome::Skipped);
    }

    let prev = pf.updated_at;
    let stamp = portfolio_service::next_stamp(prev);
    let applied = match order.side {
        OrderSide::Buy => pf.apply_buy(&order.symbol, order.quantity, order.price, amounts.fee, Some(order.id.to_hex()), stamp),
        OrderSide::Sell => pf.apply_sell(&order.symbol, order.quantity, order.price, amounts.fee, Some(order.id.to_hex()), stamp),
    };

    let saved = match applied {
        Ok(_) => portfolio_service::save(state, &pf, prev).await,
        Err(errs) => Err(AppError::Validation(errs)),
    };

    if let Err(e) = saved {
        // hand it back to the next tick
        collection(state)
            .update_one(
                doc! { "_id": order.id },
                doc! { "$set": { "status": OrderStatus::Pending.as_str(), "filled_at": null } },
                None,
            )
            .await?;
        return Err(e);
    }

    tracing::info!("limit order {} filled at {:.2}", order.id, order.price);
    events::publish(&state.events_tx, order.user_id, &[events::ORDERS_UPDATED, events::PORTFOLIO_UPDATED]);
    notification_service::notify_quietly(
        state,
        order.user_id,
        NotificationKind::Order,
        "Limit order filled",
        &format!("{} {} {} at {:.2}.", verb(order.side), order.quantity, order.symbol, order.price),
    )
    .await;

    Ok(FillOutcome::Filled)
}

/// Whether `price` reaches the limit of a pending order.
pub fn limit_reached(order: &Order, price: f64) -> bool {
    match order.side {
        OrderSide::Buy => price <= order.price,
        OrderSide::Sell => price >= order.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(side: OrderSide, limit: f64) -> Order {
        Order {
            id: ObjectId::new(),
            user_id: ObjectId::new(),
            symbol: "TCS".into(),
            side,
            method: OrderMethod::Limit,
            quantity: 1,
            price: limit,
            fee: 1.0,
            total: limit + 1.0,
            status: OrderStatus::Pending,
            reason: None,
            created_at: 0,
            filled_at: None,
        }
    }

    #[test]
    fn buy_limit_triggers_at_or_below() {
        let o = pending(OrderSide::Buy, 100.0);
        assert!(limit_reached(&o, 99.5));
        assert!(limit_reached(&o, 100.0));
        assert!(!limit_reached(&o, 100.01));
    }

    #[test]
    fn sell_limit_triggers_at_or_above() {
        let o = pending(OrderSide::Sell, 100.0);
        assert!(limit_reached(&o, 100.0));
        assert!(limit_reached(&o, 120.0));
        assert!(!limit_reached(&o, 99.99));
    }
}
