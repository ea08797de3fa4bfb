use axum::{Router, routing::{get, post}};

use crate::{AppState, controllers::trading_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/orders", get(trading_controller::list).post(trading_controller::place))
        .route("/api/orders/validate", post(trading_controller::validate))
        .route("/api/orders/:id", get(trading_controller::get))
        .route("/api/orders/:id/cancel", post(trading_controller::cancel))
}
