use axum::{Router, routing::get};
use crate::{AppState, controllers::market_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/market/status", get(market_controller::status))
}
