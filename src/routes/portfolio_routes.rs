use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::portfolio_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/portfolio", get(portfolio_controller::get_portfolio))
        .route("/api/portfolio/transactions", get(portfolio_controller::transactions))
        .route("/api/portfolio/reset", post(portfolio_controller::reset))
}
