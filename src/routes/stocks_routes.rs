use axum::{Router, routing::get};
use crate::{AppState, controllers::stocks_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/stocks/search", get(stocks_controller::search))
        .route("/api/stocks/screener", get(stocks_controller::screener))
        .route("/api/stocks/:symbol/quote", get(stocks_controller::quote))
        .route("/api/stocks/:symbol/history", get(stocks_controller::history))
        .route("/api/stocks/:symbol/news", get(stocks_controller::symbol_news))
        .route("/api/news", get(stocks_controller::market_news))
}
