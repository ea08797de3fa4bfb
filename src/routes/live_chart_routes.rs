use axum::{Router, routing::{delete, get}};
use crate::{AppState, controllers::live_chart_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/live-chart/status", get(live_chart_controller::status))
        .route("/api/live-chart/cache", delete(live_chart_controller::clear_cache))
        .route("/api/live-chart/cache/:symbol", delete(live_chart_controller::invalidate))
        .route("/api/live-chart/:symbol", get(live_chart_controller::chart))
        .route("/api/live-chart/:symbol/latest", get(live_chart_controller::latest))
        .route("/api/live-chart/:symbol/stream", get(live_chart_controller::stream))
}
