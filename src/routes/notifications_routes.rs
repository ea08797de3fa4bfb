use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::notifications_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/notifications",
            get(notifications_controller::list).post(notifications_controller::create),
        )
        .route("/api/notifications/unread-count", get(notifications_controller::unread_count))
        .route("/api/notifications/read-all", post(notifications_controller::mark_all_read))
        .route("/api/notifications/:id", axum::routing::delete(notifications_controller::delete))
        .route("/api/notifications/:id/read", post(notifications_controller::mark_read))
}
