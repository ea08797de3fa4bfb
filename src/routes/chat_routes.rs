use axum::{Router, middleware::from_fn_with_state, routing::post};
use crate::{AppState, controllers::chat_controller, middleware::rate_limit};

pub fn add_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route(
        "/api/chat",
        post(chat_controller::chat).layer(from_fn_with_state(state.clone(), rate_limit::limit_chat)),
    )
}
