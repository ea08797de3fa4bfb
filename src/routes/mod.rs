use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{from_fn, from_fn_with_state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{AppState, controllers::home_controller, middleware::rate_limit};

pub mod home_routes;
pub mod user_routes;
pub mod stocks_routes;
pub mod live_chart_routes;
pub mod market_routes;
pub mod trading_routes;
pub mod portfolio_routes;
pub mod notifications_routes;
pub mod realtime_routes;
pub mod chat_routes;

fn cors(client_origin: &str) -> CorsLayer {
    let any = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let origin = client_origin.trim();
    if origin.is_empty() {
        return any;
    }

    match HeaderValue::from_str(origin) {
        Ok(v) => CorsLayer::new()
            .allow_origin(v)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!("CLIENT_ORIGIN {origin:?} is not a valid header value, allowing any origin");
            any
        }
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = user_routes::add_routes(router);
    let router = stocks_routes::add_routes(router);
    let router = live_chart_routes::add_routes(router);
    let router = market_routes::add_routes(router);
    let router = trading_routes::add_routes(router);
    let router = portfolio_routes::add_routes(router);
    let router = notifications_routes::add_routes(router);
    let router = realtime_routes::add_routes(router);
    let router = chat_routes::add_routes(router, &state);

    // last layer added runs first
    router
        .fallback(home_controller::not_found)
        .layer(from_fn(crate::auth::require_auth))
        .layer(from_fn_with_state(state.clone(), crate::auth::inject_current_user))
        .layer(from_fn_with_state(state.clone(), rate_limit::limit_api))
        .layer(cors(&state.settings.client_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
