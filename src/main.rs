use std::net::{IpAddr, SocketAddr};

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use tradebro::{
    config, routes,
    services::{db_init, limit_order_monitor, sweeper},
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tradebro=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let settings = config::load();

    if settings.fmp_api_keys.is_empty() && settings.twelve_data_api_key.is_empty() {
        tracing::warn!("no market data keys configured, charts will use mock data");
    }
    if settings.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set, chat will answer with the fallback reply");
    }

    // Mongo connection (lazy; the first query opens sockets)
    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .map_err(|e| format!("invalid MongoDB URI: {e}"))?;
    let db = client.database(&settings.mongodb_db);

    if let Err(e) = db_init::ensure_indexes(&db).await {
        tracing::error!("could not create indexes: {e}");
    }

    let host: IpAddr = settings
        .host
        .parse()
        .map_err(|e| format!("invalid HOST {:?}: {e}", settings.host))?;
    let addr = SocketAddr::from((host, settings.port));

    let state = AppState::new(db, settings);

    sweeper::spawn_sweeper(state.clone());
    limit_order_monitor::spawn_limit_order_monitor(state.clone());

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("could not bind {addr}: {e}"))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| format!("server error: {e}"))
}
