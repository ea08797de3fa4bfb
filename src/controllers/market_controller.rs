use axum::extract::State;
use chrono::Utc;
use serde_json::json;

use crate::AppState;

use super::{ok, ApiResult};

// GET /api/market/status
pub async fn status(State(state): State<AppState>) -> ApiResult {
    let clock = state.live_chart.clock();
    let now = Utc::now();
    let session = clock.session_at(now);

    ok(json!({
        "session": session,
        "is_open": session.is_open(),
        "poll_interval_secs": session.poll_interval().as_secs(),
        "local_time": clock.local_time(now).to_rfc3339(),
    }))
}
