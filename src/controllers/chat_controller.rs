use axum::extract::{rejection::JsonRejection, Json, State};

use crate::{
    services::chat_service::{check_message, ChatRequest},
    AppState,
};

use super::{body, ok, ApiResult};

// POST /api/chat
pub async fn chat(State(state): State<AppState>, payload: Result<Json<ChatRequest>, JsonRejection>) -> ApiResult {
    let req = body(payload)?;
    let message = check_message(&req.message)?;

    ok(state.chat.reply(&message, &req.history).await)
}
