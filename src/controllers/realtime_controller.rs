use std::{convert::Infallible, time::Duration as StdDuration};

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use tokio::sync::broadcast::error::RecvError;

use crate::{error::AppError, models::CurrentUser, AppState};

use super::require_user;

// GET /api/events  (SSE, caller's events only)
pub async fn sse_events(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Sse<impl futures_util::stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let u = require_user(user)?;
    let rx = state.events_tx.subscribe();

    let stream = futures_util::stream::unfold((rx, u.id), |(mut rx, user_id)| async move {
        loop {
            let evt = match rx.recv().await {
                Ok(e) if e.is_for(&user_id) => Event::default().event(e.name).data("1"),
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => Event::default().event("ping").data("lagged"),
                Err(RecvError::Closed) => return None,
            };

            return Some((Ok(evt), (rx, user_id)));
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(StdDuration::from_secs(20))
            .text("keep-alive"),
    ))
}
