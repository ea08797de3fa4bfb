use axum::extract::Extension;

use crate::models::CurrentUser;

use super::{ok, require_user, ApiResult};

// GET /api/me
pub async fn me(user: Option<Extension<CurrentUser>>) -> ApiResult {
    ok(require_user(user)?)
}
