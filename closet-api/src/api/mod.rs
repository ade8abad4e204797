//! HTTP API handlers

pub mod health;
pub mod items;
pub mod outfits;
pub mod users;

pub use health::health_routes;
pub use items::item_routes;
pub use outfits::outfit_routes;
pub use users::user_routes;

use crate::{ApiError, ApiResult, AppState};
use closet_common::User;

/// Load a user or fail with 404
pub(crate) async fn require_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    crate::db::users::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", user_id)))
}
