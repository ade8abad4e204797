//! User endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use closet_common::User;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::require_user;
use crate::db::users;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(alias = "name")]
    pub display_name: String,
    pub city: Option<String>,
    pub style_preference: Option<String>,
}

fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("display_name must not be empty".into()));
    }

    let user = users::create_user(
        &state.db,
        display_name,
        optional_text(request.city.as_deref()),
        optional_text(request.style_preference.as_deref()),
    )
    .await?;

    info!(user_id = user.id, "Created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(&state.db).await?))
}

/// GET /users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(require_user(&state, user_id).await?))
}

/// DELETE /users/:user_id
///
/// Database rows cascade; stored images are removed best-effort.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !users::delete_user(&state.db, user_id).await? {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }
    state.storage.delete_user_files(user_id).await;

    info!(user_id, "Deleted user");
    Ok(Json(json!({ "ok": true })))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:user_id", get(get_user).delete(delete_user))
}
