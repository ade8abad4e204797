//! Item endpoints: upload, listing, manual edits, classification

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use closet_common::vocab::{parse_category, parse_color, tidy_free_text};
use closet_common::{Formality, Item, OutfitPart, Season};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::require_user;
use crate::db::items::{self, ItemUpdate};
use crate::vision::VisionError;
use crate::{ApiError, ApiResult, AppState};

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Item as returned by the API: every stored field plus its image URL
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub item: Item,
    pub image_url: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        let image_url = item.image_url();
        Self { item, image_url }
    }
}

/// PATCH body; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct ItemPatch {
    pub outfit_part: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "color")]
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub season: Option<String>,
    pub formality: Option<String>,
    pub notes: Option<String>,
    pub verified: Option<bool>,
}

fn parse_field<T>(value: Option<&str>, name: &str, parse: fn(&str) -> Option<T>) -> ApiResult<Option<T>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(token) => parse(token)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown {}: {}", name, token))),
    }
}

impl ItemPatch {
    pub fn into_update(self) -> ApiResult<ItemUpdate> {
        Ok(ItemUpdate {
            outfit_part: parse_field(self.outfit_part.as_deref(), "outfit_part", OutfitPart::parse)?,
            season: parse_field(self.season.as_deref(), "season", Season::parse)?,
            formality: parse_field(self.formality.as_deref(), "formality", Formality::parse)?,
            category: self
                .category
                .as_deref()
                .and_then(|c| tidy_free_text(c, parse_category)),
            primary_color: self
                .primary_color
                .as_deref()
                .and_then(|c| tidy_free_text(c, parse_color)),
            secondary_color: self
                .secondary_color
                .as_deref()
                .and_then(|c| tidy_free_text(c, parse_color)),
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            verified: self.verified,
        })
    }
}

fn classification_error(e: VisionError) -> ApiError {
    match e {
        VisionError::NotConfigured => ApiError::ServiceUnavailable(e.to_string()),
        other => ApiError::Upstream(other.to_string()),
    }
}

/// Classify an item's image and store the result
async fn run_classification(state: &AppState, item: &Item) -> ApiResult<Item> {
    let path = state.storage.absolute_path(&item.stored_path);
    let prediction = state
        .classifier
        .classify(&path)
        .await
        .map_err(classification_error)?;

    items::apply_classification(&state.db, item.id, &prediction.to_update())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item.id)))
}

async fn require_item(state: &AppState, item_id: i64) -> ApiResult<Item> {
    items::get_item(&state.db, item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))
}

/// POST /users/:user_id/items
///
/// Multipart upload with the image in field `file`.
pub async fn upload_item(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    require_user(&state, user_id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes));
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("Missing multipart field 'file'".into()));
    };
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    let stored_path = state.storage.save_item_file(user_id, &filename, &bytes).await?;
    let mut item = match items::create_item(&state.db, user_id, &filename, &stored_path).await {
        Ok(item) => item,
        Err(e) => {
            state.storage.delete_file(&stored_path).await;
            return Err(e.into());
        }
    };
    info!(user_id, item_id = item.id, stored_path = %stored_path, "Stored upload");

    if state.auto_classify {
        match run_classification(&state, &item).await {
            Ok(classified) => item = classified,
            Err(e) => warn!(item_id = item.id, "Classification on upload failed: {}", e),
        }
    }

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /users/:user_id/items
pub async fn list_items(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    require_user(&state, user_id).await?;
    let items = items::list_items_newest_first(&state.db, user_id).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /items/:item_id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    Ok(Json(require_item(&state, item_id).await?.into()))
}

/// PATCH /items/:item_id
pub async fn patch_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(patch): Json<ItemPatch>,
) -> ApiResult<Json<ItemResponse>> {
    let update = patch.into_update()?;
    let item = items::update_fields(&state.db, item_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))?;

    info!(item_id, "Updated item");
    Ok(Json(item.into()))
}

/// DELETE /items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let item = items::delete_item(&state.db, item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))?;
    state.storage.delete_file(&item.stored_path).await;

    info!(item_id, "Deleted item");
    Ok(Json(json!({ "ok": true })))
}

/// POST /items/:item_id/classify
pub async fn classify_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    let item = require_item(&state, item_id).await?;
    let classified = run_classification(&state, &item).await?;
    Ok(Json(classified.into()))
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/items",
            get(list_items)
                .post(upload_item)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/items/:item_id",
            get(get_item).patch(patch_item).delete(delete_item),
        )
        .route("/items/:item_id/classify", post(classify_item))
}
