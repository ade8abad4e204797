//! Outfit suggestion, saved outfits and feedback

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use closet_common::outfit::{
    parse_formality_request, parse_season_request, suggest_outfit, OutfitRequest,
    OutfitSuggestion, RngShuffle,
};
use closet_common::{Feedback, Formality, Item, OutfitPart, Reaction, SavedOutfit, Season};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_user;
use crate::db::{items, outfits};
use crate::db::outfits::NewOutfit;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    pub season: Option<String>,
    pub formality: Option<String>,
    /// Comma-separated item ids that must appear in the outfit
    pub anchor_ids: Option<String>,
    /// Comma-separated item ids that must not appear
    pub exclude_ids: Option<String>,
}

/// Parse a comma-separated id list, dropping tokens that are not integers
pub fn parse_id_list(raw: Option<&str>) -> HashSet<i64> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}

/// One filled slot of a suggestion
#[derive(Debug, Serialize)]
pub struct SlotItem {
    pub id: i64,
    pub category: Option<String>,
    pub outfit_part: Option<OutfitPart>,
    pub primary_color: Option<String>,
    pub formality: Option<Formality>,
    pub season: Option<Season>,
    pub image_url: String,
}

impl From<Item> for SlotItem {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            image_url: item.image_url(),
            category: item.category,
            outfit_part: item.outfit_part,
            primary_color: item.primary_color,
            formality: item.formality,
            season: item.season,
        }
    }
}

/// Suggestion body; empty slots serialize as null
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub top: Option<SlotItem>,
    pub bottom: Option<SlotItem>,
    pub outer: Option<SlotItem>,
    pub shoes: Option<SlotItem>,
}

impl From<OutfitSuggestion> for SuggestionResponse {
    fn from(suggestion: OutfitSuggestion) -> Self {
        Self {
            top: suggestion.top.map(SlotItem::from),
            bottom: suggestion.bottom.map(SlotItem::from),
            outer: suggestion.outer.map(SlotItem::from),
            shoes: suggestion.shoes.map(SlotItem::from),
        }
    }
}

/// GET /users/:user_id/outfits/suggest
pub async fn suggest(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<SuggestQuery>,
) -> ApiResult<Json<SuggestionResponse>> {
    require_user(&state, user_id).await?;

    let request = OutfitRequest {
        season: parse_season_request(query.season.as_deref()),
        formality: parse_formality_request(query.formality.as_deref()),
        anchor_ids: parse_id_list(query.anchor_ids.as_deref()),
        exclude_ids: parse_id_list(query.exclude_ids.as_deref()),
    };

    let wardrobe = items::list_items(&state.db, user_id).await?;
    let mut shuffler = RngShuffle(StdRng::from_entropy());
    let suggestion = suggest_outfit(&wardrobe, &request, &mut shuffler);

    info!(
        user_id,
        season = ?request.season,
        formality = ?request.formality,
        anchors = request.anchor_ids.len(),
        excludes = request.exclude_ids.len(),
        empty = suggestion.is_empty(),
        "Suggested outfit"
    );

    Ok(Json(suggestion.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveOutfitRequest {
    pub top_id: Option<i64>,
    pub bottom_id: Option<i64>,
    pub outer_id: Option<i64>,
    pub shoes_id: Option<i64>,
    pub season: Option<String>,
    pub formality: Option<String>,
    pub score: Option<f64>,
}

/// POST /users/:user_id/outfits
pub async fn save_outfit(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<SaveOutfitRequest>,
) -> ApiResult<(StatusCode, Json<SavedOutfit>)> {
    require_user(&state, user_id).await?;

    let outfit = NewOutfit {
        top_id: request.top_id,
        bottom_id: request.bottom_id,
        outer_id: request.outer_id,
        shoes_id: request.shoes_id,
        season: parse_season_request(request.season.as_deref()).season(),
        formality: parse_formality_request(request.formality.as_deref()),
        score: request.score,
    };

    for item_id in outfit.item_ids() {
        let owned = items::get_item(&state.db, item_id)
            .await?
            .is_some_and(|item| item.user_id == user_id);
        if !owned {
            return Err(ApiError::BadRequest(format!(
                "Item {} does not belong to user {}",
                item_id, user_id
            )));
        }
    }

    let saved = outfits::save_outfit(&state.db, user_id, &outfit).await?;
    info!(user_id, outfit_id = saved.id, "Saved outfit");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /users/:user_id/outfits
pub async fn list_outfits(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<SavedOutfit>>> {
    require_user(&state, user_id).await?;
    Ok(Json(outfits::list_outfits(&state.db, user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub reaction: String,
    pub comment: Option<String>,
}

async fn require_outfit(state: &AppState, outfit_id: i64) -> ApiResult<SavedOutfit> {
    outfits::get_outfit(&state.db, outfit_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Outfit {}", outfit_id)))
}

/// POST /outfits/:outfit_id/feedback
pub async fn add_feedback(
    State(state): State<AppState>,
    Path(outfit_id): Path<i64>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let outfit = require_outfit(&state, outfit_id).await?;
    let reaction = Reaction::parse(&request.reaction)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown reaction: {}", request.reaction)))?;
    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let feedback =
        outfits::add_feedback(&state.db, outfit.id, outfit.user_id, reaction, comment).await?;
    info!(outfit_id, reaction = reaction.as_str(), "Recorded feedback");
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// GET /outfits/:outfit_id/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    Path(outfit_id): Path<i64>,
) -> ApiResult<Json<Vec<Feedback>>> {
    require_outfit(&state, outfit_id).await?;
    Ok(Json(outfits::list_feedback(&state.db, outfit_id).await?))
}

pub fn outfit_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/outfits/suggest", get(suggest))
        .route(
            "/users/:user_id/outfits",
            get(list_outfits).post(save_outfit),
        )
        .route(
            "/outfits/:outfit_id/feedback",
            get(list_feedback).post(add_feedback),
        )
}
