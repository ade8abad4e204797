//! Wardrobe data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vocab::{Formality, OutfitPart, Season};

/// Wardrobe owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    /// Home city (informational only)
    pub city: Option<String>,
    /// Free-text style preference
    pub style_preference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who last wrote an item's attribute fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Manual,
    Vision,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::Manual => "manual",
            ItemSource::Vision => "vision",
        }
    }

    /// Parse stored value; the legacy "llm" marker means vision
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Some(ItemSource::Manual),
            "vision" | "llm" => Some(ItemSource::Vision),
            _ => None,
        }
    }
}

/// Clothing item with classification attributes
///
/// Attribute fields stay `None` until the item is classified or edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: i64,
    pub user_id: i64,
    pub original_filename: String,
    /// Path relative to the blob store root (e.g. `3/items/shirt_1.jpg`)
    pub stored_path: String,
    pub uploaded_at: DateTime<Utc>,

    pub outfit_part: Option<OutfitPart>,
    pub category: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub season: Option<Season>,
    pub formality: Option<Formality>,
    pub notes: Option<String>,
    /// True once a person confirmed the auto-classified fields
    pub verified: bool,
    pub source: Option<ItemSource>,
}

impl Item {
    /// Public URL of the stored image
    pub fn image_url(&self) -> String {
        format!("/images/{}", self.stored_path)
    }
}

/// Reaction recorded against a saved outfit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Like,
    Dislike,
    Neutral,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
            Reaction::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "like" | "up" => Some(Reaction::Like),
            "dislike" | "down" => Some(Reaction::Dislike),
            "neutral" => Some(Reaction::Neutral),
            _ => None,
        }
    }
}

/// Outfit a user chose to keep: one item id per slot plus a score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedOutfit {
    pub id: i64,
    pub user_id: i64,
    pub top_id: Option<i64>,
    pub bottom_id: Option<i64>,
    pub outer_id: Option<i64>,
    pub shoes_id: Option<i64>,
    pub season: Option<Season>,
    pub formality: Option<Formality>,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A user's reaction to a saved outfit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: i64,
    pub outfit_id: i64,
    pub user_id: i64,
    pub reaction: Reaction,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
