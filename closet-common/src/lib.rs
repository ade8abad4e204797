//! # Closet Pilot Common Library
//!
//! Shared code for the Closet Pilot services including:
//! - Closed vocabularies for garment attributes (part, formality, season, color)
//! - Wardrobe data model (users, items, saved outfits, feedback)
//! - Outfit matching (compatibility rules, pool filtering, slot selection)
//! - Database schema creation
//! - Configuration loading and root folder resolution

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod outfit;
pub mod vocab;

pub use error::{Error, Result};
pub use models::{Feedback, Item, ItemSource, Reaction, SavedOutfit, User};
pub use vocab::{Formality, OutfitPart, Season};
