//! Saved outfit and feedback persistence

use closet_common::{Feedback, Formality, Reaction, Result, SavedOutfit, Season};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{now_timestamp, parse_timestamp};

/// Outfit to persist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOutfit {
    pub top_id: Option<i64>,
    pub bottom_id: Option<i64>,
    pub outer_id: Option<i64>,
    pub shoes_id: Option<i64>,
    pub season: Option<Season>,
    pub formality: Option<Formality>,
    pub score: Option<f64>,
}

impl NewOutfit {
    /// Item ids referenced by this outfit
    pub fn item_ids(&self) -> impl Iterator<Item = i64> {
        [self.top_id, self.bottom_id, self.outer_id, self.shoes_id]
            .into_iter()
            .flatten()
    }
}

fn outfit_from_row(row: &SqliteRow) -> Result<SavedOutfit> {
    let created_at: String = row.try_get("created_at")?;
    let season: Option<String> = row.try_get("season")?;
    let formality: Option<String> = row.try_get("formality")?;

    Ok(SavedOutfit {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        top_id: row.try_get("top_id")?,
        bottom_id: row.try_get("bottom_id")?,
        outer_id: row.try_get("outer_id")?,
        shoes_id: row.try_get("shoes_id")?,
        season: season.as_deref().map(Season::normalize),
        formality: formality.as_deref().map(Formality::normalize),
        score: row.try_get("score")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn feedback_from_row(row: &SqliteRow) -> Result<Feedback> {
    let created_at: String = row.try_get("created_at")?;
    let reaction: String = row.try_get("reaction")?;

    Ok(Feedback {
        id: row.try_get("id")?,
        outfit_id: row.try_get("outfit_id")?,
        user_id: row.try_get("user_id")?,
        reaction: Reaction::parse(&reaction).unwrap_or(Reaction::Neutral),
        comment: row.try_get("comment")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub async fn save_outfit(pool: &SqlitePool, user_id: i64, outfit: &NewOutfit) -> Result<SavedOutfit> {
    let id = sqlx::query(
        r#"
        INSERT INTO outfits
            (user_id, top_id, bottom_id, outer_id, shoes_id, season, formality, score, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(outfit.top_id)
    .bind(outfit.bottom_id)
    .bind(outfit.outer_id)
    .bind(outfit.shoes_id)
    .bind(outfit.season.map(|s| s.as_str()))
    .bind(outfit.formality.map(|f| f.as_str()))
    .bind(outfit.score)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let row = sqlx::query("SELECT * FROM outfits WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    outfit_from_row(&row)
}

pub async fn get_outfit(pool: &SqlitePool, id: i64) -> Result<Option<SavedOutfit>> {
    let row = sqlx::query("SELECT * FROM outfits WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(outfit_from_row).transpose()
}

/// A user's saved outfits, newest first
pub async fn list_outfits(pool: &SqlitePool, user_id: i64) -> Result<Vec<SavedOutfit>> {
    let rows = sqlx::query("SELECT * FROM outfits WHERE user_id = ? ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(outfit_from_row).collect()
}

pub async fn add_feedback(
    pool: &SqlitePool,
    outfit_id: i64,
    user_id: i64,
    reaction: Reaction,
    comment: Option<&str>,
) -> Result<Feedback> {
    let id = sqlx::query(
        r#"
        INSERT INTO feedback (outfit_id, user_id, reaction, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(outfit_id)
    .bind(user_id)
    .bind(reaction.as_str())
    .bind(comment)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let row = sqlx::query("SELECT * FROM feedback WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    feedback_from_row(&row)
}

pub async fn list_feedback(pool: &SqlitePool, outfit_id: i64) -> Result<Vec<Feedback>> {
    let rows = sqlx::query("SELECT * FROM feedback WHERE outfit_id = ? ORDER BY id")
        .bind(outfit_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(feedback_from_row).collect()
}
