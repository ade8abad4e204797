//! Item persistence
//!
//! Attribute updates are partial: a `None` field in [`ItemUpdate`] leaves the
//! stored value untouched.

use closet_common::{Formality, Item, ItemSource, OutfitPart, Result, Season};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{now_timestamp, parse_timestamp};

/// Partial attribute update for an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub outfit_part: Option<OutfitPart>,
    pub category: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub season: Option<Season>,
    pub formality: Option<Formality>,
    pub notes: Option<String>,
    pub verified: Option<bool>,
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let uploaded_at: String = row.try_get("uploaded_at")?;
    let outfit_part: Option<String> = row.try_get("outfit_part")?;
    let season: Option<String> = row.try_get("season")?;
    let formality: Option<String> = row.try_get("formality")?;
    let source: Option<String> = row.try_get("source")?;

    Ok(Item {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        original_filename: row.try_get("original_filename")?,
        stored_path: row.try_get("stored_path")?,
        uploaded_at: parse_timestamp(&uploaded_at)?,
        outfit_part: outfit_part.as_deref().map(OutfitPart::normalize),
        category: row.try_get("category")?,
        primary_color: row.try_get("primary_color")?,
        secondary_color: row.try_get("secondary_color")?,
        season: season.as_deref().map(Season::normalize),
        formality: formality.as_deref().map(Formality::normalize),
        notes: row.try_get("notes")?,
        verified: row.try_get("verified")?,
        source: source.as_deref().and_then(ItemSource::parse),
    })
}

/// Record a freshly uploaded, unclassified item
pub async fn create_item(
    pool: &SqlitePool,
    user_id: i64,
    original_filename: &str,
    stored_path: &str,
) -> Result<Item> {
    let id = sqlx::query(
        r#"
        INSERT INTO items (user_id, original_filename, stored_path, uploaded_at, verified, source)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(user_id)
    .bind(original_filename)
    .bind(stored_path)
    .bind(now_timestamp())
    .bind(ItemSource::Manual.as_str())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let row = sqlx::query("SELECT * FROM items WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    item_from_row(&row)
}

pub async fn get_item(pool: &SqlitePool, id: i64) -> Result<Option<Item>> {
    let row = sqlx::query("SELECT * FROM items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(item_from_row).transpose()
}

/// All items owned by a user, oldest first
pub async fn list_items(pool: &SqlitePool, user_id: i64) -> Result<Vec<Item>> {
    let rows = sqlx::query("SELECT * FROM items WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(item_from_row).collect()
}

/// All items owned by a user, newest first, for listings
pub async fn list_items_newest_first(pool: &SqlitePool, user_id: i64) -> Result<Vec<Item>> {
    let rows = sqlx::query("SELECT * FROM items WHERE user_id = ? ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(item_from_row).collect()
}

/// Apply a person's edit; marks the item as manually maintained
///
/// Returns `None` when the item does not exist.
pub async fn update_fields(pool: &SqlitePool, id: i64, update: &ItemUpdate) -> Result<Option<Item>> {
    write_fields(pool, id, update, ItemSource::Manual).await
}

/// Store classifier output; the result needs review again
pub async fn apply_classification(
    pool: &SqlitePool,
    id: i64,
    update: &ItemUpdate,
) -> Result<Option<Item>> {
    let update = ItemUpdate {
        verified: Some(false),
        ..update.clone()
    };
    write_fields(pool, id, &update, ItemSource::Vision).await
}

async fn write_fields(
    pool: &SqlitePool,
    id: i64,
    update: &ItemUpdate,
    source: ItemSource,
) -> Result<Option<Item>> {
    let result = sqlx::query(
        r#"
        UPDATE items SET
            outfit_part = COALESCE(?, outfit_part),
            category = COALESCE(?, category),
            primary_color = COALESCE(?, primary_color),
            secondary_color = COALESCE(?, secondary_color),
            season = COALESCE(?, season),
            formality = COALESCE(?, formality),
            notes = COALESCE(?, notes),
            verified = COALESCE(?, verified),
            source = ?
        WHERE id = ?
        "#,
    )
    .bind(update.outfit_part.map(|p| p.as_str()))
    .bind(update.category.as_deref())
    .bind(update.primary_color.as_deref())
    .bind(update.secondary_color.as_deref())
    .bind(update.season.map(|s| s.as_str()))
    .bind(update.formality.map(|f| f.as_str()))
    .bind(update.notes.as_deref())
    .bind(update.verified)
    .bind(source.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_item(pool, id).await
}

/// Delete an item row, returning the removed record
pub async fn delete_item(pool: &SqlitePool, id: i64) -> Result<Option<Item>> {
    let Some(item) = get_item(pool, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(Some(item))
}
