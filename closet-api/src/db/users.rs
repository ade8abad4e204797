//! User persistence

use closet_common::{Result, User};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{now_timestamp, parse_timestamp};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        city: row.try_get("city")?,
        style_preference: row.try_get("style_preference")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Insert a user and return the stored record
pub async fn create_user(
    pool: &SqlitePool,
    display_name: &str,
    city: Option<&str>,
    style_preference: Option<&str>,
) -> Result<User> {
    let id = sqlx::query(
        r#"
        INSERT INTO users (display_name, city, style_preference, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(display_name)
    .bind(city)
    .bind(style_preference)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    user_from_row(&row)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(user_from_row).collect()
}

/// Delete a user; items, outfits and feedback go with it
///
/// Returns false when no such user existed.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use closet_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_get_list_delete() {
        let pool = init_memory_database().await.unwrap();

        let ana = create_user(&pool, "Ana", Some("Lisbon"), None).await.unwrap();
        let ben = create_user(&pool, "Ben", None, Some("minimal")).await.unwrap();

        assert_eq!(get_user(&pool, ana.id).await.unwrap(), Some(ana.clone()));
        assert_eq!(ben.style_preference.as_deref(), Some("minimal"));

        let ids: Vec<i64> = list_users(&pool).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![ana.id, ben.id]);

        assert!(delete_user(&pool, ana.id).await.unwrap());
        assert!(!delete_user(&pool, ana.id).await.unwrap());
        assert!(get_user(&pool, ana.id).await.unwrap().is_none());
    }
}
