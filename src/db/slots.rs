//! String-keyed slots holding the persisted session.
//!
//! The session lives in two slots: `token` (the raw credential) and `user`
//! (the JSON-serialized identity). They are written and erased together.

use sqlx::sqlite::SqlitePool;

/// Slot holding the raw credential.
pub const TOKEN_SLOT: &str = "token";

/// Slot holding the JSON-serialized identity.
pub const USER_SLOT: &str = "user";

/// Raw contents of both session slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub user: Option<String>,
}

#[derive(Clone)]
pub struct SlotStore {
    pool: SqlitePool,
}

impl SlotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a slot.
    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Write a slot, replacing any previous value.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO slots (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read both session slots.
    pub async fn load_session(&self) -> Result<StoredSession, sqlx::Error> {
        Ok(StoredSession {
            token: self.get(TOKEN_SLOT).await?,
            user: self.get(USER_SLOT).await?,
        })
    }

    /// Write both session slots in one transaction.
    pub async fn put_session(&self, token: &str, user_json: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in [(TOKEN_SLOT, token), (USER_SLOT, user_json)] {
            sqlx::query(
                "INSERT INTO slots (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Erase both session slots in one transaction.
    pub async fn clear_session(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM slots WHERE key IN (?, ?)")
            .bind(TOKEN_SLOT)
            .bind(USER_SLOT)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = Database::open(":memory:").await.unwrap();
        let slots = db.slots();

        assert!(slots.get("theme").await.unwrap().is_none());

        slots.put("theme", "dark").await.unwrap();
        slots.put("theme", "light").await.unwrap();
        assert_eq!(slots.get("theme").await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_session_slots_written_and_cleared_together() {
        let db = Database::open(":memory:").await.unwrap();
        let slots = db.slots();

        slots.put("theme", "dark").await.unwrap();
        slots.put_session("a.b.c", r#"{"id":1}"#).await.unwrap();

        let stored = slots.load_session().await.unwrap();
        assert_eq!(stored.token.as_deref(), Some("a.b.c"));
        assert_eq!(stored.user.as_deref(), Some(r#"{"id":1}"#));

        slots.clear_session().await.unwrap();
        assert_eq!(slots.load_session().await.unwrap(), StoredSession::default());

        // Unrelated slots are untouched
        assert_eq!(slots.get("theme").await.unwrap().as_deref(), Some("dark"));
    }
}
