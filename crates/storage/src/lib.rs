use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use footprint_core::ConversationTurn;
use parking_lot::RwLock;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

/// Conversation history keyed by user id. Saves replace the stored history
/// wholesale, so concurrent writers resolve last-write-wins.
pub trait ConversationRepository: Send + Sync {
    async fn load_conversation(&self, user_id: &str) -> Result<Option<Vec<ConversationTurn>>>;
    async fn save_conversation(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    conversations: Arc<RwLock<HashMap<String, Vec<ConversationTurn>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationRepository for MemoryStore {
    async fn load_conversation(&self, user_id: &str) -> Result<Option<Vec<ConversationTurn>>> {
        Ok(self.conversations.read().get(user_id).cloned())
    }

    async fn save_conversation(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        self.conversations
            .write()
            .insert(user_id.to_string(), turns.to_vec());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        Self::from_pool(pool).await
    }

    /// Single-connection in-memory database; every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("failed opening in-memory sqlite")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
              user_id TEXT PRIMARY KEY,
              turns_json TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ConversationRepository for SqliteStore {
    async fn load_conversation(&self, user_id: &str) -> Result<Option<Vec<ConversationTurn>>> {
        let row = sqlx::query(
            r#"
            SELECT turns_json
            FROM conversations
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let turns_json: String = row.get("turns_json");
        let turns = serde_json::from_str(&turns_json)
            .with_context(|| format!("corrupt conversation for user {}", user_id))?;

        Ok(Some(turns))
    }

    async fn save_conversation(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let turns_json = serde_json::to_string(turns)?;

        sqlx::query(
            r#"
            INSERT INTO conversations (user_id, turns_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
              turns_json=excluded.turns_json,
              updated_at=excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(turns_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl ConversationRepository for Store {
    async fn load_conversation(&self, user_id: &str) -> Result<Option<Vec<ConversationTurn>>> {
        match self {
            Store::Memory(store) => store.load_conversation(user_id).await,
            Store::Sqlite(store) => store.load_conversation(user_id).await,
        }
    }

    async fn save_conversation(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        match self {
            Store::Memory(store) => store.save_conversation(user_id, turns).await,
            Store::Sqlite(store) => store.save_conversation(user_id, turns).await,
        }
    }
}
