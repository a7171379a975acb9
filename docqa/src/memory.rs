use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::models::{MemoryEntry, Role};
use crate::services::ConversationStore;

fn history_key(user_id: &str) -> String {
    format!("history:{}", user_id)
}

/// Redis-backed conversation log. One list per user, newest entry at the
/// head, values JSON-serialized `MemoryEntry`.
#[derive(Clone)]
pub struct RedisMemory {
    connection: ConnectionManager,
}

impl RedisMemory {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_tokio_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl ConversationStore for RedisMemory {
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.connection.clone();
        let raw: Vec<String> = conn
            .lrange(history_key(user_id), 0, limit as isize - 1)
            .await?;

        let mut entries = Vec::with_capacity(raw.len());
        for item in raw {
            entries.push(serde_json::from_str(&item)?);
        }
        Ok(entries)
    }

    async fn append(&self, user_id: &str, role: Role, content: &str) -> Result<()> {
        let entry = MemoryEntry {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&entry)?;
        let mut conn = self.connection.clone();
        conn.lpush::<_, _, ()>(history_key(user_id), json).await?;
        Ok(())
    }
}
