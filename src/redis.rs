use crate::{
    error::Result,
    models::{ReactionCounts, ReactionEvent},
};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use uuid::Uuid;

pub fn reaction_counts_key(post_id: Uuid) -> String {
    format!("reaction_counts:{}", post_id)
}

pub fn reaction_channel(post_id: Uuid) -> String {
    format!("post_reactions:{}", post_id)
}

/// Redis access shared through `AppState`. The connection manager is created
/// on first use, so building the client only validates the URL.
#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    manager: Arc<OnceCell<Mutex<ConnectionManager>>>,
}

impl RedisClient {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client,
            manager: Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<MutexGuard<'_, ConnectionManager>> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                ConnectionManager::new(self.client.clone())
                    .await
                    .map(Mutex::new)
            })
            .await?;

        Ok(manager.lock().await)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }

    // Rate limiting
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_seconds: usize,
    ) -> Result<bool> {
        let mut conn = self.connection().await?;

        let current: Option<u32> = conn.get(key).await?;
        let current = current.unwrap_or(0);

        if current >= limit {
            return Ok(false);
        }

        let _: () = conn.incr(key, 1).await?;
        let _: () = conn.expire(key, window_seconds as i64).await?;

        Ok(true)
    }

    // Session management
    pub async fn get_session(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let key = format!("session:{}", session_id);

        let user_id: Option<String> = conn.get(key).await?;
        Ok(user_id)
    }

    // Caching
    pub async fn cache_set(&self, key: &str, value: &str, ttl_seconds: usize) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds as u64).await?;
        Ok(())
    }

    pub async fn cache_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn cache_delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    // Real-time features
    pub async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.publish(channel, message).await?;
        Ok(())
    }

    // Reaction counts cache
    pub async fn get_cached_reaction_counts(&self, post_id: Uuid) -> Result<Option<ReactionCounts>> {
        let Some(raw) = self.cache_get(&reaction_counts_key(post_id)).await? else {
            return Ok(None);
        };

        // A stale or partial entry is treated as a miss.
        match serde_json::from_str::<ReactionCounts>(&raw) {
            Ok(counts) => Ok(Some(counts)),
            Err(e) => {
                tracing::warn!("Discarding malformed reaction counts for {}: {}", post_id, e);
                self.invalidate_reaction_counts(post_id).await?;
                Ok(None)
            }
        }
    }

    pub async fn cache_reaction_counts(
        &self,
        post_id: Uuid,
        counts: &ReactionCounts,
        ttl_seconds: usize,
    ) -> Result<()> {
        let value = serde_json::to_string(counts)?;
        self.cache_set(&reaction_counts_key(post_id), &value, ttl_seconds)
            .await
    }

    pub async fn invalidate_reaction_counts(&self, post_id: Uuid) -> Result<()> {
        self.cache_delete(&reaction_counts_key(post_id)).await
    }

    pub async fn publish_reaction_event(&self, event: &ReactionEvent) -> Result<()> {
        let message = serde_json::to_string(event)?;
        self.publish(&reaction_channel(event.post_id), &message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_post() {
        let post_id = Uuid::nil();
        assert_eq!(
            reaction_counts_key(post_id),
            "reaction_counts:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            reaction_channel(post_id),
            "post_reactions:00000000-0000-0000-0000-000000000000"
        );
    }
}
