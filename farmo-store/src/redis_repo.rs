use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use tracing::info;
use uuid::Uuid;

use farmo_core::notify::Notifier;
use farmo_core::repository::RepoResult;
use farmo_shared::ProviderNotification;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Publishes to a pub/sub channel and returns the number of subscribers reached.
    pub async fn publish(&self, channel: &str, payload: &str) -> RedisResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.publish(channel, payload).await
    }

    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// Pushes provider notifications onto `{prefix}:{provider_id}` channels the
/// provider apps subscribe to.
pub struct RedisNotifier {
    redis: RedisClient,
    channel_prefix: String,
}

impl RedisNotifier {
    pub fn new(redis: RedisClient, channel_prefix: &str) -> Self {
        Self {
            redis,
            channel_prefix: channel_prefix.to_string(),
        }
    }

    pub fn channel_for(&self, provider_id: Uuid) -> String {
        format!("{}:{}", self.channel_prefix, provider_id)
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn notify(&self, provider_id: Uuid, notification: &ProviderNotification) -> RepoResult<()> {
        let channel = self.channel_for(provider_id);
        let payload = serde_json::to_string(notification)?;
        let receivers = self.redis.publish(&channel, &payload).await?;
        info!(
            "Published {} to {} ({} subscribers)",
            notification.booking_id(),
            channel,
            receivers
        );
        Ok(())
    }
}
