//! Live stream store.
//!
//! Every mutation is a single statement so concurrent writers to the same row
//! never interleave a read-modify-write.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::live_stream::{LiveStream, LiveStreamStatus};
use crate::types::{LiveStreamId, UserId};

/// Repository trait for live stream persistence.
///
/// Use `MockLiveStreamRepository` in unit tests to script failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveStreamRepository: Send + Sync {
    /// Persists a new stream and returns the stored row.
    async fn insert(&self, stream: &LiveStream) -> anyhow::Result<LiveStream>;

    async fn find_by_id(&self, id: LiveStreamId) -> anyhow::Result<Option<LiveStream>>;

    /// Streams owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<LiveStream>>;

    /// Streams that are both ingesting and enabled by their owner, newest first.
    async fn list_live(&self) -> anyhow::Result<Vec<LiveStream>>;

    /// Sets the activation flag and status together, only if `owner_id` still owns the row.
    async fn update_activation(
        &self,
        id: LiveStreamId,
        owner_id: UserId,
        is_active: bool,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>>;

    /// Sets the status of the stream with `remote_id`; the activation flag is left alone.
    async fn update_status_by_remote_id(
        &self,
        remote_id: &str,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>>;

    /// Records the finished recording for the stream with `remote_id`.
    async fn set_asset_by_remote_id(
        &self,
        remote_id: &str,
        asset_id: &str,
    ) -> anyhow::Result<Option<LiveStream>>;

    /// Removes the row; returns `false` when it was already gone.
    async fn delete(&self, id: LiveStreamId) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgLiveStreamRepository {
    pool: PgPool,
}

impl PgLiveStreamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiveStreamRepository for PgLiveStreamRepository {
    async fn insert(&self, stream: &LiveStream) -> anyhow::Result<LiveStream> {
        let stored = sqlx::query_as::<_, LiveStream>(
            r#"
            INSERT INTO live_streams
                (id, remote_stream_id, stream_key, playback_id, title, description, status,
                 is_active, owner_id, asset_id, remote_created_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, remote_stream_id, stream_key, playback_id, title, description, status,
                      is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            "#,
        )
        .bind(stream.id)
        .bind(&stream.remote_stream_id)
        .bind(&stream.stream_key)
        .bind(&stream.playback_id)
        .bind(&stream.title)
        .bind(&stream.description)
        .bind(stream.status.as_str())
        .bind(stream.is_active)
        .bind(stream.owner_id)
        .bind(&stream.asset_id)
        .bind(&stream.remote_created_at)
        .bind(stream.created_at)
        .bind(stream.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn find_by_id(&self, id: LiveStreamId) -> anyhow::Result<Option<LiveStream>> {
        let stream = sqlx::query_as::<_, LiveStream>(
            r#"
            SELECT id, remote_stream_id, stream_key, playback_id, title, description, status,
                   is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            FROM live_streams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stream)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<LiveStream>> {
        let streams = sqlx::query_as::<_, LiveStream>(
            r#"
            SELECT id, remote_stream_id, stream_key, playback_id, title, description, status,
                   is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            FROM live_streams
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(streams)
    }

    async fn list_live(&self) -> anyhow::Result<Vec<LiveStream>> {
        let streams = sqlx::query_as::<_, LiveStream>(
            r#"
            SELECT id, remote_stream_id, stream_key, playback_id, title, description, status,
                   is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            FROM live_streams
            WHERE status = $1 AND is_active = TRUE
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(LiveStreamStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(streams)
    }

    async fn update_activation(
        &self,
        id: LiveStreamId,
        owner_id: UserId,
        is_active: bool,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>> {
        let stream = sqlx::query_as::<_, LiveStream>(
            r#"
            UPDATE live_streams
            SET is_active = $1,
                status = $2,
                updated_at = NOW()
            WHERE id = $3 AND owner_id = $4
            RETURNING id, remote_stream_id, stream_key, playback_id, title, description, status,
                      is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            "#,
        )
        .bind(is_active)
        .bind(status.as_str())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stream)
    }

    async fn update_status_by_remote_id(
        &self,
        remote_id: &str,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>> {
        let stream = sqlx::query_as::<_, LiveStream>(
            r#"
            UPDATE live_streams
            SET status = $1,
                updated_at = NOW()
            WHERE remote_stream_id = $2
            RETURNING id, remote_stream_id, stream_key, playback_id, title, description, status,
                      is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stream)
    }

    async fn set_asset_by_remote_id(
        &self,
        remote_id: &str,
        asset_id: &str,
    ) -> anyhow::Result<Option<LiveStream>> {
        let stream = sqlx::query_as::<_, LiveStream>(
            r#"
            UPDATE live_streams
            SET asset_id = $1,
                updated_at = NOW()
            WHERE remote_stream_id = $2
            RETURNING id, remote_stream_id, stream_key, playback_id, title, description, status,
                      is_active, owner_id, asset_id, remote_created_at, created_at, updated_at
            "#,
        )
        .bind(asset_id)
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stream)
    }

    async fn delete(&self, id: LiveStreamId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM live_streams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
