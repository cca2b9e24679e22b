//! In-process implementations of the repository traits.
//!
//! Used by the test suites to run the session manager and HTTP layer without
//! PostgreSQL. Writes are serialized through a `tokio::sync::RwLock`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::live_stream::{LiveStream, LiveStreamStatus};
use crate::models::user::User;
use crate::repositories::live_stream::LiveStreamRepository;
use crate::repositories::user::UserRepository;
use crate::types::{LiveStreamId, UserId};

#[derive(Default)]
pub struct InMemoryLiveStreamRepository {
    streams: RwLock<HashMap<LiveStreamId, LiveStream>>,
}

impl InMemoryLiveStreamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.streams.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.streams.read().await.is_empty()
    }
}

fn newest_first(mut streams: Vec<LiveStream>) -> Vec<LiveStream> {
    streams.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    streams
}

#[async_trait]
impl LiveStreamRepository for InMemoryLiveStreamRepository {
    async fn insert(&self, stream: &LiveStream) -> anyhow::Result<LiveStream> {
        let mut streams = self.streams.write().await;
        if streams
            .values()
            .any(|existing| existing.remote_stream_id == stream.remote_stream_id)
        {
            anyhow::bail!(
                "duplicate remote stream id: {}",
                stream.remote_stream_id
            );
        }
        streams.insert(stream.id, stream.clone());
        Ok(stream.clone())
    }

    async fn find_by_id(&self, id: LiveStreamId) -> anyhow::Result<Option<LiveStream>> {
        Ok(self.streams.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<LiveStream>> {
        let streams = self
            .streams
            .read()
            .await
            .values()
            .filter(|stream| stream.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(streams))
    }

    async fn list_live(&self) -> anyhow::Result<Vec<LiveStream>> {
        let streams = self
            .streams
            .read()
            .await
            .values()
            .filter(|stream| stream.is_publicly_live())
            .cloned()
            .collect();
        Ok(newest_first(streams))
    }

    async fn update_activation(
        &self,
        id: LiveStreamId,
        owner_id: UserId,
        is_active: bool,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>> {
        let mut streams = self.streams.write().await;
        let Some(stream) = streams
            .get_mut(&id)
            .filter(|stream| stream.owner_id == owner_id)
        else {
            return Ok(None);
        };
        stream.is_active = is_active;
        stream.status = status;
        stream.updated_at = Utc::now();
        Ok(Some(stream.clone()))
    }

    async fn update_status_by_remote_id(
        &self,
        remote_id: &str,
        status: LiveStreamStatus,
    ) -> anyhow::Result<Option<LiveStream>> {
        let mut streams = self.streams.write().await;
        let Some(stream) = streams
            .values_mut()
            .find(|stream| stream.remote_stream_id == remote_id)
        else {
            return Ok(None);
        };
        stream.status = status;
        stream.updated_at = Utc::now();
        Ok(Some(stream.clone()))
    }

    async fn set_asset_by_remote_id(
        &self,
        remote_id: &str,
        asset_id: &str,
    ) -> anyhow::Result<Option<LiveStream>> {
        let mut streams = self.streams.write().await;
        let Some(stream) = streams
            .values_mut()
            .find(|stream| stream.remote_stream_id == remote_id)
        else {
            return Ok(None);
        };
        stream.asset_id = Some(asset_id.to_string());
        stream.updated_at = Utc::now();
        Ok(Some(stream.clone()))
    }

    async fn delete(&self, id: LiveStreamId) -> anyhow::Result<bool> {
        Ok(self.streams.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account without the uniqueness check.
    pub async fn put(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, id: UserId) {
        self.users.write().await.remove(&id);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn create(&self, user: &User) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Ok(None);
        }
        users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }
}
