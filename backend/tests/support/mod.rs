#![allow(dead_code)]
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mediacast_backend::{
    app::build_router,
    config::{Config, MuxConfig},
    models::{live_stream::LiveStreamStatus, user::User},
    repositories::{InMemoryLiveStreamRepository, InMemoryUserRepository},
    services::{
        GatewayError, LiveStreamGateway, LiveStreamService, PlaybackPolicy, RemoteLiveStream,
        StreamUrls,
    },
    state::AppState,
    utils::{jwt::create_access_token, password::hash_password},
};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "a_secure_token_that_is_long_enough_123";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Scripted platform: numbered identifiers (`r1`/`k1`/`p1`, ...) and
/// switchable failures.
#[derive(Default)]
pub struct FakeGateway {
    created: AtomicUsize,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    deleted: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("lock deleted").clone()
    }
}

#[async_trait]
impl LiveStreamGateway for FakeGateway {
    async fn create_live_stream(
        &self,
        _playback_policy: PlaybackPolicy,
    ) -> Result<RemoteLiveStream, GatewayError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteLiveStream {
            remote_id: format!("r{n}"),
            stream_key: format!("k{n}"),
            playback_id: format!("p{n}"),
            status: LiveStreamStatus::Idle,
            remote_created_at: Some("1609459200".into()),
        })
    }

    async fn delete_live_stream(&self, remote_id: &str) -> Result<(), GatewayError> {
        self.deleted
            .lock()
            .expect("lock deleted")
            .push(remote_id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

pub fn test_config(webhook_secret: Option<&str>) -> Config {
    Config {
        database_url: "postgres://unused".into(),
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        jwt_secret: TEST_JWT_SECRET.into(),
        jwt_expiration_hours: 1,
        cors_allow_origins: vec!["http://localhost:8000".into()],
        mux: MuxConfig {
            token_id: "test-token-id".into(),
            token_secret: "test-token-secret".into(),
            webhook_secret: webhook_secret.map(str::to_string),
            ..MuxConfig::default()
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub streams: Arc<InMemoryLiveStreamRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub gateway: Arc<FakeGateway>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config(None))
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let streams = Arc::new(InMemoryLiveStreamRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let gateway = Arc::new(FakeGateway::default());
    let service = LiveStreamService::new(
        streams.clone(),
        users.clone(),
        gateway.clone(),
        StreamUrls::from_config(&config.mux),
    );
    let router = build_router(AppState::new(config, Arc::new(service), users.clone()));
    TestApp {
        router,
        streams,
        users,
        gateway,
    }
}

impl TestApp {
    /// Stores an account and returns it with a valid bearer token.
    pub async fn seed_user(&self, email: &str, display_name: &str) -> (User, String) {
        let hash = hash_password(TEST_PASSWORD).expect("hash password");
        let user = User::new(email.into(), display_name.into(), hash);
        self.users.put(user.clone()).await;
        let (token, _) =
            create_access_token(user.id.to_string(), user.email.clone(), TEST_JWT_SECRET, 1)
                .expect("create token");
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("build request")
}
