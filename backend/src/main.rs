use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediacast_backend::{
    app::build_router,
    config::Config,
    db::{create_pool, run_migrations},
    repositories::{PgLiveStreamRepository, PgUserRepository, UserRepository},
    services::{LiveStreamService, MuxClient, StreamUrls},
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediacast_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        mux_api_base_url = %config.mux.api_base_url,
        mux_token_id = %mask_secret(&config.mux.token_id),
        mux_webhook_verification = config.mux.webhook_secret.is_some(),
        "Loaded configuration from environment/.env"
    );

    // Missing platform credentials abort startup.
    let gateway = MuxClient::new(&config.mux)?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let live_streams = Arc::new(LiveStreamService::new(
        Arc::new(PgLiveStreamRepository::new(pool)),
        users.clone(),
        Arc::new(gateway),
        StreamUrls::from_config(&config.mux),
    ));

    let addr = config.bind_addr;
    let app = build_router(AppState::new(config, live_streams, users));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
