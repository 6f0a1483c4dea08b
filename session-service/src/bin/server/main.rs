use std::sync::Arc;
use std::time::Duration;

use credentials::AccessTokenIssuer;
use session_service::config::Config;
use session_service::domain::session::models::SessionPolicy;
use session_service::domain::session::service::SessionService;
use session_service::inbound::http::router::create_router;
use session_service::outbound::mailer::HttpResetMailer;
use session_service::outbound::repositories::PostgresRefreshTokenRepository;
use session_service::outbound::repositories::PostgresResetTokenRepository;
use session_service::outbound::repositories::PostgresTokenBlacklistRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "session-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        mail_relay = %config.mail.relay_url,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let token_issuer = Arc::new(AccessTokenIssuer::new(
        config.auth.jwt_secret.as_bytes(),
        chrono::Duration::minutes(config.auth.access_token_ttl_minutes),
    ));

    let policy = SessionPolicy {
        refresh_token_ttl: chrono::Duration::days(config.auth.refresh_token_ttl_days),
        reset_token_ttl: chrono::Duration::minutes(config.auth.reset_token_ttl_minutes),
        max_active_refresh_tokens: config.auth.max_active_refresh_tokens,
        max_reset_requests_per_hour: config.auth.max_reset_requests_per_hour,
    };

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let refresh_token_repository = Arc::new(PostgresRefreshTokenRepository::new(pg_pool.clone()));
    let reset_token_repository = Arc::new(PostgresResetTokenRepository::new(pg_pool.clone()));
    let blacklist_repository = Arc::new(PostgresTokenBlacklistRepository::new(pg_pool));

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.mail.timeout_seconds))
        .build()?;
    let mailer = Arc::new(HttpResetMailer::new(
        http_client,
        config.mail.relay_url,
        config.mail.sender,
        config.mail.reset_link_base,
    ));

    let session_service = Arc::new(SessionService::new(
        user_repository,
        refresh_token_repository,
        reset_token_repository,
        blacklist_repository,
        mailer,
        Arc::clone(&token_issuer),
        policy,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(session_service, token_issuer);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
