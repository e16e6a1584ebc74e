use std::net::SocketAddr;
use std::sync::Arc;

use auth::Authenticator;
use auth_service::config::Config;
use auth_service::domain::admission::models::BucketPolicy;
use auth_service::domain::admission::service::AdmissionController;
use auth_service::domain::credential::ports::CredentialServicePort;
use auth_service::domain::credential::ports::CredentialStore;
use auth_service::domain::credential::ports::TokenValidatorPort;
use auth_service::domain::credential::service::CredentialService;
use auth_service::domain::credential::validator::TokenValidator;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryCredentialStore;
use auth_service::outbound::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Services = (Arc<dyn CredentialServicePort>, Arc<dyn TokenValidatorPort>);

fn credential_services<S: CredentialStore>(
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    config: &Config,
) -> Services {
    let validator = Arc::new(TokenValidator::new(
        Arc::clone(&store),
        Arc::clone(&authenticator),
        config.store.timeout(),
    ));
    let credential_service: Arc<dyn CredentialServicePort> = Arc::new(CredentialService::new(
        store,
        authenticator,
        Arc::clone(&validator),
        config.store.timeout(),
    ));
    let token_validator: Arc<dyn TokenValidatorPort> = validator;

    (credential_service, token_validator)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        trust_forwarded_for = config.server.trust_forwarded_for,
        requests_per_second = config.rate_limit.requests_per_second,
        burst = config.rate_limit.burst(),
        store_timeout_ms = config.store.timeout_ms,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        config.jwt.access_token_ttl(),
    ));
    tracing::info!(
        access_token_ttl_secs = authenticator.access_token_ttl().as_secs(),
        "Authenticator ready"
    );

    let (credential_service, token_validator) = match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            credential_services(store, authenticator, &config)
        }
        None => {
            tracing::warn!("No database configured, users are kept in memory");
            let store = Arc::new(InMemoryCredentialStore::new());
            credential_services(store, authenticator, &config)
        }
    };

    let admission = Arc::new(AdmissionController::new(BucketPolicy::new(
        config.rate_limit.requests_per_second,
        config.rate_limit.burst(),
        config.rate_limit.idle_timeout(),
    )));
    let purge_task = admission.spawn_purge_task(config.rate_limit.purge_interval());
    tracing::info!(
        purge_interval_secs = config.rate_limit.purge_interval_secs,
        idle_timeout_secs = config.rate_limit.idle_timeout_secs,
        "Rate limiter purge task started"
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        credential_service,
        token_validator,
        Arc::clone(&admission),
        config.server.trust_forwarded_for,
    );

    let result = axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;

    purge_task.abort();

    match &result {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(e) => tracing::error!(error = %e, "Server error"),
    };

    result.map_err(Into::into)
}
