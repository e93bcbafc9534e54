use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leasevault_api::config::ServerConfig;
use leasevault_api::handlers::admin::VaultStats;
use leasevault_api::router::build_app_router;
use leasevault_api::state::AppState;
use leasevault_core::cache::TtlCache;
use leasevault_lifecycle::RetentionScanner;
use leasevault_notify::{EmailConfig, LogMailer, Mailer, SmtpMailer};
use leasevault_storage::{LocalStorage, ObjectStorage, S3Config, S3Storage};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leasevault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = leasevault_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    leasevault_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    leasevault_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Email collaborator ---
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(host = %email_config.smtp_host, "SMTP mailer configured");
            Arc::new(SmtpMailer::new(email_config))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; emails will be logged, not delivered");
            Arc::new(LogMailer)
        }
    };

    // --- Object storage collaborator ---
    let storage: Arc<dyn ObjectStorage> = match S3Config::from_env() {
        Some(s3_config) => {
            tracing::info!(bucket = %s3_config.bucket, "S3 storage configured");
            Arc::new(S3Storage::new(s3_config).await)
        }
        None => {
            let root = std::env::var("LOCAL_STORAGE_ROOT")
                .unwrap_or_else(|_| "./vault-objects".into());
            tracing::warn!(root = %root, "S3_BUCKET not set; using local filesystem storage");
            Arc::new(LocalStorage::new(root))
        }
    };

    // --- Retention scanner ---
    let scan_cancel = tokio_util::sync::CancellationToken::new();
    let scanner = RetentionScanner::new(pool.clone(), Arc::clone(&mailer), Arc::clone(&storage));
    let scan_cancel_clone = scan_cancel.clone();
    let scanner_handle = tokio::spawn(async move {
        scanner.run(scan_cancel_clone).await;
    });
    tracing::info!("Retention scanner spawned");

    // --- App state ---
    let stats_cache: Arc<TtlCache<&'static str, VaultStats>> = Arc::new(TtlCache::new(
        Duration::from_secs(config.stats_cache_ttl_secs),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer,
        storage,
        stats_cache,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scan_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        scanner_handle,
    )
    .await;
    tracing::info!("Retention scanner stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
