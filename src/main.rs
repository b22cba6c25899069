//! Pro-Trans Backend Server
//!
//! REST backend for the Pro-Trans transport marketplace: listings, quotes
//! and shipment tracking, driven by the workflow engine in the library
//! crate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use protrans_server::annonce::AnnonceService;
use protrans_server::config::Config;
use protrans_server::devis::{self, DevisService};
use protrans_server::middleware::{self, JwtVerifier, RateLimiter};
use protrans_server::state::AppState;
use protrans_server::tracking::TrackingService;
use protrans_server::workflow::EventDispatcher;
use protrans_server::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        "Starting Pro-Trans backend"
    );

    // Initialize database connection pool and run migrations
    let db_pool = db::create_pool(&config)
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&db_pool)
        .await
        .context("failed to run migrations")?;

    // Initialize services
    let annonce_service = Arc::new(AnnonceService::new(db_pool.clone()));
    let devis_service = Arc::new(DevisService::new(db_pool.clone()));
    let tracking_service = Arc::new(TrackingService::new(db_pool.clone()));

    let dispatcher = EventDispatcher::new();
    let jwt_verifier = Arc::new(JwtVerifier::new(&config.jwt_secret));

    // Create shared app state
    let app_state = AppState::new(
        annonce_service,
        devis_service.clone(),
        tracking_service,
        dispatcher.clone(),
        jwt_verifier,
    );

    // Start expiry sweeper in background
    let sweep_interval = Duration::from_secs(config.devis_expiry_sweep_seconds);
    tokio::spawn(async move {
        tracing::info!("Devis expiry sweeper task started");
        devis::expiry_sweeper(devis_service, dispatcher, sweep_interval).await;
        tracing::error!("Devis expiry sweeper task exited unexpectedly");
    });

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Initialize rate limiter and its idle-window cleanup loop
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let limiter_cleanup = rate_limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            limiter_cleanup.cleanup(Duration::from_secs(300)).await;
        }
    });

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::annonce_routes())
        .merge(routes::devis_routes())
        .merge(routes::tracking_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_layer(limiter)(req, next)
        }))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "Pro-Trans API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins_str = allowed_origins.unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
