//! Banner Backend
//!
//! REST backend for feature/tag keyed banners with SQLite persistence and
//! bearer-token access control.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod sanitize;
mod service;
mod validation;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenCodec;
use config::Config;
use db::{BannerRepository, UserRepository};
use sanitize::HtmlSanitizer;
use service::{BannerManager, BannerService, UserManager, UserService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub banners: Arc<dyn BannerService>,
    pub users: Arc<dyn UserService>,
    pub codec: Arc<TokenCodec>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Banner Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Store deadline: {:?}", config.store_timeout);

    if config.admin_logins.is_empty() {
        tracing::warn!("No admin logins configured (BANNER_ADMIN_LOGINS); nobody can manage banners");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    let state = build_state(pool, config.clone());
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wire repositories and services on top of an open pool.
pub fn build_state(pool: sqlx::SqlitePool, config: Arc<Config>) -> AppState {
    let banner_store = Arc::new(BannerRepository::new(pool.clone(), config.store_timeout));
    let user_store = Arc::new(UserRepository::new(pool, config.store_timeout));

    let codec = Arc::new(TokenCodec::new(
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    ));

    AppState {
        banners: Arc::new(BannerManager::new(banner_store, HtmlSanitizer::new())),
        users: Arc::new(UserManager::new(user_store, HtmlSanitizer::new(), config.clone())),
        codec,
        config,
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let origin = match state
        .config
        .allow_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::AUTHORIZATION]);

    // Clone the codec for the auth layer
    let codec = state.codec.clone();

    // Banner routes (bearer token required)
    let banner_routes = Router::new()
        .route("/banner/add", post(api::add_banner))
        .route("/banner/get", get(api::get_banner))
        .route("/banner/update/{id}", patch(api::update_banner))
        .route("/banner/delete/{id}", delete(api::delete_banner))
        .route("/banner/get_list", get(api::get_banners_list))
        .layer(middleware::from_fn(move |req, next| {
            auth::principal_layer(codec.clone(), req, next)
        }));

    // Account routes
    let user_routes = Router::new()
        .route("/signup", post(api::sign_up))
        .route("/signin", get(api::sign_in))
        .route("/logout", post(api::log_out));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", banner_routes.merge(user_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(errors::panic_response))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Resolves on Ctrl+C so the server can drain in-flight requests.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal, shutting down gracefully..."),
        Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
