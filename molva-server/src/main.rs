use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod media;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use molva_shared::middleware::{init_metrics, init_tracing, metrics_middleware};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub metrics: metrics_exporter_prometheus::PrometheusHandle,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    match config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::permissive(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("molva-server");

    let config = AppConfig::load()?;
    let port = config.port;
    let max_upload_bytes = config.max_upload_bytes;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let metrics = init_metrics();

    tokio::fs::create_dir_all(std::path::Path::new(&config.uploads_dir).join("avatars")).await?;

    let cors = cors_layer(&config);
    let state = Arc::new(AppState { db, config, metrics });

    // Expired sessions are swept lazily; process start is the one trigger
    // this binary owns, the rest is up to the deployment.
    match services::auth_service::cleanup_expired_sessions(&state) {
        Ok(removed) => tracing::info!(removed, "expired session sweep"),
        Err(e) => tracing::warn!(error = %e, "expired session sweep failed"),
    }

    let app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/validate", post(routes::auth::validate))
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/:id",
            patch(routes::users::set_active).delete(routes::users::delete_user),
        )
        .route("/api/users/:id/password", patch(routes::users::change_password))
        .route("/api/users/:id/activity", get(routes::users::user_activity))
        .route("/api/users/activity/system", get(routes::users::system_activity))
        .route(
            "/api/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .route(
            "/api/messages/:id",
            patch(routes::messages::update_message).delete(routes::messages::delete_message),
        )
        .route("/api/messages/avatar", post(routes::messages::upload_avatar))
        .route("/api/messages/file/*path", get(routes::messages::get_file))
        .route("/api/messages/avatar/*path", get(routes::messages::get_avatar))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "molva-server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
