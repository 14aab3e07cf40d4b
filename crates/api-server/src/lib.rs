use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ranking_orchestrator::{RankingConfig, RankingService};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod ranking_routes;


pub use ranking_routes::ranking_routes;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RankingService>,
}

/// JSON envelope shared by every route: `{ status, data }` or `{ status, error }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Upstream or computation failure; the message is what clients see
    Unavailable(&'static str),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        (status, Json(ApiResponse::<()>::error(status, message))).into_response()
    }
}

async fn health() -> &'static str {
    "OK"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(ranking_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RankingConfig::from_env().context("Invalid ranking configuration")?;
    tracing::info!(
        "Ranking cache TTL {:?}, load timeout {:?}",
        config.cache_ttl,
        config.load_timeout
    );

    let state = AppState {
        service: Arc::new(RankingService::from_config(&config)),
    };

    let addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("ETF ranking API listening on {}", addr);

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;
    Ok(())
}
