//! JSON API exposing the analytics engine to the dashboard front end.
//!
//! Input-validation failures map to 400; everything else the engine already
//! degrades to empty arrays, so a healthy server always has something
//! renderable to return.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use screener_analytics::AnalyticsEngine;
use screener_core::ScreenerError;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use yahoo_client::YahooClient;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalyticsEngine<YahooClient>>,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

pub struct AppError(pub ScreenerError);

impl From<ScreenerError> for AppError {
    fn from(e: ScreenerError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
        });
        (status, body).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/returns", get(routes::get_returns))
        .route("/api/summary", get(routes::get_summary))
        .route("/api/fundamentals", get(routes::get_fundamentals))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    let timeout_secs: u64 = std::env::var("SCREENER_FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    let provider = Arc::new(YahooClient::with_timeout(Duration::from_secs(timeout_secs)));
    let state = AppState {
        engine: Arc::new(AnalyticsEngine::new(provider)),
    };

    let bind = std::env::var("SCREENER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("api-server listening on {}", bind);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
