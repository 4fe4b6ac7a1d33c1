//! Thin HTTP facade over [`TicketClassifier`].
//!
//! Empty input is rejected here, before it reaches the classifier, and any
//! classifier fault is logged and reported as a generic server error.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::classifier::{ClassificationResult, TicketClassifier};
use crate::registry::RegistryInfo;

/// Name reported by `/select_model`; one combined TF-IDF model set is served.
pub const MODEL_NAME: &str = "tfidf_combo";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub routing_labels: Vec<String>,
    pub topic_labels: Vec<String>,
    pub priority_labels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
}

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: TicketClassifier,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify", post(classify))
        .route("/labels", get(labels))
        .route("/load_model", get(load_model))
        .route("/select_model", post(select_model))
        .route("/model_info", get(model_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the facade on the first of `addrs` that binds, until Ctrl-C.
///
/// Models must already be loaded: the listener is bound only after the
/// classifier exists, so no request can arrive before they are ready.
pub async fn serve(classifier: TicketClassifier, addrs: &[SocketAddr]) -> std::io::Result<()> {
    let app = router(AppState { classifier });
    let listener = TcpListener::bind(addrs).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// POST /classify
///
/// The body is parsed as JSON regardless of its content type.
async fn classify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClassificationResult>, ApiError> {
    let request: ClassifyRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty text".to_string()));
    }

    info!("Classifying text: {}", text);
    let result = state.classifier.classify_all(text).map_err(|e| {
        error!("Error in /classify: {}", e);
        ApiError::Internal("An error occurred while classifying the text.".to_string())
    })?;
    info!(
        "Classification result: topic={} priority={} routing={}",
        result.topic, result.priority, result.routing
    );

    Ok(Json(result))
}

/// GET /labels
async fn labels(State(state): State<AppState>) -> Json<LabelsResponse> {
    let classifier = &state.classifier;
    Json(LabelsResponse {
        routing_labels: classifier.routing_labels().to_vec(),
        topic_labels: classifier.topic_labels().to_vec(),
        priority_labels: classifier.priority_labels().to_vec(),
    })
}

/// GET /load_model
async fn load_model() -> Json<StatusResponse> {
    info!("Models are already loaded at startup.");
    Json(StatusResponse {
        status: "Models are ready".to_string(),
    })
}

/// POST /select_model
async fn select_model() -> Json<ModelResponse> {
    Json(ModelResponse {
        model: MODEL_NAME.to_string(),
    })
}

/// GET /model_info
async fn model_info(State(state): State<AppState>) -> Json<RegistryInfo> {
    Json(state.classifier.registry().info().clone())
}
