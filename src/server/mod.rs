//! HTTP upload server.
//!
//! Receives extracted tile images from a front end and stores them on disk:
//!
//! - `GET /healthz`
//! - `POST /upload`: one `image` part plus an optional `metadata` JSON part
//! - `POST /upload-multi`: any number of `images` parts

mod upload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{Result, TileError};

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct UploadState {
    upload_dir: Arc<PathBuf>,
}

impl UploadState {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: Arc::new(upload_dir.into()),
        }
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }
}

/// Build the upload router.
pub fn router(state: UploadState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/upload", post(upload::upload_image))
        .route("/upload-multi", post(upload::upload_images))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve uploads into `upload_dir` until the process exits.
pub async fn serve(addr: SocketAddr, upload_dir: PathBuf) -> Result<()> {
    let app = router(UploadState::new(upload_dir.clone()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "listening on http://{} (uploads in {})",
        listener.local_addr()?,
        upload_dir.display()
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

/// Error body: `400 { error }` for rejected uploads, `500 { error }` for
/// anything else.
#[derive(Debug)]
pub(crate) struct ApiError(TileError);

impl From<TileError> for ApiError {
    fn from(err: TileError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TileError::Upload { .. } => StatusCode::BAD_REQUEST,
            other => {
                error!(error = %other, "upload failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match self.0 {
            TileError::Upload { message } => message,
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
