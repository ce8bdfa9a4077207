//! Upload handlers.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{ApiError, UploadState};
use crate::error::TileError;

const PNG_MIME: &str = "image/png";
const INVALID_FILE: &str = "No file uploaded or invalid file type";

fn rejected(message: impl Into<String>) -> ApiError {
    ApiError::from(TileError::Upload {
        message: message.into(),
    })
}

/// A PNG part read fully into memory.
struct PngPart {
    filename: String,
    bytes: Vec<u8>,
}

/// Stored filename for an uploaded part: directory components stripped and
/// any extension other than `.png` replaced.
pub(crate) fn stored_filename(original: Option<&str>) -> String {
    let name = original
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("upload.png");

    let path = Path::new(name);
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        return name.to_string();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("upload");
    format!("{}.png", stem)
}

async fn read_png(field: Field<'_>) -> Result<PngPart, ApiError> {
    if field.content_type() != Some(PNG_MIME) {
        return Err(rejected(INVALID_FILE));
    }
    let filename = stored_filename(field.file_name());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| rejected(format!("Failed to read upload: {}", e)))?;
    Ok(PngPart {
        filename,
        bytes: bytes.to_vec(),
    })
}

fn parse_metadata(raw: &str) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(rejected("Metadata must be a JSON object")),
        Err(e) => Err(rejected(format!("Invalid metadata JSON: {}", e))),
    }
}

async fn save(dir: &Path, part: &PngPart) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| TileError::Io {
            path: dir.to_path_buf(),
            message: format!("Failed to create upload directory: {}", e),
        })?;
    let path = dir.join(&part.filename);
    tokio::fs::write(&path, &part.bytes)
        .await
        .map_err(|e| TileError::Io {
            path: path.clone(),
            message: format!("Failed to save upload: {}", e),
        })?;
    Ok(path)
}

/// `POST /upload`
pub(crate) async fn upload_image(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|_| rejected(INVALID_FILE))?;

    let mut image = None;
    let mut metadata = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("image") if image.is_none() => image = Some(read_png(field).await?),
            Some("metadata") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| rejected(format!("Failed to read metadata: {}", e)))?;
                metadata = Some(parse_metadata(&raw)?);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| rejected(INVALID_FILE))?;
    let path = save(&state.upload_dir, &image).await?;
    let size = image.bytes.len();
    info!(file = %path.display(), size, "stored upload");

    let metadata_file = match &metadata {
        Some(fields) => Some(write_sidecar(&path, &image.filename, size, fields.clone()).await?),
        None => None,
    };

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "file": {
            "filePath": path.display().to_string(),
            "filename": image.filename,
            "size": size,
        },
        "metadata": metadata,
        "metadataFile": metadata_file.map(|p| p.display().to_string()),
    })))
}

/// Write `<stem>.json` next to the image: the client's metadata plus
/// `imageFile`, `uploadedAt` and `fileSize`.
async fn write_sidecar(
    image_path: &Path,
    filename: &str,
    size: usize,
    mut fields: Map<String, Value>,
) -> Result<PathBuf, ApiError> {
    fields.insert("imageFile".into(), json!(filename));
    fields.insert("uploadedAt".into(), json!(chrono::Utc::now().to_rfc3339()));
    fields.insert("fileSize".into(), json!(size));

    let path = image_path.with_extension("json");
    let body = serde_json::to_vec_pretty(&Value::Object(fields)).map_err(|e| TileError::Parse {
        message: format!("Failed to serialize metadata: {}", e),
        help: None,
    })?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| TileError::Io {
            path: path.clone(),
            message: format!("Failed to write metadata: {}", e),
        })?;
    Ok(path)
}

/// `POST /upload-multi`
pub(crate) async fn upload_images(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut parts = Vec::new();
    if let Ok(mut multipart) = multipart {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| rejected(format!("Malformed multipart body: {}", e)))?
        {
            if field.name() == Some("images") {
                parts.push(read_png(field).await?);
            }
        }
    }

    if parts.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "No files uploaded" })),
        )
            .into_response());
    }

    // Every part is validated before the first one is written.
    for part in &parts {
        save(&state.upload_dir, part).await?;
    }
    info!(count = parts.len(), dir = %state.upload_dir.display(), "stored uploads");

    Ok(Json(json!({
        "message": "Files uploaded successfully",
        "fileCount": parts.len(),
    }))
    .into_response())
}
