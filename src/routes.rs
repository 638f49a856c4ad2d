//! HTTP surface: health and the signed media-delete endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::cloudinary::CloudinaryClient;

#[derive(Clone, Default)]
pub struct AppState { pub cloudinary: Option<Arc<CloudinaryClient>> }

impl AppState {
    pub fn new(cloudinary: Option<CloudinaryClient>) -> Self { Self { cloudinary: cloudinary.map(Arc::new) } }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMediaRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub public_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteMediaResponse { pub success: bool }

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

fn error(status: StatusCode, message: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.to_string() })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/cloudinary/delete", post(delete_media))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

async fn delete_media(State(s): State<AppState>, Json(req): Json<DeleteMediaRequest>) -> ApiResult<DeleteMediaResponse> {
    req.validate().map_err(|_| error(StatusCode::BAD_REQUEST, "publicId is required"))?;
    let client = s.cloudinary.as_ref().ok_or_else(|| error(StatusCode::INTERNAL_SERVER_ERROR, "Cloudinary is not configured"))?;
    let outcome = client.destroy(&req.public_id).await.map_err(|e| {
        tracing::error!(public_id = %req.public_id, error = %e, "cloudinary delete failed");
        error(StatusCode::INTERNAL_SERVER_ERROR, e)
    })?;
    if !outcome.is_ok() {
        tracing::warn!(public_id = %req.public_id, result = %outcome.result, "cloudinary reported nothing to delete");
    }
    Ok(Json(DeleteMediaResponse { success: true }))
}
