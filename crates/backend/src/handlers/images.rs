use axum::{
    extract::{Multipart, Query},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use contracts::domain::a001_category::dto::{
    ImageUploadResponse, ImageUrlsRequest, ImageUrlsResponse,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::shared::error::{ApiError, ApiResult};
use crate::shared::images::{self, storage::content_type_for, ImageStore};

/// POST /api/images (multipart, поле `file`)
pub async fn upload(mut multipart: Multipart) -> ApiResult<Json<ImageUploadResponse>> {
    let store = images::get_store()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        let image_id = store
            .save(&file_name, content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(ImageUploadResponse { image_id }));
    }

    Err(ApiError::BadRequest("No file in request".into()))
}

/// POST /api/images/urls
pub async fn urls(Json(request): Json<ImageUrlsRequest>) -> ApiResult<Json<ImageUrlsResponse>> {
    let store = images::get_store()?;
    let now = Utc::now();

    let mut urls = HashMap::new();
    for path in request.image_storage_paths {
        if urls.contains_key(&path) {
            continue;
        }
        if !store.exists(&path).await {
            tracing::warn!("Skipping URL for missing image {}", path);
            continue;
        }
        let url = store.signer().sign(&path, now);
        urls.insert(path, url);
    }

    Ok(Json(ImageUrlsResponse {
        urls,
        expires_at: store.signer().expires_at(now),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: String,
    pub expires: i64,
    pub signature: String,
}

/// GET /api/images/file?path=..&expires=..&signature=..
pub async fn file(Query(query): Query<FileQuery>) -> ApiResult<impl IntoResponse> {
    let store = images::get_store()?;
    ImageStore::validate_storage_path(&query.path)?;
    store
        .signer()
        .verify(&query.path, query.expires, &query.signature, Utc::now())
        .map_err(|e| ApiError::Forbidden(e.to_string()))?;

    let bytes = store.read(&query.path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&query.path)),
            (header::CACHE_CONTROL, "private, max-age=300"),
        ],
        bytes,
    ))
}
