use axum::{
    extract::{Path, Query},
    http::header,
    response::IntoResponse,
    Json,
};
use contracts::domain::a001_category::aggregate::Category;
use contracts::domain::a001_category::dto::{
    BulkUpdateRequest, BulkUpdateResponse, CategoryListQuery,
};
use contracts::domain::a001_category::history::{CategoryHistoryDetails, CategoryHistoryEntry};

use crate::domain::a001_category::{csv_export, service};
use crate::shared::error::ApiResult;

/// GET /api/categories?category_type=consumer
pub async fn list(Query(query): Query<CategoryListQuery>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(service::list(query.category_type).await?))
}

/// POST /api/categories/bulk-update
pub async fn bulk_update(
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdateResponse>> {
    Ok(Json(service::bulk_update(request).await?))
}

/// GET /api/categories/export.csv?category_type=consumer
pub async fn export_csv(Query(query): Query<CategoryListQuery>) -> ApiResult<impl IntoResponse> {
    let categories = service::list(query.category_type).await?;
    let body = csv_export::to_csv(&categories)?;
    let disposition = format!(
        "attachment; filename=\"categories_{}.csv\"",
        query.category_type.as_str()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /api/categories/history?category_type=consumer
pub async fn history(
    Query(query): Query<CategoryListQuery>,
) -> ApiResult<Json<Vec<CategoryHistoryEntry>>> {
    Ok(Json(service::history(query.category_type).await?))
}

/// GET /api/categories/history/:id
pub async fn history_details(Path(id): Path<i64>) -> ApiResult<Json<CategoryHistoryDetails>> {
    Ok(Json(service::history_details(id).await?))
}

/// POST /api/categories/history/:id/recover
pub async fn recover(Path(id): Path<i64>) -> ApiResult<Json<BulkUpdateResponse>> {
    Ok(Json(service::recover(id).await?))
}
