use axum::{extract::Query, http::StatusCode, Json};
use contracts::shared::logger::{CreateLogRequest, LogEntry, SOURCE_CLIENT};
use serde::Deserialize;

use crate::shared::error::{ApiError, ApiResult};
use crate::shared::logger::repository::{self, LogFilter};

const MAX_LIMIT: u64 = 5000;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub source: Option<String>,
    pub category: Option<String>,
}

fn default_limit() -> u64 {
    500
}

impl From<LogsQuery> for LogFilter {
    fn from(q: LogsQuery) -> Self {
        LogFilter {
            source: q.source,
            category: q.category,
            limit: q.limit.clamp(1, MAX_LIMIT),
        }
    }
}

/// GET /api/logs?limit=500&source=client&category=a001_category
pub async fn list_all(Query(query): Query<LogsQuery>) -> ApiResult<Json<Vec<LogEntry>>> {
    Ok(Json(repository::find_logs(&query.into()).await?))
}

/// POST /api/logs; клиент пишет только от своего имени
pub async fn create(Json(req): Json<CreateLogRequest>) -> ApiResult<StatusCode> {
    if req.source != SOURCE_CLIENT {
        return Err(ApiError::BadRequest(format!(
            "log source must be \"{}\"",
            SOURCE_CLIENT
        )));
    }
    if req.category.trim().is_empty() {
        return Err(ApiError::BadRequest("log category is required".to_string()));
    }
    repository::log_event(&req.source, &req.category, &req.message).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/logs
pub async fn clear_all() -> ApiResult<StatusCode> {
    let removed = repository::clear_all_logs().await?;
    tracing::info!("Cleared {} log entries", removed);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let filter: LogFilter = LogsQuery {
            limit: 0,
            source: None,
            category: None,
        }
        .into();
        assert_eq!(filter.limit, 1);

        let filter: LogFilter = LogsQuery {
            limit: 1_000_000,
            source: Some("server".to_string()),
            category: None,
        }
        .into();
        assert_eq!(filter.limit, MAX_LIMIT);
        assert_eq!(filter.source.as_deref(), Some("server"));
    }
}
