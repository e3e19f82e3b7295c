use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Ошибка HTTP-обработчика. Сервисы возвращают `anyhow::Error`; если внутри
/// лежит `ApiError`, статус сохраняется.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation_list(errors: &[String]) -> Self {
        ApiError::Validation(errors.join("; "))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api) => api,
            Err(other) => ApiError::Internal(format!("{:#}", other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_api_error_keeps_status() {
        let err: anyhow::Error = ApiError::NotFound("rule".into()).into();
        let api = ApiError::from(err);
        assert_eq!(api.status(), StatusCode::NOT_FOUND);

        let plain = ApiError::from(anyhow::anyhow!("disk full"));
        assert_eq!(plain.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_messages_are_joined() {
        let api = ApiError::validation_list(&["a".into(), "b".into()]);
        assert_eq!(api.to_string(), "a; b");
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }
}
