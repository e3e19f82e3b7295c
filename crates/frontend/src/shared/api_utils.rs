//! API utilities for frontend-backend communication
//!
//! Helpers for constructing API URLs and reading JSON responses. Every
//! non-2xx response of the backend carries `{"error": "..."}`; the text of
//! that field is what the UI shows.

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Get the base URL for API requests
///
/// Constructs the API base URL from the current window location,
/// using port 3000 for the backend server.
///
/// # Example
/// ```rust,no_run
/// # use frontend::shared::api_utils::api_base;
/// let url = format!("{}/api/categories?category_type=brand", api_base());
/// ```
pub fn api_base() -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:3000", protocol, hostname)
}

/// Build a full API URL from a path that starts with "/api/"
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Текст ошибки из тела ответа или HTTP-статус, если тела нет
pub fn error_text(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.trim().is_empty() => parsed.error,
        _ => format!("HTTP {}", status),
    }
}

/// Проверяет статус и разбирает JSON-ответ
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    if !response.ok() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(error_text(status, &body));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

/// Проверяет статус ответа без тела (204 и т.п.)
pub async fn read_empty(response: Response) -> Result<(), String> {
    if response.ok() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(error_text(status, &body))
}

pub async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    let response = Request::get(&api_url(path))
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;
    read_json(response).await
}

pub async fn post_json<B: Serialize, T: DeserializeOwned>(path: &str, body: &B) -> Result<T, String> {
    let response = Request::post(&api_url(path))
        .json(body)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;
    read_json(response).await
}

/// POST без тела ответа
pub async fn post_unit<B: Serialize>(path: &str, body: &B) -> Result<(), String> {
    let response = Request::post(&api_url(path))
        .json(body)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;
    read_empty(response).await
}

pub async fn put_json<B: Serialize, T: DeserializeOwned>(path: &str, body: &B) -> Result<T, String> {
    let response = Request::put(&api_url(path))
        .json(body)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;
    read_json(response).await
}

pub async fn delete(path: &str) -> Result<(), String> {
    let response = Request::delete(&api_url(path))
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;
    read_empty(response).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_text_prefers_server_message() {
        assert_eq!(error_text(400, r#"{"error":"Name is required"}"#), "Name is required");
        assert_eq!(error_text(500, ""), "HTTP 500");
        assert_eq!(error_text(404, r#"{"error":"  "}"#), "HTTP 404");
        assert_eq!(error_text(502, "<html>bad gateway</html>"), "HTTP 502");
    }
}
