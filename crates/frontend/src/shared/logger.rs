//! Отправка клиентских событий в системный лог сервера

use crate::shared::api_utils::post_unit;
use contracts::shared::logger::CreateLogRequest;
use wasm_bindgen_futures::spawn_local;

/// Пишет событие в консоль и отправляет его на сервер в фоне
pub fn log_client(category: &str, message: impl Into<String>) {
    let request = CreateLogRequest::client(category, message);
    log::info!("[{}] {}", request.category, request.message);
    spawn_local(async move {
        if let Err(e) = post_unit("/api/logs", &request).await {
            log::warn!("failed to send client log: {}", e);
        }
    });
}
