use crate::shared::api_utils::{delete, get_json};
use contracts::shared::logger::LogEntry;

pub async fn fetch_logs(limit: u64) -> Result<Vec<LogEntry>, String> {
    get_json(&format!("/api/logs?limit={}", limit)).await
}

pub async fn clear_logs() -> Result<(), String> {
    delete("/api/logs").await
}
