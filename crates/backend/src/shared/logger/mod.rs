pub mod repository;

use contracts::shared::logger::SOURCE_SERVER;
use repository::log_event_internal;

/// Логирование события на сервере в таблицу system_log
///
/// # Примеры
/// ```ignore
/// logger::log("startup", "Server started");
/// logger::log("a001_category", "Bulk update of consumer categories");
/// ```
pub fn log(category: &str, message: &str) {
    tracing::info!(target: "system_log", "[{}] {}", category, message);
    log_event_internal(SOURCE_SERVER, category, message);
}
