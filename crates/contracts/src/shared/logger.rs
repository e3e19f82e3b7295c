use serde::{Deserialize, Serialize};

pub const SOURCE_CLIENT: &str = "client";
pub const SOURCE_SERVER: &str = "server";

/// Запись лога системы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    /// "client" или "server"
    pub source: String,
    pub category: String,
    pub message: String,
}

/// DTO для создания новой записи лога
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLogRequest {
    pub source: String,
    pub category: String,
    pub message: String,
}

impl CreateLogRequest {
    pub fn client(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: SOURCE_CLIENT.to_string(),
            category: category.into(),
            message: message.into(),
        }
    }
}
