use super::aggregate::{Category, CategoryType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListQuery {
    pub category_type: CategoryType,
}

/// Массовое сохранение всего дерева одного типа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub category_type: CategoryType,
    pub categories: Vec<Category>,
    /// Категории, удалённые в редакторе с момента загрузки
    #[serde(default)]
    pub deleted_ids: Vec<String>,
    #[serde(default)]
    pub change_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub categories: Vec<Category>,
    pub history_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub image_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrlsRequest {
    pub image_storage_paths: Vec<String>,
}

/// Пути, для которых подписать URL не удалось, в ответ не попадают
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrlsResponse {
    pub urls: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}
