//! HTTP-доступ к API категорий и изображений

use crate::shared::api_utils::{api_url, error_text, get_json, post_json};
use contracts::domain::a001_category::dto::{
    ImageUploadResponse, ImageUrlsRequest, ImageUrlsResponse,
};
use contracts::domain::a001_category::history::{CategoryHistoryDetails, CategoryHistoryEntry};
use contracts::domain::a001_category::{
    BulkUpdateRequest, BulkUpdateResponse, Category, CategoryGateway, CategoryType,
};
use std::collections::HashMap;

/// Реализация `CategoryGateway` поверх REST API бэкенда
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpCategoryGateway;

impl CategoryGateway for HttpCategoryGateway {
    async fn fetch_all(&self, category_type: CategoryType) -> Result<Vec<Category>, String> {
        get_json(&format!("/api/categories?category_type={}", category_type.as_str())).await
    }

    async fn bulk_update(&self, request: BulkUpdateRequest) -> Result<BulkUpdateResponse, String> {
        post_json("/api/categories/bulk-update", &request).await
    }
}

// ============================================================================
// History
// ============================================================================

pub async fn fetch_history(category_type: CategoryType) -> Result<Vec<CategoryHistoryEntry>, String> {
    get_json(&format!(
        "/api/categories/history?category_type={}",
        category_type.as_str()
    ))
    .await
}

pub async fn fetch_history_details(id: i64) -> Result<CategoryHistoryDetails, String> {
    get_json(&format!("/api/categories/history/{}", id)).await
}

/// Восстанавливает дерево из снимка; сервер сам записывает новую запись истории
pub async fn recover(id: i64) -> Result<BulkUpdateResponse, String> {
    post_json(&format!("/api/categories/history/{}/recover", id), &()).await
}

pub fn export_csv_url(category_type: CategoryType) -> String {
    api_url(&format!(
        "/api/categories/export.csv?category_type={}",
        category_type.as_str()
    ))
}

// ============================================================================
// Images
// ============================================================================

/// Загружает файл изображения, возвращает путь в хранилище
pub async fn upload_image(file: &web_sys::File) -> Result<String, String> {
    use wasm_bindgen::JsCast;
    use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

    let form_data = FormData::new().map_err(|e| format!("{e:?}"))?;
    form_data
        .append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| format!("{e:?}"))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form_data);

    let url = api_url("/api/images");
    let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| format!("{e:?}"))?;

    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let resp_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("{e:?}"))?;
    let resp: Response = resp_value.dyn_into().map_err(|e| format!("{e:?}"))?;

    let text = wasm_bindgen_futures::JsFuture::from(resp.text().map_err(|e| format!("{e:?}"))?)
        .await
        .map_err(|e| format!("{e:?}"))?
        .as_string()
        .unwrap_or_default();

    if !resp.ok() {
        return Err(error_text(resp.status(), &text));
    }

    let parsed: ImageUploadResponse =
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse response: {e}"))?;
    Ok(parsed.image_id)
}

/// Подписанные URL для путей хранилища. Пути без URL в ответе не попадают;
/// при ошибке запроса изображения просто не показываются.
pub async fn fetch_image_urls(paths: Vec<String>) -> HashMap<String, String> {
    if paths.is_empty() {
        return HashMap::new();
    }
    let request = ImageUrlsRequest {
        image_storage_paths: paths,
    };
    match post_json::<_, ImageUrlsResponse>("/api/images/urls", &request).await {
        Ok(response) => response
            .urls
            .into_iter()
            .map(|(path, url)| (path, api_url(&url)))
            .collect(),
        Err(e) => {
            log::warn!("failed to sign image URLs: {}", e);
            HashMap::new()
        }
    }
}
