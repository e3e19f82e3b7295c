use super::signing::UrlSigner;
use crate::shared::config::{resolve_path, StorageConfig};
use crate::shared::error::ApiError;
use once_cell::sync::OnceCell;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

static STORE: OnceCell<ImageStore> = OnceCell::new();

/// Подкаталог для изображений категорий
const CATEGORY_FOLDER: &str = "categories";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

pub struct ImageStore {
    root: PathBuf,
    signer: UrlSigner,
    max_upload_bytes: usize,
}

pub fn initialize(config: &StorageConfig) -> anyhow::Result<()> {
    let root = resolve_path(&config.images_dir);
    std::fs::create_dir_all(root.join(CATEGORY_FOLDER))?;
    tracing::info!("Image storage at {}", root.display());

    let store = ImageStore::new(
        root,
        UrlSigner::new(&config.signing_secret, config.url_ttl_secs)?,
        config.max_upload_bytes,
    );
    STORE
        .set(store)
        .map_err(|_| anyhow::anyhow!("Image storage already initialized"))
}

pub fn get_store() -> anyhow::Result<&'static ImageStore> {
    STORE
        .get()
        .ok_or_else(|| anyhow::anyhow!("Image storage has not been initialized"))
}

impl ImageStore {
    pub fn new(root: PathBuf, signer: UrlSigner, max_upload_bytes: usize) -> Self {
        Self {
            root,
            signer,
            max_upload_bytes,
        }
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Путь в хранилище должен быть относительным, без `..`, с картинкой на конце
    pub fn validate_storage_path(path: &str) -> Result<(), ApiError> {
        let candidate = Path::new(path);
        let normal = !path.is_empty()
            && !path.contains('\\')
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !normal {
            return Err(ApiError::BadRequest(format!("Invalid image path \"{}\"", path)));
        }
        match extension_of(path) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(ApiError::BadRequest(format!(
                "Unsupported image type \"{}\"",
                path
            ))),
        }
    }

    /// Сохраняет загруженный файл и возвращает его путь в хранилище
    pub async fn save(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        if bytes.is_empty() {
            return Err(ApiError::Validation("Uploaded file is empty".into()).into());
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(ApiError::Validation(format!(
                "Image is too large ({} bytes, limit {} bytes)",
                bytes.len(),
                self.max_upload_bytes
            ))
            .into());
        }
        let extension = upload_extension(file_name, content_type).ok_or_else(|| {
            ApiError::Validation(format!("\"{}\" is not a supported image", file_name))
        })?;

        let storage_path = format!("{}/{}.{}", CATEGORY_FOLDER, Uuid::new_v4().simple(), extension);
        let full_path = self.root.join(&storage_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        tracing::info!("Stored image {} ({} bytes)", storage_path, bytes.len());
        Ok(storage_path)
    }

    pub async fn exists(&self, storage_path: &str) -> bool {
        Self::validate_storage_path(storage_path).is_ok()
            && tokio::fs::metadata(self.root.join(storage_path))
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
    }

    pub async fn read(&self, storage_path: &str) -> anyhow::Result<Vec<u8>> {
        Self::validate_storage_path(storage_path)?;
        match tokio::fs::read(self.root.join(storage_path)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::NotFound(format!("Image {}", storage_path)).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Расширение по имени файла, а если его нет - по Content-Type
fn upload_extension(file_name: &str, content_type: Option<&str>) -> Option<&'static str> {
    if let Some(ext) = extension_of(file_name) {
        return ALLOWED_EXTENSIONS.iter().copied().find(|e| *e == ext);
    }
    match content_type? {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_paths_are_confined() {
        assert!(ImageStore::validate_storage_path("categories/a.png").is_ok());
        assert!(ImageStore::validate_storage_path("../etc/passwd.png").is_err());
        assert!(ImageStore::validate_storage_path("/abs/a.png").is_err());
        assert!(ImageStore::validate_storage_path("categories\\a.png").is_err());
        assert!(ImageStore::validate_storage_path("categories/a.exe").is_err());
        assert!(ImageStore::validate_storage_path("").is_err());
    }

    #[test]
    fn upload_extension_from_name_or_type() {
        assert_eq!(upload_extension("Photo.JPG", None), Some("jpg"));
        assert_eq!(upload_extension("blob", Some("image/webp")), Some("webp"));
        assert_eq!(upload_extension("notes.txt", Some("image/png")), None);
        assert_eq!(upload_extension("blob", None), None);
        assert_eq!(content_type_for("categories/x.svg"), "image/svg+xml");
    }
}
