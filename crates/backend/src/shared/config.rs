use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Каталог со сборкой фронтенда
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// Время жизни подписанной ссылки на изображение, в секундах
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: i64,
    /// Пустой секрет - сгенерировать при старте (ссылки живут до перезапуска)
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".into()
}

fn default_images_dir() -> String {
    "target/storage/images".into()
}

fn default_url_ttl() -> i64 {
    3600
}

fn default_max_upload() -> usize {
    5 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            url_ttl_secs: default_url_ttl(),
            signing_secret: String::new(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000
static_dir = "dist"

[database]
path = "target/db/app.db"

[storage]
images_dir = "target/storage/images"
url_ttl_secs = 3600
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Относительные пути из конфигурации считаются от каталога с исполняемым файлом
pub fn resolve_path(configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }

    PathBuf::from(configured)
}

pub fn get_database_path(config: &Config) -> PathBuf {
    resolve_path(&config.database.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.url_ttl_secs, 3600);
        assert!(config.storage.signing_secret.is_empty());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[database]\npath = \"/tmp/app.db\"\n").unwrap();
        assert_eq!(config.server.static_dir, "dist");
        assert_eq!(config.storage.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(get_database_path(&config), PathBuf::from("/tmp/app.db"));
    }
}
