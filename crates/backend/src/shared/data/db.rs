use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Схема создаётся при старте, если таблиц ещё нет
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_category (
        id TEXT PRIMARY KEY NOT NULL,
        category_type TEXT NOT NULL,
        path TEXT NOT NULL,
        parent_path TEXT,
        display_order INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 1,
        is_active INTEGER NOT NULL DEFAULT 1,
        icon_name TEXT,
        image_id TEXT,
        localizations TEXT NOT NULL DEFAULT '[]',
        created_at TEXT,
        updated_at TEXT,
        UNIQUE (category_type, path)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_category_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_type TEXT NOT NULL,
        change_description TEXT NOT NULL DEFAULT '',
        changed_at TEXT NOT NULL,
        category_count INTEGER NOT NULL DEFAULT 0,
        snapshot TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a002_commission_rule (
        id TEXT PRIMARY KEY NOT NULL,
        team_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        formula TEXT NOT NULL,
        priority INTEGER NOT NULL DEFAULT 0,
        state TEXT NOT NULL DEFAULT 'draft',
        category_type TEXT,
        category_path TEXT,
        valid_from TEXT,
        valid_to TEXT,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS system_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        message TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a001_category_type ON a001_category (category_type);",
    "CREATE INDEX IF NOT EXISTS idx_a001_category_history_type ON a001_category_history (category_type, id);",
    "CREATE INDEX IF NOT EXISTS idx_a002_commission_rule_team ON a002_commission_rule (team_id);",
];

pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", db_url);
    let conn = Database::connect(&db_url).await?;

    for statement in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            statement.to_string(),
        ))
        .await?;
    }

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
