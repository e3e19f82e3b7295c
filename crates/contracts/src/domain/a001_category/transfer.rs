//! Импорт и экспорт дерева категорий в JSON.

use super::aggregate::{Category, CategoryType};
use super::hierarchy::{duplicate_path_check, missing_parent_check};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExportFile {
    pub format_version: u32,
    pub category_type: CategoryType,
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
}

impl CategoryExportFile {
    pub fn new(category_type: CategoryType, categories: Vec<Category>) -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            category_type,
            exported_at: Utc::now(),
            categories,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "categories_{}_{}.json",
            self.category_type,
            self.exported_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn to_json(&self) -> Result<String, ImportError> {
        serde_json::to_string_pretty(self).map_err(|e| ImportError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid import file: {0}")]
    Parse(String),
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("File contains {found} categories, but {expected} categories are being edited")]
    TypeMismatch {
        found: CategoryType,
        expected: CategoryType,
    },
    #[error("Import file is invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportMode {
    /// Дерево целиком заменяется файлом
    Replace,
    /// Совпадающие пути обновляются, новые добавляются, остальное не трогаем
    #[default]
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub upserts: Vec<Category>,
    pub remove_paths: Vec<String>,
}

/// Разбор и проверка файла экспорта
pub fn parse_import(json: &str, expected: CategoryType) -> Result<Vec<Category>, ImportError> {
    let file: CategoryExportFile =
        serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))?;
    if file.format_version != EXPORT_FORMAT_VERSION {
        return Err(ImportError::UnsupportedVersion(file.format_version));
    }
    if file.category_type != expected {
        return Err(ImportError::TypeMismatch {
            found: file.category_type,
            expected,
        });
    }

    let mut errors: Vec<String> = file
        .categories
        .iter()
        .filter_map(|c| c.validate().err())
        .collect();
    errors.extend(duplicate_path_check(&file.categories));
    errors.extend(missing_parent_check(&file.categories));
    if !errors.is_empty() {
        return Err(ImportError::Invalid(errors));
    }

    Ok(file
        .categories
        .into_iter()
        .map(|mut c| {
            c.category_type = expected;
            c
        })
        .collect())
}

/// Что сделать с текущим деревом, чтобы применить импорт
pub fn plan_import(existing: &[Category], imported: Vec<Category>, mode: ImportMode) -> ImportPlan {
    let remove_paths = match mode {
        ImportMode::Merge => Vec::new(),
        ImportMode::Replace => {
            let incoming: HashSet<&str> = imported.iter().map(|c| c.path.as_str()).collect();
            existing
                .iter()
                .filter(|c| !incoming.contains(c.path.as_str()))
                .map(|c| c.path.clone())
                .collect()
        }
    };
    ImportPlan {
        upserts: imported,
        remove_paths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::editing::CategoryWorkingSet;
    use crate::domain::a001_category::localization::get_name;

    fn cat(path: &str, parent: Option<&str>, name: &str) -> Category {
        Category::new(CategoryType::Retailer, path, parent.map(String::from), 0, name)
    }

    fn export_json(categories: Vec<Category>) -> String {
        CategoryExportFile::new(CategoryType::Retailer, categories)
            .to_json()
            .unwrap()
    }

    #[test]
    fn export_then_parse() {
        let json = export_json(vec![cat("a", None, "A"), cat("a.b", Some("a"), "B")]);
        let parsed = parse_import(&json, CategoryType::Retailer).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn parse_rejects_wrong_type_and_garbage() {
        let json = export_json(vec![cat("a", None, "A")]);
        assert_eq!(
            parse_import(&json, CategoryType::Brand),
            Err(ImportError::TypeMismatch {
                found: CategoryType::Retailer,
                expected: CategoryType::Brand
            })
        );
        assert!(matches!(
            parse_import("{", CategoryType::Brand),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn parse_collects_structural_errors() {
        let json = export_json(vec![
            cat("a", None, "A"),
            cat("a", None, "A again"),
            cat("x.y", Some("x"), "Y"),
        ]);
        match parse_import(&json, CategoryType::Retailer) {
            Err(ImportError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn merge_and_replace_are_staged() {
        let mut existing_a = cat("a", None, "A");
        existing_a.category_id = "id-a".into();
        let mut existing_c = cat("c", None, "C");
        existing_c.category_id = "id-c".into();
        let server = vec![existing_a, existing_c];

        let imported = vec![cat("a", None, "Renamed"), cat("d", None, "D")];

        let mut merged = CategoryWorkingSet::from_server(CategoryType::Retailer, server.clone());
        let summary = merged.stage_import(imported.clone(), ImportMode::Merge);
        assert_eq!(summary, ImportSummary { added: 1, updated: 1, removed: 0 });
        assert_eq!(get_name(&merged.get("id-a").unwrap().category, "en"), "Renamed");
        assert!(merged.get("id-c").is_some());

        let mut replaced = CategoryWorkingSet::from_server(CategoryType::Retailer, server);
        let summary = replaced.stage_import(imported, ImportMode::Replace);
        assert_eq!(summary, ImportSummary { added: 1, updated: 1, removed: 1 });
        assert_eq!(replaced.deleted_ids(), ["id-c".to_string()]);
        assert_eq!(replaced.items().len(), 2);
    }
}
