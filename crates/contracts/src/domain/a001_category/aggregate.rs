use super::hierarchy::{level_from_path, slugify};
use crate::domain::common::AggregateRoot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Обязательный язык: у каждой категории есть английское название
pub const ENGLISH: &str = "en";

/// Языки, для которых редактор предлагает переводы
pub const SUPPORTED_LANGUAGES: [&str; 8] = ["en", "es", "fr", "de", "it", "pt", "ja", "zh"];

/// Человекочитаемое название языка для UI
pub fn language_label(code: &str) -> &'static str {
    match code {
        "en" => "English",
        "es" => "Español",
        "fr" => "Français",
        "de" => "Deutsch",
        "it" => "Italiano",
        "pt" => "Português",
        "ja" => "日本語",
        "zh" => "中文",
        _ => "Unknown",
    }
}

// ============================================================================
// Category type
// ============================================================================

/// Независимое дерево категорий для каждого типа каталога
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    #[default]
    Consumer,
    Creator,
    Brand,
    Retailer,
}

impl CategoryType {
    pub const ALL: [CategoryType; 4] = [
        CategoryType::Consumer,
        CategoryType::Creator,
        CategoryType::Brand,
        CategoryType::Retailer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Consumer => "consumer",
            CategoryType::Creator => "creator",
            CategoryType::Brand => "brand",
            CategoryType::Retailer => "retailer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryType::Consumer => "Consumer",
            CategoryType::Creator => "Creator",
            CategoryType::Brand => "Brand",
            CategoryType::Retailer => "Retailer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Localization
// ============================================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoryLocalization {
    pub language_code: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryLocalization {
    /// Локализация со slug, сгенерированным из названия
    pub fn new(language_code: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            language_code: language_code.into(),
            slug: slugify(&name),
            name,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Пустая строка у ещё не сохранённых категорий
    #[serde(default)]
    pub category_id: String,

    /// Материализованный путь из сегментов через точку, например "a.b.c"
    pub path: String,

    #[serde(default)]
    pub parent_path: Option<String>,

    /// Порядок среди соседей с тем же parent_path
    #[serde(default)]
    pub display_order: i32,

    /// Глубина, начиная с 1; равна числу сегментов пути
    pub level: i32,

    #[serde(rename = "type")]
    pub category_type: CategoryType,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub icon_name: Option<String>,

    /// Путь в хранилище изображений, в URL превращается только по запросу
    #[serde(default)]
    pub image_id: Option<String>,

    #[serde(default)]
    pub localizations: Vec<CategoryLocalization>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// Новая несохранённая категория с английским названием
    pub fn new(
        category_type: CategoryType,
        path: impl Into<String>,
        parent_path: Option<String>,
        display_order: i32,
        english_name: &str,
    ) -> Self {
        let path = path.into();
        Self {
            category_id: String::new(),
            level: level_from_path(&path),
            path,
            parent_path,
            display_order,
            category_type,
            is_active: true,
            icon_name: None,
            image_id: None,
            localizations: vec![CategoryLocalization::new(ENGLISH, english_name)],
        }
    }

    pub fn is_saved(&self) -> bool {
        !self.category_id.is_empty()
    }

    pub fn localization(&self, language_code: &str) -> Option<&CategoryLocalization> {
        self.localizations
            .iter()
            .find(|l| l.language_code == language_code)
    }

    /// Проверка инвариантов одной записи. Инварианты набора (уникальность
    /// путей, существование родителя) проверяются в `hierarchy`.
    pub fn validate(&self) -> Result<(), String> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err("Path must not be empty".into());
        }
        if path.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(format!("Path \"{}\" contains an empty segment", self.path));
        }
        if self.level != level_from_path(&self.path) {
            return Err(format!(
                "Category \"{}\" has level {} but its path has {} segments",
                self.path,
                self.level,
                level_from_path(&self.path)
            ));
        }

        match self.parent_path.as_deref() {
            None if self.level > 1 => {
                return Err(format!("Category \"{}\" is nested but has no parent", self.path));
            }
            Some(parent) if !self.path.starts_with(&format!("{}.", parent)) => {
                return Err(format!(
                    "Category \"{}\" is not under its parent \"{}\"",
                    self.path, parent
                ));
            }
            _ => {}
        }

        let english = self
            .localizations
            .iter()
            .filter(|l| l.language_code == ENGLISH)
            .collect::<Vec<_>>();
        match english.as_slice() {
            [] => return Err(format!("Category \"{}\" has no English name", self.path)),
            [en] if en.name.trim().is_empty() => {
                return Err(format!("Category \"{}\" has no English name", self.path));
            }
            [_] => {}
            _ => {
                return Err(format!(
                    "Category \"{}\" has more than one English localization",
                    self.path
                ));
            }
        }

        let mut seen = HashSet::new();
        for loc in &self.localizations {
            if !SUPPORTED_LANGUAGES.contains(&loc.language_code.as_str()) {
                return Err(format!(
                    "Category \"{}\" uses unsupported language \"{}\"",
                    self.path, loc.language_code
                ));
            }
            if !seen.insert(loc.language_code.as_str()) {
                return Err(format!(
                    "Category \"{}\" has duplicate \"{}\" localizations",
                    self.path, loc.language_code
                ));
            }
        }

        if let Some(icon) = self.icon_name.as_deref() {
            if !super::icons::is_known_icon(icon) {
                return Err(format!("Unknown icon \"{}\"", icon));
            }
        }

        Ok(())
    }
}

impl AggregateRoot for Category {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.category_id.clone()
    }

    fn description(&self) -> &str {
        self.localization(ENGLISH)
            .map(|l| l.name.as_str())
            .unwrap_or_default()
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "category"
    }

    fn element_name() -> &'static str {
        "Category"
    }

    fn list_name() -> &'static str {
        "Categories"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(path: &str, parent: &str) -> Category {
        Category::new(CategoryType::Brand, path, Some(parent.into()), 0, "Child")
    }

    #[test]
    fn category_type_uses_snake_case_on_the_wire() {
        let cat = Category::new(CategoryType::Retailer, "shoes", None, 1, "Shoes");
        let json = serde_json::to_value(&cat).unwrap();
        assert_eq!(json["type"], "retailer");
        assert_eq!(CategoryType::parse(" Brand "), Some(CategoryType::Brand));
        assert_eq!(CategoryType::parse("other"), None);
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let cat: Category = serde_json::from_str(
            r#"{"path":"a","level":1,"type":"consumer","localizations":[{"language_code":"en","name":"A"}]}"#,
        )
        .unwrap();
        assert!(cat.is_active);
        assert!(!cat.is_saved());
        assert_eq!(cat.parent_path, None);
        assert!(cat.validate().is_ok());
    }

    #[test]
    fn validate_reports_broken_records() {
        assert!(child("a.b", "a").validate().is_ok());
        assert!(child("x.b", "a").validate().is_err());

        let mut wrong_level = child("a.b", "a");
        wrong_level.level = 3;
        assert!(wrong_level.validate().is_err());

        let mut no_english = child("a.b", "a");
        no_english.localizations = vec![CategoryLocalization::new("fr", "Enfant")];
        assert!(no_english.validate().is_err());

        let mut blank = child("a.b", "a");
        blank.localizations[0].name = "  ".into();
        assert!(blank.validate().is_err());

        let mut bad_icon = child("a.b", "a");
        bad_icon.icon_name = Some("no-such-icon".into());
        assert!(bad_icon.validate().is_err());
    }

    #[test]
    fn aggregate_metadata() {
        assert_eq!(Category::full_name(), "a001_category");
        assert_eq!(Category::table_prefix(), "a001_category_");
        let cat = Category::new(CategoryType::Consumer, "toys", None, 1, "Toys");
        assert_eq!(cat.description(), "Toys");
    }
}
