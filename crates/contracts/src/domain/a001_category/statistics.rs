use super::aggregate::{Category, SUPPORTED_LANGUAGES};
use super::hierarchy::MIN_DISPLAY_DEPTH;
use super::localization::has_translation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCoverage {
    pub language_code: String,
    pub translated: usize,
    pub missing: usize,
}

impl LanguageCoverage {
    pub fn percent(&self) -> f64 {
        let total = self.translated + self.missing;
        if total == 0 {
            0.0
        } else {
            self.translated as f64 * 100.0 / total as f64
        }
    }
}

/// Сводка по дереву для окна статистики
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub roots: usize,
    pub max_depth: i32,
    pub by_level: BTreeMap<i32, usize>,
    pub with_icon: usize,
    pub with_image: usize,
    pub coverage: Vec<LanguageCoverage>,
}

impl CategoryStatistics {
    pub fn compute(categories: &[Category]) -> Self {
        let mut stats = Self {
            total: categories.len(),
            ..Default::default()
        };

        for category in categories {
            if category.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            if category.parent_path.is_none() {
                stats.roots += 1;
            }
            if category.icon_name.is_some() {
                stats.with_icon += 1;
            }
            if category.image_id.is_some() {
                stats.with_image += 1;
            }
            *stats.by_level.entry(category.level).or_default() += 1;
            stats.max_depth = stats.max_depth.max(category.level);
        }

        stats.coverage = SUPPORTED_LANGUAGES
            .iter()
            .map(|code| {
                let translated = categories
                    .iter()
                    .filter(|c| has_translation(c, code))
                    .count();
                LanguageCoverage {
                    language_code: code.to_string(),
                    translated,
                    missing: categories.len() - translated,
                }
            })
            .collect();

        stats
    }

    /// Глубина для отображения, не меньше минимальной
    pub fn display_depth(&self) -> i32 {
        self.max_depth.max(MIN_DISPLAY_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::{CategoryLocalization, CategoryType};

    #[test]
    fn counts_and_coverage() {
        let mut root = Category::new(CategoryType::Brand, "a", None, 0, "A");
        root.icon_name = Some("star".into());
        root.localizations.push(CategoryLocalization::new("fr", "A fr"));
        let mut child = Category::new(CategoryType::Brand, "a.b", Some("a".into()), 0, "B");
        child.is_active = false;
        child.image_id = Some("images/b.png".into());

        let stats = CategoryStatistics::compute(&[root, child]);
        assert_eq!(stats.total, 2);
        assert_eq!((stats.active, stats.inactive), (1, 1));
        assert_eq!(stats.roots, 1);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.display_depth(), MIN_DISPLAY_DEPTH);
        assert_eq!(stats.by_level.get(&2), Some(&1));
        assert_eq!((stats.with_icon, stats.with_image), (1, 1));

        let fr = stats.coverage.iter().find(|c| c.language_code == "fr").unwrap();
        assert_eq!((fr.translated, fr.missing), (1, 1));
        assert_eq!(fr.percent(), 50.0);
    }

    #[test]
    fn empty_input() {
        let stats = CategoryStatistics::compute(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.coverage.iter().all(|c| c.percent() == 0.0));
    }
}
