use super::aggregate::{Category, CategoryType, ENGLISH};
use super::localization::get_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Запись журнала изменений дерева (одно массовое сохранение)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHistoryEntry {
    pub id: i64,
    pub category_type: CategoryType,
    pub change_description: String,
    pub changed_at: DateTime<Utc>,
    pub category_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHistoryDetails {
    pub entry: CategoryHistoryEntry,
    pub categories: Vec<Category>,
    /// Отличия от предыдущего снимка того же типа
    pub changes: Vec<HistoryChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryChange {
    pub kind: HistoryChangeKind,
    pub path: String,
    pub name: String,
    /// Имена изменившихся полей для `Modified`
    #[serde(default)]
    pub fields: Vec<String>,
}

fn identity(category: &Category) -> &str {
    if category.is_saved() {
        &category.category_id
    } else {
        &category.path
    }
}

fn changed_fields(before: &Category, after: &Category) -> Vec<String> {
    let mut fields = Vec::new();
    if before.path != after.path || before.parent_path != after.parent_path {
        fields.push("path");
    }
    if before.display_order != after.display_order {
        fields.push("display_order");
    }
    if before.is_active != after.is_active {
        fields.push("is_active");
    }
    if before.icon_name != after.icon_name {
        fields.push("icon_name");
    }
    if before.image_id != after.image_id {
        fields.push("image_id");
    }
    let mut before_locs = before.localizations.clone();
    let mut after_locs = after.localizations.clone();
    before_locs.sort_by(|a, b| a.language_code.cmp(&b.language_code));
    after_locs.sort_by(|a, b| a.language_code.cmp(&b.language_code));
    if before_locs != after_locs {
        fields.push("localizations");
    }
    fields.into_iter().map(String::from).collect()
}

/// Отличия `after` от `before`; категории сопоставляются по ID, а без него по пути
pub fn diff_snapshots(before: &[Category], after: &[Category]) -> Vec<HistoryChange> {
    let before_by_id: HashMap<&str, &Category> = before.iter().map(|c| (identity(c), c)).collect();
    let after_by_id: HashMap<&str, &Category> = after.iter().map(|c| (identity(c), c)).collect();

    let mut changes: Vec<HistoryChange> = Vec::new();
    for category in after {
        match before_by_id.get(identity(category)) {
            None => changes.push(HistoryChange {
                kind: HistoryChangeKind::Added,
                path: category.path.clone(),
                name: get_name(category, ENGLISH).to_string(),
                fields: Vec::new(),
            }),
            Some(previous) => {
                let fields = changed_fields(previous, category);
                if !fields.is_empty() {
                    changes.push(HistoryChange {
                        kind: HistoryChangeKind::Modified,
                        path: category.path.clone(),
                        name: get_name(category, ENGLISH).to_string(),
                        fields,
                    });
                }
            }
        }
    }
    for category in before {
        if !after_by_id.contains_key(identity(category)) {
            changes.push(HistoryChange {
                kind: HistoryChangeKind::Removed,
                path: category.path.clone(),
                name: get_name(category, ENGLISH).to_string(),
                fields: Vec::new(),
            });
        }
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, path: &str, name: &str) -> Category {
        let mut c = Category::new(CategoryType::Creator, path, None, 0, name);
        c.category_id = id.into();
        c
    }

    #[test]
    fn detects_added_removed_and_modified() {
        let before = vec![cat("1", "a", "A"), cat("2", "b", "B")];
        let mut moved = cat("1", "z", "A");
        moved.is_active = false;
        let after = vec![moved, cat("3", "c", "C")];

        let changes = diff_snapshots(&before, &after);
        let kinds: Vec<(HistoryChangeKind, &str)> =
            changes.iter().map(|c| (c.kind, c.path.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (HistoryChangeKind::Removed, "b"),
                (HistoryChangeKind::Added, "c"),
                (HistoryChangeKind::Modified, "z"),
            ]
        );
        assert_eq!(changes[2].fields, vec!["path", "is_active"]);
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let snapshot = vec![cat("1", "a", "A")];
        assert!(diff_snapshots(&snapshot, &snapshot).is_empty());
    }
}
