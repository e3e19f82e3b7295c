//! Рабочий набор редактора категорий.
//!
//! Все изменения копятся локально и уходят на сервер одним массовым
//! сохранением. Исходный снимок хранится для отмены.

use super::aggregate::{Category, CategoryLocalization, CategoryType, ENGLISH};
use super::dto::{BulkUpdateRequest, BulkUpdateResponse};
use super::hierarchy::{
    duplicate_path_check, get_children, get_siblings, join_path, missing_parent_check,
    HierarchyNode,
};
use super::localization::{get_name, remove_translation, set_translation};
use super::pending::{ImageChange, PendingChanges};
use super::reorder::{self, ReorderError, ReorderOptions};
use super::transfer::{plan_import, ImportMode, ImportSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub const PLACEHOLDER_NAME: &str = "New Category";

const TEMP_ID_PREFIX: &str = "tmp-";

pub fn make_temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4().simple())
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Короткий сегмент пути для новой категории: 8 hex-символов
fn generate_segment() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

// ============================================================================
// Editing envelope
// ============================================================================

/// Категория с клиентскими флагами редактора. На сервер уходит только
/// `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableCategory {
    pub category: Category,
    pub temp_id: String,
    pub is_new: bool,
    pub is_dirty: bool,
    pub has_image_change: bool,
}

impl EditableCategory {
    pub fn from_server(category: Category) -> Self {
        let temp_id = if category.is_saved() {
            category.category_id.clone()
        } else {
            make_temp_id()
        };
        Self {
            category,
            temp_id,
            is_new: false,
            is_dirty: false,
            has_image_change: false,
        }
    }

    pub fn new_draft(mut category: Category) -> Self {
        category.category_id = String::new();
        Self {
            category,
            temp_id: make_temp_id(),
            is_new: true,
            is_dirty: true,
            has_image_change: false,
        }
    }

    /// Настоящий ID, если он есть, иначе временный
    pub fn key(&self) -> &str {
        if self.category.is_saved() {
            &self.category.category_id
        } else {
            &self.temp_id
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn into_category(self) -> Category {
        self.category
    }
}

impl HierarchyNode for EditableCategory {
    fn node_path(&self) -> &str {
        &self.category.path
    }

    fn node_parent_path(&self) -> Option<&str> {
        self.category.parent_path.as_deref()
    }

    fn node_level(&self) -> i32 {
        self.category.level
    }

    fn node_display_order(&self) -> i32 {
        self.category.display_order
    }
}

// ============================================================================
// Gateway & errors
// ============================================================================

/// Доступ к серверному API категорий. Во фронтенде реализуется через HTTP,
/// в тестах - в памяти.
#[allow(async_fn_in_trait)]
pub trait CategoryGateway {
    async fn fetch_all(&self, category_type: CategoryType) -> Result<Vec<Category>, String>;
    async fn bulk_update(&self, request: BulkUpdateRequest) -> Result<BulkUpdateResponse, String>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Category {0} not found")]
    NotFound(String),
    #[error("Cannot delete \"{name}\": it has {count} subcategories")]
    HasChildren { name: String, count: usize },
    #[error(transparent)]
    Reorder(#[from] ReorderError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Save failed: {0}")]
    Api(String),
}

// ============================================================================
// Working set
// ============================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWorkingSet {
    category_type: CategoryType,
    items: Vec<EditableCategory>,
    original: Vec<EditableCategory>,
    deleted_ids: Vec<String>,
}

impl CategoryWorkingSet {
    pub fn from_server(category_type: CategoryType, categories: Vec<Category>) -> Self {
        let items: Vec<EditableCategory> = categories
            .into_iter()
            .map(EditableCategory::from_server)
            .collect();
        Self {
            category_type,
            original: items.clone(),
            items,
            deleted_ids: Vec::new(),
        }
    }

    pub async fn load<G: CategoryGateway>(
        gateway: &G,
        category_type: CategoryType,
    ) -> Result<Self, String> {
        let categories = gateway.fetch_all(category_type).await?;
        Ok(Self::from_server(category_type, categories))
    }

    pub fn category_type(&self) -> CategoryType {
        self.category_type
    }

    pub fn items(&self) -> &[EditableCategory] {
        &self.items
    }

    pub fn categories(&self) -> Vec<Category> {
        self.items.iter().map(|i| i.category.clone()).collect()
    }

    pub fn deleted_ids(&self) -> &[String] {
        &self.deleted_ids
    }

    pub fn get(&self, key: &str) -> Option<&EditableCategory> {
        self.items.iter().find(|i| i.key() == key)
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut EditableCategory, EditError> {
        self.items
            .iter_mut()
            .find(|i| i.key() == key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))
    }

    pub fn has_changes(&self) -> bool {
        !self.deleted_ids.is_empty() || self.items.iter().any(|i| i.is_dirty)
    }

    /// Изменённые и новые строки плюс удалённые
    pub fn dirty_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_dirty).count() + self.deleted_ids.len()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Добавляет категорию в корень или под `parent_key`, возвращает её ключ
    pub fn add_category(&mut self, parent_key: Option<&str>) -> Result<String, EditError> {
        let (parent_path, level) = match parent_key {
            Some(key) => {
                let parent = self
                    .get(key)
                    .ok_or_else(|| EditError::NotFound(key.to_string()))?;
                (Some(parent.category.path.clone()), parent.category.level + 1)
            }
            None => (None, 1),
        };

        let siblings = get_siblings(&self.items, parent_path.as_deref());
        let display_order = siblings
            .iter()
            .map(|s| s.category.display_order)
            .max()
            .map_or(1, |max| max + 1);

        let sibling_names: Vec<String> = siblings
            .iter()
            .map(|s| get_name(&s.category, ENGLISH).trim().to_lowercase())
            .collect();
        let name = (1..)
            .map(|n| match n {
                1 => PLACEHOLDER_NAME.to_string(),
                n => format!("{} {}", PLACEHOLDER_NAME, n),
            })
            .find(|candidate| !sibling_names.contains(&candidate.to_lowercase()))
            .unwrap_or_else(|| PLACEHOLDER_NAME.to_string());

        let path = loop {
            let candidate = join_path(parent_path.as_deref(), &generate_segment());
            if !self.items.iter().any(|i| i.category.path == candidate) {
                break candidate;
            }
        };

        let mut category = Category::new(self.category_type, path, parent_path, display_order, &name);
        category.level = level;
        let draft = EditableCategory::new_draft(category);
        let key = draft.key().to_string();
        self.items.push(draft);
        Ok(key)
    }

    pub fn delete_category(&mut self, key: &str) -> Result<(), EditError> {
        let index = self
            .items
            .iter()
            .position(|i| i.key() == key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))?;

        let item = &self.items[index];
        let count = get_children(&self.items, &item.category.path).len();
        if count > 0 {
            return Err(EditError::HasChildren {
                name: get_name(&item.category, ENGLISH).to_string(),
                count,
            });
        }

        let removed = self.items.remove(index);
        if !removed.is_new && removed.category.is_saved() {
            self.deleted_ids.push(removed.category.category_id);
        }
        Ok(())
    }

    pub fn update_category(
        &mut self,
        key: &str,
        update: impl FnOnce(&mut Category),
    ) -> Result<(), EditError> {
        let item = self.get_mut(key)?;
        update(&mut item.category);
        item.mark_dirty();
        Ok(())
    }

    pub fn set_translation(
        &mut self,
        key: &str,
        localization: CategoryLocalization,
    ) -> Result<(), EditError> {
        self.update_category(key, |c| set_translation(c, localization))
    }

    pub fn remove_translation(&mut self, key: &str, language_code: &str) -> Result<(), EditError> {
        let item = self.get_mut(key)?;
        let updated = remove_translation(&item.category, language_code);
        if updated != item.category {
            item.category = updated;
            item.mark_dirty();
        }
        Ok(())
    }

    pub fn set_icon(&mut self, key: &str, icon_name: Option<String>) -> Result<(), EditError> {
        self.update_category(key, |c| c.icon_name = icon_name)
    }

    pub fn set_image(&mut self, key: &str, image_id: Option<String>) -> Result<(), EditError> {
        let item = self.get_mut(key)?;
        item.category.image_id = image_id;
        item.has_image_change = true;
        item.mark_dirty();
        Ok(())
    }

    pub fn set_active(&mut self, key: &str, is_active: bool) -> Result<(), EditError> {
        self.update_category(key, |c| c.is_active = is_active)
    }

    /// Переносит изменения из модального окна. `false`, если переносить нечего.
    pub fn apply_pending(&mut self, key: &str, pending: &PendingChanges) -> Result<bool, EditError> {
        let item = self.get_mut(key)?;
        if pending.is_empty() {
            return Ok(false);
        }
        item.category = pending.apply_to(&item.category);
        if pending.image != ImageChange::Keep {
            item.has_image_change = true;
        }
        item.mark_dirty();
        Ok(true)
    }

    pub fn move_category(
        &mut self,
        visible_keys: &[String],
        dragged_key: &str,
        destination: usize,
        options: ReorderOptions,
    ) -> Result<(), EditError> {
        self.items =
            reorder::move_category(&self.items, visible_keys, dragged_key, destination, options)?;
        Ok(())
    }

    pub fn move_into(
        &mut self,
        dragged_key: &str,
        parent_key: &str,
        options: ReorderOptions,
    ) -> Result<(), EditError> {
        self.items = reorder::move_into(&self.items, dragged_key, parent_key, options)?;
        Ok(())
    }

    /// Ставит импортированные категории в рабочий набор. На сервер ничего не
    /// уходит до сохранения.
    pub fn stage_import(&mut self, imported: Vec<Category>, mode: ImportMode) -> ImportSummary {
        let plan = plan_import(&self.categories(), imported, mode);
        let mut summary = ImportSummary::default();

        for path in &plan.remove_paths {
            if let Some(index) = self.items.iter().position(|i| &i.category.path == path) {
                let removed = self.items.remove(index);
                if !removed.is_new && removed.category.is_saved() {
                    self.deleted_ids.push(removed.category.category_id);
                }
                summary.removed += 1;
            }
        }

        for mut category in plan.upserts {
            category.category_type = self.category_type;
            match self
                .items
                .iter_mut()
                .find(|i| i.category.path == category.path)
            {
                Some(existing) => {
                    category.category_id = existing.category.category_id.clone();
                    if existing.category != category {
                        existing.has_image_change |= existing.category.image_id != category.image_id;
                        existing.category = category;
                        existing.mark_dirty();
                        summary.updated += 1;
                    }
                }
                None => {
                    self.items.push(EditableCategory::new_draft(category));
                    summary.added += 1;
                }
            }
        }

        summary
    }

    // ------------------------------------------------------------------------
    // Validation & persistence
    // ------------------------------------------------------------------------

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = duplicate_path_check(&self.items);
        errors.extend(missing_parent_check(&self.items));

        let mut names: HashMap<(Option<&str>, String), usize> = HashMap::new();
        for item in &self.items {
            let name = get_name(&item.category, ENGLISH).trim();
            if item.category.localization(ENGLISH).is_none() || name.is_empty() {
                errors.push(format!(
                    "Category \"{}\" is missing an English name",
                    item.category.path
                ));
                continue;
            }
            *names
                .entry((item.category.parent_path.as_deref(), name.to_lowercase()))
                .or_default() += 1;
        }

        let mut duplicates: Vec<String> = names
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((parent, name), _)| {
                format!(
                    "Duplicate name \"{}\" under {}",
                    name,
                    parent.map_or("the root".to_string(), |p| format!("\"{}\"", p))
                )
            })
            .collect();
        duplicates.sort();
        errors.extend(duplicates);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn build_bulk_update(&self, description: &str) -> Result<BulkUpdateRequest, Vec<String>> {
        self.validate()?;
        let change_description = match description.trim() {
            "" => format!("Updated {} categories", self.dirty_count()),
            text => text.to_string(),
        };
        Ok(BulkUpdateRequest {
            category_type: self.category_type,
            categories: self
                .items
                .iter()
                .cloned()
                .map(EditableCategory::into_category)
                .collect(),
            deleted_ids: self.deleted_ids.clone(),
            change_description,
        })
    }

    /// Валидирует и сохраняет весь набор. При ошибке локальное состояние не меняется.
    pub async fn save<G: CategoryGateway>(
        &mut self,
        gateway: &G,
        description: &str,
    ) -> Result<BulkUpdateResponse, SaveError> {
        let request = self
            .build_bulk_update(description)
            .map_err(SaveError::Validation)?;
        let response = gateway
            .bulk_update(request)
            .await
            .map_err(SaveError::Api)?;
        self.reset(response.categories.clone());
        Ok(response)
    }

    /// Заменяет набор данными сервера и делает их новым снимком
    pub fn reset(&mut self, categories: Vec<Category>) {
        *self = Self::from_server(self.category_type, categories);
    }

    pub fn discard(&mut self) {
        self.items = self.original.clone();
        self.deleted_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::hierarchy::get_children;
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn saved(path: &str, parent: Option<&str>, level: i32, order: i32) -> Category {
        let mut c = Category::new(CategoryType::Consumer, path, parent.map(String::from), order, path);
        c.category_id = format!("id-{}", path);
        c.level = level;
        c
    }

    fn sample() -> CategoryWorkingSet {
        CategoryWorkingSet::from_server(
            CategoryType::Consumer,
            vec![
                saved("a", None, 1, 1),
                saved("a.b", Some("a"), 2, 1),
                saved("c", None, 1, 2),
            ],
        )
    }

    #[derive(Default)]
    struct MemoryGateway {
        fail_with: Option<String>,
        requests: RefCell<Vec<BulkUpdateRequest>>,
    }

    impl CategoryGateway for MemoryGateway {
        async fn fetch_all(&self, category_type: CategoryType) -> Result<Vec<Category>, String> {
            let mut items = sample().categories();
            items.iter_mut().for_each(|c| c.category_type = category_type);
            Ok(items)
        }

        async fn bulk_update(&self, request: BulkUpdateRequest) -> Result<BulkUpdateResponse, String> {
            self.requests.borrow_mut().push(request.clone());
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let categories = request
                .categories
                .into_iter()
                .enumerate()
                .map(|(i, mut c)| {
                    if c.category_id.is_empty() {
                        c.category_id = format!("srv-{}", i);
                    }
                    c
                })
                .collect();
            Ok(BulkUpdateResponse {
                categories,
                history_id: 7,
            })
        }
    }

    #[test]
    fn add_child_without_siblings() {
        let mut set = sample();
        let key = set.add_category(Some("id-c")).unwrap();
        let added = set.get(&key).unwrap();
        assert!(is_temp_id(&key));
        assert!(added.is_new && added.is_dirty);
        assert_eq!(added.category.display_order, 1);
        assert_eq!(added.category.level, 2);
        assert_eq!(added.category.parent_path.as_deref(), Some("c"));
        let segment = added.category.path.strip_prefix("c.").unwrap();
        assert_eq!(segment.len(), 8);
        assert!(segment.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(get_name(&added.category, "en"), PLACEHOLDER_NAME);
        assert_eq!(added.category.localizations[0].slug, "new-category");
    }

    #[test]
    fn add_under_existing_siblings_uses_next_order_and_unique_name() {
        let mut set = sample();
        let first = set.add_category(None).unwrap();
        let second = set.add_category(None).unwrap();
        assert_eq!(set.get(&first).unwrap().category.display_order, 3);
        assert_eq!(set.get(&second).unwrap().category.display_order, 4);
        assert_eq!(
            get_name(&set.get(&second).unwrap().category, "en"),
            "New Category 2"
        );
        assert!(set.validate().is_ok());
    }

    #[test]
    fn add_under_unknown_parent_fails() {
        let mut set = sample();
        assert_eq!(
            set.add_category(Some("nope")),
            Err(EditError::NotFound("nope".into()))
        );
    }

    #[test]
    fn deleting_a_parent_is_rejected_and_changes_nothing() {
        let mut set = sample();
        let before = set.clone();
        let err = set.delete_category("id-a").unwrap_err();
        assert_eq!(
            err,
            EditError::HasChildren {
                name: "a".into(),
                count: 1
            }
        );
        assert_eq!(set, before);
    }

    #[test]
    fn deleting_saved_and_new_rows() {
        let mut set = sample();
        set.delete_category("id-c").unwrap();
        assert_eq!(set.deleted_ids(), ["id-c".to_string()]);

        let key = set.add_category(None).unwrap();
        set.delete_category(&key).unwrap();
        assert_eq!(set.deleted_ids().len(), 1);
        assert_eq!(set.items().len(), 2);
        assert!(set.has_changes());
    }

    #[test]
    fn edits_mark_rows_dirty() {
        let mut set = sample();
        assert!(!set.has_changes());
        set.set_translation("id-a", CategoryLocalization::new("fr", "A fr"))
            .unwrap();
        set.set_icon("id-c", Some("star".into())).unwrap();
        set.set_image("id-a.b", Some("images/x.png".into())).unwrap();
        assert_eq!(set.dirty_count(), 3);
        assert!(set.get("id-a.b").unwrap().has_image_change);

        // английский перевод не удаляется, строка остаётся чистой
        let mut clean = sample();
        clean.remove_translation("id-c", "en").unwrap();
        assert!(!clean.has_changes());
    }

    #[test]
    fn apply_pending_changes() {
        let mut set = sample();
        assert!(!set.apply_pending("id-c", &PendingChanges::new()).unwrap());

        let mut pending = PendingChanges::new();
        pending.set_active(false);
        pending.stage_image(ImageChange::Replace {
            file_name: "c.png".into(),
        });
        assert!(set.apply_pending("id-c", &pending).unwrap());
        let c = set.get("id-c").unwrap();
        assert!(!c.category.is_active);
        assert!(c.is_dirty && c.has_image_change);
    }

    #[test]
    fn discard_restores_snapshot() {
        let mut set = sample();
        let before = set.clone();
        set.add_category(Some("id-a")).unwrap();
        set.set_active("id-c", false).unwrap();
        set.delete_category("id-a.b").unwrap();
        let keys = vec!["id-a".to_string(), "id-c".to_string()];
        set.move_category(&keys, "id-c", 0, ReorderOptions::default())
            .unwrap();
        assert!(set.has_changes());

        set.discard();
        assert_eq!(set, before);
        assert!(!set.has_changes());
    }

    #[test]
    fn validation_reports_duplicates_and_missing_names() {
        let mut set = sample();
        set.update_category("id-c", |c| c.localizations[0].name = "A".into())
            .unwrap();
        let key = set.add_category(None).unwrap();
        set.update_category(&key, |c| c.localizations.clear()).unwrap();
        let errors = set.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("missing an English name")));
        assert!(errors.iter().any(|e| e.contains("Duplicate name \"a\"")));
    }

    #[test]
    fn invalid_set_is_not_sent() {
        let gateway = MemoryGateway::default();
        let mut set = sample();
        set.update_category("id-a.b", |c| c.path = "c".into()).unwrap();
        let before = set.clone();

        let result = block_on(set.save(&gateway, "broken"));
        assert!(matches!(result, Err(SaveError::Validation(_))));
        assert!(gateway.requests.borrow().is_empty());
        assert_eq!(set, before);
    }

    #[test]
    fn failed_save_keeps_local_state() {
        let gateway = MemoryGateway {
            fail_with: Some("boom".into()),
            ..Default::default()
        };
        let mut set = sample();
        set.set_active("id-a", false).unwrap();
        let before = set.clone();

        let result = block_on(set.save(&gateway, ""));
        assert_eq!(result, Err(SaveError::Api("boom".into())));
        assert_eq!(set, before);
    }

    #[test]
    fn successful_save_replaces_snapshot() {
        let gateway = MemoryGateway::default();
        let mut set = block_on(CategoryWorkingSet::load(&gateway, CategoryType::Brand)).unwrap();
        assert_eq!(set.category_type(), CategoryType::Brand);

        let key = set.add_category(Some("id-a")).unwrap();
        set.delete_category("id-c").unwrap();
        let response = block_on(set.save(&gateway, "")).unwrap();
        assert_eq!(response.history_id, 7);

        let sent = gateway.requests.borrow()[0].clone();
        assert_eq!(sent.deleted_ids, vec!["id-c".to_string()]);
        assert_eq!(sent.change_description, "Updated 2 categories");
        assert!(sent.categories.iter().any(|c| c.category_id.is_empty()));

        assert!(!set.has_changes());
        assert!(set.get(&key).is_none());
        assert!(set.items().iter().all(|i| i.category.is_saved()));
        assert_eq!(get_children(set.items(), "a").len(), 2);
    }
}
