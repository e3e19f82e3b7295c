//! Состояние страницы редактора категорий.
//!
//! Рабочий набор из `contracts` хранится в одном сигнале; все правки идут
//! через него и остаются локальными до сохранения. Файлы изображений живут
//! отдельно (они не `Send`) и загружаются на сервер непосредственно перед
//! массовым сохранением.

use super::super::api::{self, HttpCategoryGateway};
use crate::shared::logger::log_client;
use crate::shared::modal_frame::confirm;
use crate::shared::toast::ToastService;
use contracts::domain::a001_category::hierarchy::max_depth;
use contracts::domain::a001_category::localization::get_name;
use contracts::domain::a001_category::tree::{
    collapse_all, expand_all, flatten_search, flatten_visible, reveal, toggle_expanded,
    visible_keys,
};
use contracts::domain::a001_category::{
    Category, CategoryType, CategoryWorkingSet, EditError, ReorderOptions, SaveError, TreeRow, ENGLISH,
};
use leptos::prelude::*;
use std::collections::{HashMap, HashSet};
use wasm_bindgen_futures::spawn_local;

/// Открытое модальное окно страницы
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerModal {
    Edit(String),
    Translations,
    Transfer,
    Statistics,
    History,
}

/// Куда бросают перетаскиваемую строку
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Перед строкой с этим ключом, на её уровне
    Before(String),
    /// Последним ребёнком строки с этим ключом
    Into(String),
    /// В конец списка, в корень
    End,
}

/// Позиция вставки для `move_category`: индекс в видимом списке без
/// перетаскиваемой строки
pub fn destination_index(visible: &[String], dragged: &str, target: &DropTarget) -> Option<usize> {
    let rest: Vec<&String> = visible.iter().filter(|k| k.as_str() != dragged).collect();
    match target {
        DropTarget::Before(key) => rest.iter().position(|k| k.as_str() == key),
        DropTarget::End => Some(rest.len()),
        DropTarget::Into(_) => None,
    }
}

#[derive(Clone, Copy)]
pub struct CategoryManagerVm {
    pub category_type: RwSignal<CategoryType>,
    pub working: RwSignal<CategoryWorkingSet>,
    pub expanded: RwSignal<HashSet<String>>,
    pub search: RwSignal<String>,
    /// Язык, на котором показываются названия в дереве
    pub language: RwSignal<String>,
    pub loading: RwSignal<bool>,
    pub saving: RwSignal<bool>,
    pub validation_errors: RwSignal<Vec<String>>,
    pub change_description: RwSignal<String>,
    pub modal: RwSignal<Option<ManagerModal>>,
    pub dragged: RwSignal<Option<String>>,
    pub drop_target: RwSignal<Option<DropTarget>>,
    /// Подписанные URL сохранённых изображений: путь в хранилище → URL
    pub image_urls: RwSignal<HashMap<String, String>>,
    /// Object URL выбранных, но ещё не загруженных файлов: ключ категории → URL
    pub previews: RwSignal<HashMap<String, String>>,
    pending_files: StoredValue<HashMap<String, web_sys::File>, LocalStorage>,
    toasts: ToastService,
}

impl CategoryManagerVm {
    pub fn new(toasts: ToastService) -> Self {
        Self {
            category_type: RwSignal::new(CategoryType::default()),
            working: RwSignal::new(CategoryWorkingSet::from_server(
                CategoryType::default(),
                Vec::new(),
            )),
            expanded: RwSignal::new(HashSet::new()),
            search: RwSignal::new(String::new()),
            language: RwSignal::new(ENGLISH.to_string()),
            loading: RwSignal::new(false),
            saving: RwSignal::new(false),
            validation_errors: RwSignal::new(Vec::new()),
            change_description: RwSignal::new(String::new()),
            modal: RwSignal::new(None),
            dragged: RwSignal::new(None),
            drop_target: RwSignal::new(None),
            image_urls: RwSignal::new(HashMap::new()),
            previews: RwSignal::new(HashMap::new()),
            pending_files: StoredValue::new_local(HashMap::new()),
            toasts,
        }
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    pub fn is_searching(&self) -> bool {
        !self.search.get().trim().is_empty()
    }

    /// Строки дерева в порядке отображения
    pub fn rows(&self) -> Vec<TreeRow> {
        let query = self.search.get();
        let language = self.language.get();
        let expanded = self.expanded.get();
        self.working.with(|w| {
            if query.trim().is_empty() {
                flatten_visible(w.items(), &expanded, None)
            } else {
                flatten_search(w.items(), &query, &language)
            }
        })
    }

    /// Пока идёт сохранение, рабочий набор не меняется: ответ сервера
    /// заменит его целиком
    pub fn is_locked(&self) -> bool {
        self.saving.get_untracked()
    }

    /// Перетаскивание возможно только по настоящему порядку дерева
    pub fn drag_enabled(&self) -> bool {
        !self.is_searching() && !self.saving.get()
    }

    pub fn dirty_count(&self) -> usize {
        self.working.with(|w| w.dirty_count())
    }

    pub fn has_changes(&self) -> bool {
        self.working.with(|w| w.has_changes())
    }

    fn reorder_options(&self) -> ReorderOptions {
        ReorderOptions {
            max_depth: Some(self.working.with_untracked(|w| max_depth(w.items()))),
        }
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    pub fn load(&self) {
        let vm = *self;
        let category_type = self.category_type.get_untracked();
        self.loading.set(true);
        spawn_local(async move {
            match CategoryWorkingSet::load(&HttpCategoryGateway, category_type).await {
                Ok(working) => {
                    vm.replace_working(working);
                    vm.refresh_image_urls();
                }
                Err(e) => vm.toasts.error(format!("Failed to load categories: {}", e)),
            }
            vm.loading.set(false);
        });
    }

    fn replace_working(&self, working: CategoryWorkingSet) {
        let expanded = expand_all(working.items());
        self.working.set(working);
        self.expanded.set(expanded);
        self.validation_errors.set(Vec::new());
        self.clear_pending_files();
    }

    pub fn refresh_image_urls(&self) {
        let vm = *self;
        let paths: Vec<String> = self.working.with_untracked(|w| {
            w.items()
                .iter()
                .filter_map(|i| i.category.image_id.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect()
        });
        spawn_local(async move {
            let urls = api::fetch_image_urls(paths).await;
            vm.image_urls.set(urls);
        });
    }

    /// Смена типа дерева; несохранённые правки теряются только с согласия
    pub fn switch_type(&self, category_type: CategoryType) {
        if self.is_locked() || category_type == self.category_type.get_untracked() {
            return;
        }
        if self.working.with_untracked(|w| w.has_changes())
            && !confirm("Discard unsaved changes and switch the category type?")
        {
            return;
        }
        self.category_type.set(category_type);
        self.search.set(String::new());
        self.load();
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Применяет правку к рабочему набору; ошибка показывается уведомлением
    pub fn mutate<T>(
        &self,
        edit: impl FnOnce(&mut CategoryWorkingSet) -> Result<T, EditError>,
    ) -> Option<T> {
        if self.is_locked() {
            log::debug!("edit ignored while saving");
            return None;
        }
        let result = self.working.try_update(edit)?;
        match result {
            Ok(value) => {
                self.validation_errors.set(Vec::new());
                Some(value)
            }
            Err(e) => {
                self.toasts.error(e.to_string());
                None
            }
        }
    }

    pub fn add(&self, parent_key: Option<String>) {
        if let Some(key) = self.mutate(|w| w.add_category(parent_key.as_deref())) {
            self.expanded.update(|expanded| {
                self.working
                    .with_untracked(|w| reveal(w.items(), expanded, &key));
            });
            self.modal.set(Some(ManagerModal::Edit(key)));
        }
    }

    pub fn delete(&self, key: &str) {
        if self.is_locked() {
            return;
        }
        let name = self.working.with_untracked(|w| {
            w.get(key)
                .map(|i| get_name(&i.category, ENGLISH).to_string())
                .unwrap_or_default()
        });
        if !confirm(&format!("Delete \"{}\"?", name)) {
            return;
        }
        if self.mutate(|w| w.delete_category(key)).is_some() {
            self.forget_file(key);
        }
    }

    pub fn toggle(&self, key: &str) {
        self.expanded.update(|expanded| toggle_expanded(expanded, key));
    }

    pub fn expand_all(&self) {
        let all = self.working.with_untracked(|w| expand_all(w.items()));
        self.expanded.set(all);
    }

    pub fn collapse_all(&self) {
        self.expanded.update(collapse_all);
    }

    pub fn set_active(&self, key: &str, is_active: bool) {
        self.mutate(|w| w.set_active(key, is_active));
    }

    // ------------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------------

    pub fn start_drag(&self, key: &str) {
        self.dragged.set(Some(key.to_string()));
    }

    pub fn end_drag(&self) {
        self.dragged.set(None);
        self.drop_target.set(None);
    }

    pub fn drop_on(&self, target: DropTarget) {
        let Some(dragged) = self.dragged.get_untracked() else {
            return;
        };
        self.end_drag();
        if self.is_locked() {
            return;
        }
        if matches!(&target, DropTarget::Before(key) | DropTarget::Into(key) if *key == dragged) {
            return;
        }

        let options = self.reorder_options();
        let moved = match &target {
            DropTarget::Into(parent) => {
                let parent = parent.clone();
                let moved = self.mutate(|w| w.move_into(&dragged, &parent, options));
                if moved.is_some() {
                    self.expanded.update(|e| {
                        e.insert(parent);
                    });
                }
                moved
            }
            _ => {
                let visible = visible_keys(&self.rows_untracked());
                match destination_index(&visible, &dragged, &target) {
                    Some(destination) => {
                        self.mutate(|w| w.move_category(&visible, &dragged, destination, options))
                    }
                    None => None,
                }
            }
        };
        if moved.is_some() {
            log::debug!("moved category {}", dragged);
        }
    }

    fn rows_untracked(&self) -> Vec<TreeRow> {
        untrack(|| self.rows())
    }

    // ------------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------------

    /// Запоминает выбранный файл до сохранения и готовит превью
    pub fn stage_file(&self, key: &str, file: web_sys::File) {
        self.forget_file(key);
        if let Ok(url) = web_sys::Url::create_object_url_with_blob(&file) {
            self.previews.update(|p| {
                p.insert(key.to_string(), url);
            });
        }
        self.pending_files.update_value(|files| {
            files.insert(key.to_string(), file);
        });
    }

    pub fn forget_file(&self, key: &str) {
        self.pending_files.update_value(|files| {
            files.remove(key);
        });
        if let Some(url) = self.previews.try_update(|p| p.remove(key)).flatten() {
            let _ = web_sys::Url::revoke_object_url(&url);
        }
    }

    fn clear_pending_files(&self) {
        self.pending_files.update_value(|files| files.clear());
        let urls = self
            .previews
            .try_update(std::mem::take)
            .unwrap_or_default();
        for url in urls.values() {
            let _ = web_sys::Url::revoke_object_url(url);
        }
    }

    /// URL для показа изображения категории: превью выбранного файла или
    /// подписанный URL сохранённого
    pub fn image_url(&self, key: &str, image_id: Option<&str>) -> Option<String> {
        if let Some(preview) = self.previews.with(|p| p.get(key).cloned()) {
            return Some(preview);
        }
        image_id.and_then(|id| self.image_urls.with(|urls| urls.get(id).cloned()))
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Проверка, загрузка выбранных файлов и массовое сохранение.
    /// Пока сервер не ответил успехом, локальное состояние не меняется.
    pub fn save(&self) {
        if self.saving.get_untracked() {
            return;
        }
        let mut working = self.working.get_untracked();
        if let Err(errors) = working.validate() {
            self.validation_errors.set(errors);
            self.toasts.error("Fix validation errors before saving");
            return;
        }

        let vm = *self;
        let description = self.change_description.get_untracked();
        let files: Vec<(String, web_sys::File)> = self
            .pending_files
            .with_value(|f| f.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        self.saving.set(true);

        spawn_local(async move {
            for (key, file) in files {
                if working.get(&key).is_none() {
                    continue;
                }
                match api::upload_image(&file).await {
                    Ok(image_id) => {
                        if let Err(e) = working.set_image(&key, Some(image_id)) {
                            log::warn!("uploaded image for missing category {}: {}", key, e);
                        }
                    }
                    Err(e) => {
                        vm.toasts.error(format!("Image upload failed: {}", e));
                        vm.saving.set(false);
                        return;
                    }
                }
            }

            match working.save(&HttpCategoryGateway, &description).await {
                Ok(response) => {
                    let count = response.categories.len();
                    vm.replace_working(working);
                    vm.change_description.set(String::new());
                    vm.refresh_image_urls();
                    vm.toasts.success(format!("Saved {} categories", count));
                    log_client(
                        "category",
                        format!("bulk save #{} ({} categories)", response.history_id, count),
                    );
                }
                Err(SaveError::Validation(errors)) => {
                    vm.validation_errors.set(errors);
                    vm.toasts.error("Fix validation errors before saving");
                }
                Err(SaveError::Api(e)) => vm.toasts.error(format!("Save failed: {}", e)),
            }
            vm.saving.set(false);
        });
    }

    pub fn discard(&self) {
        if self.is_locked() || !confirm("Discard all unsaved changes?") {
            return;
        }
        self.working.update(|w| w.discard());
        self.validation_errors.set(Vec::new());
        self.clear_pending_files();
    }

    /// Дерево после восстановления из истории
    pub fn apply_server_state(&self, categories: Vec<Category>) {
        let mut working = self.working.get_untracked();
        working.reset(categories);
        self.replace_working(working);
        self.refresh_image_urls();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn destination_skips_the_dragged_row() {
        let visible = keys(&["a", "a.b", "c", "d"]);
        assert_eq!(
            destination_index(&visible, "a.b", &DropTarget::Before("d".into())),
            Some(2)
        );
        assert_eq!(
            destination_index(&visible, "d", &DropTarget::Before("a".into())),
            Some(0)
        );
        assert_eq!(destination_index(&visible, "a", &DropTarget::End), Some(3));
    }

    #[test]
    fn edits_are_ignored_while_saving() {
        let vm = CategoryManagerVm::new(ToastService::new());
        vm.saving.set(true);
        assert!(vm.mutate(|w| w.add_category(None)).is_none());
        assert!(!vm.has_changes());
        assert!(!vm.drag_enabled());

        vm.saving.set(false);
        assert!(vm.drag_enabled());
        let key = vm.mutate(|w| w.add_category(None)).unwrap();
        assert!(vm.working.with_untracked(|w| w.get(&key).is_some()));
        assert!(vm.has_changes());
    }

    #[test]
    fn destination_for_unknown_or_nested_targets() {
        let visible = keys(&["a", "b"]);
        assert_eq!(
            destination_index(&visible, "a", &DropTarget::Before("zzz".into())),
            None
        );
        assert_eq!(
            destination_index(&visible, "a", &DropTarget::Into("b".into())),
            None
        );
    }
}
