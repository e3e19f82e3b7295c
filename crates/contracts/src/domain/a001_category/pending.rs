use super::aggregate::{Category, CategoryLocalization, ENGLISH};
use super::localization::set_translation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Намерение изменить изображение. Сам файл хранит UI до сохранения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageChange {
    #[default]
    Keep,
    Remove,
    Replace { file_name: String },
}

/// Изменения, накопленные в модальном окне редактирования и ещё не
/// перенесённые в рабочий набор.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingChanges {
    pub is_active: Option<bool>,
    pub localization_updates: BTreeMap<String, CategoryLocalization>,
    pub localization_removals: BTreeSet<String>,
    /// `Some(None)` снимает иконку
    pub icon: Option<Option<String>>,
    pub image: ImageChange,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.is_active.is_none()
            && self.localization_updates.is_empty()
            && self.localization_removals.is_empty()
            && self.icon.is_none()
            && self.image == ImageChange::Keep
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = Some(is_active);
    }

    pub fn stage_localization(&mut self, localization: CategoryLocalization) {
        self.localization_removals
            .remove(&localization.language_code);
        self.localization_updates
            .insert(localization.language_code.clone(), localization);
    }

    pub fn stage_removal(&mut self, language_code: &str) {
        if language_code == ENGLISH {
            return;
        }
        self.localization_updates.remove(language_code);
        self.localization_removals.insert(language_code.to_string());
    }

    pub fn stage_icon(&mut self, icon: Option<String>) {
        self.icon = Some(icon);
    }

    pub fn stage_image(&mut self, image: ImageChange) {
        self.image = image;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Категория после применения изменений. `Replace` не трогает `image_id`:
    /// идентификатор появится только после загрузки файла.
    pub fn apply_to(&self, category: &Category) -> Category {
        let mut updated = category.clone();
        if let Some(is_active) = self.is_active {
            updated.is_active = is_active;
        }
        for localization in self.localization_updates.values() {
            set_translation(&mut updated, localization.clone());
        }
        updated
            .localizations
            .retain(|l| !self.localization_removals.contains(&l.language_code));
        if let Some(icon) = &self.icon {
            updated.icon_name = icon.clone();
        }
        if self.image == ImageChange::Remove {
            updated.image_id = None;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::CategoryType;
    use crate::domain::a001_category::localization::get_name;

    #[test]
    fn empty_pending_changes_nothing() {
        let cat = Category::new(CategoryType::Creator, "art", None, 1, "Art");
        let pending = PendingChanges::new();
        assert!(pending.is_empty());
        assert_eq!(pending.apply_to(&cat), cat);
    }

    #[test]
    fn staged_changes_are_applied_together() {
        let mut cat = Category::new(CategoryType::Creator, "art", None, 1, "Art");
        cat.image_id = Some("images/art.png".into());
        cat.localizations.push(CategoryLocalization::new("de", "Kunst"));

        let mut pending = PendingChanges::new();
        pending.set_active(false);
        pending.stage_localization(CategoryLocalization::new("en", "Fine Art"));
        pending.stage_removal("de");
        pending.stage_removal("en");
        pending.stage_icon(Some("star".into()));
        pending.stage_image(ImageChange::Remove);
        assert!(!pending.is_empty());

        let updated = pending.apply_to(&cat);
        assert!(!updated.is_active);
        assert_eq!(get_name(&updated, "en"), "Fine Art");
        assert_eq!(get_name(&updated, "de"), "Fine Art");
        assert_eq!(updated.localizations.len(), 1);
        assert_eq!(updated.icon_name.as_deref(), Some("star"));
        assert_eq!(updated.image_id, None);
    }

    #[test]
    fn restaging_a_removed_language_cancels_the_removal() {
        let mut pending = PendingChanges::new();
        pending.stage_removal("fr");
        pending.stage_localization(CategoryLocalization::new("fr", "Art"));
        assert!(pending.localization_removals.is_empty());
        assert_eq!(pending.localization_updates.len(), 1);
    }
}
