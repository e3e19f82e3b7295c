//! Доступ к локализованным полям категории с откатом на английский.

use super::aggregate::{Category, CategoryLocalization, ENGLISH, SUPPORTED_LANGUAGES};

fn localized<'a>(
    category: &'a Category,
    language_code: &str,
    field: impl Fn(&'a CategoryLocalization) -> &'a str,
) -> &'a str {
    category
        .localization(language_code)
        .or_else(|| category.localization(ENGLISH))
        .map(field)
        .unwrap_or("")
}

/// Название на `language_code`, иначе английское, иначе пустая строка
pub fn get_name<'a>(category: &'a Category, language_code: &str) -> &'a str {
    localized(category, language_code, |l| l.name.as_str())
}

pub fn get_description<'a>(category: &'a Category, language_code: &str) -> &'a str {
    localized(category, language_code, |l| l.description.as_str())
}

pub fn get_slug<'a>(category: &'a Category, language_code: &str) -> &'a str {
    localized(category, language_code, |l| l.slug.as_str())
}

pub fn has_translation(category: &Category, language_code: &str) -> bool {
    category.localization(language_code).is_some()
}

/// Поддерживаемые языки без перевода, в порядке `SUPPORTED_LANGUAGES`
pub fn get_missing_translations(category: &Category) -> Vec<&'static str> {
    SUPPORTED_LANGUAGES
        .into_iter()
        .filter(|code| !has_translation(category, code))
        .collect()
}

/// Копия категории с добавленным или заменённым переводом
pub fn add_translation(category: &Category, localization: CategoryLocalization) -> Category {
    let mut updated = category.clone();
    set_translation(&mut updated, localization);
    updated
}

/// Копия категории без перевода. Английский удалить нельзя.
pub fn remove_translation(category: &Category, language_code: &str) -> Category {
    let mut updated = category.clone();
    if language_code != ENGLISH {
        updated
            .localizations
            .retain(|l| l.language_code != language_code);
    }
    updated
}

pub fn set_translation(category: &mut Category, localization: CategoryLocalization) {
    match category
        .localizations
        .iter_mut()
        .find(|l| l.language_code == localization.language_code)
    {
        Some(existing) => *existing = localization,
        None => category.localizations.push(localization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::CategoryType;

    fn shoes() -> Category {
        let mut c = Category::new(CategoryType::Consumer, "shoes", None, 1, "Shoes");
        c.localizations[0].description = "All shoes".into();
        set_translation(&mut c, CategoryLocalization::new("fr", "Chaussures"));
        c
    }

    #[test]
    fn name_falls_back_to_english_then_empty() {
        let c = shoes();
        assert_eq!(get_name(&c, "fr"), "Chaussures");
        assert_eq!(get_name(&c, "de"), "Shoes");
        assert_eq!(get_description(&c, "de"), "All shoes");
        assert_eq!(get_slug(&c, "fr"), "chaussures");

        let mut bare = c.clone();
        bare.localizations.clear();
        assert_eq!(get_name(&bare, "fr"), "");
        assert_eq!(get_slug(&bare, "en"), "");
    }

    #[test]
    fn missing_translations_follow_supported_order() {
        let missing = get_missing_translations(&shoes());
        assert_eq!(missing, vec!["es", "de", "it", "pt", "ja", "zh"]);
    }

    #[test]
    fn add_translation_replaces_same_language() {
        let c = shoes();
        let updated = add_translation(&c, CategoryLocalization::new("fr", "Souliers"));
        assert_eq!(updated.localizations.len(), 2);
        assert_eq!(get_name(&updated, "fr"), "Souliers");
        assert_eq!(get_name(&c, "fr"), "Chaussures");
    }

    #[test]
    fn english_cannot_be_removed() {
        let c = shoes();
        assert_eq!(remove_translation(&c, "en"), c);
        let without_fr = remove_translation(&c, "fr");
        assert!(!has_translation(&without_fr, "fr"));
        assert!(has_translation(&without_fr, "en"));
    }
}
