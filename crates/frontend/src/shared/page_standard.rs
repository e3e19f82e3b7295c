//! Page category constants for tab pages.
//!
//! Every page rendered inside a tab declares:
//!   - HTML `id` in the format `{entity}--{category}` (e.g. `"a001_category--editor"`)
//!   - `data-page-category` with one of the constants below
//!
//! The `--` separator keeps the entity name searchable: the id copied from
//! the DOM inspector leads straight to `domain/{entity}/`.

/// List of records: table with filters and pages.
pub const PAGE_CAT_LIST: &str = "list";

/// Detail / edit form for a single record.
pub const PAGE_CAT_DETAIL: &str = "detail";

/// Full-page editor with its own layout (category tree).
pub const PAGE_CAT_EDITOR: &str = "editor";

/// System administration page.
pub const PAGE_CAT_SYSTEM: &str = "system";

pub const ALL_CATEGORIES: &[&str] = &[
    PAGE_CAT_LIST,
    PAGE_CAT_DETAIL,
    PAGE_CAT_EDITOR,
    PAGE_CAT_SYSTEM,
];

/// Validate that a page id matches the `{entity}--{category}` format.
pub fn is_valid_page_id(id: &str) -> bool {
    match id.split_once("--") {
        Some((entity, category)) => !entity.is_empty() && !category.is_empty(),
        None => false,
    }
}

pub fn is_known_category(cat: &str) -> bool {
    ALL_CATEGORIES.contains(&cat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids() {
        assert!(is_valid_page_id("a001_category--editor"));
        assert!(!is_valid_page_id("a001_category"));
        assert!(!is_valid_page_id("--list"));
        assert!(is_known_category(PAGE_CAT_SYSTEM));
        assert!(!is_known_category("dashboard"));
    }
}
