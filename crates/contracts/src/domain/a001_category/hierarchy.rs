//! Чистые функции над плоским списком категорий с материализованными путями.
//!
//! Работают с любым типом, реализующим [`HierarchyNode`], поэтому одни и те же
//! функции используются и для серверных записей, и для черновиков редактора.

use super::aggregate::Category;
use std::collections::{BTreeMap, HashSet};

/// Минимальная глубина, которую дерево показывает даже для плоских каталогов
pub const MIN_DISPLAY_DEPTH: i32 = 3;

pub trait HierarchyNode {
    fn node_path(&self) -> &str;
    fn node_parent_path(&self) -> Option<&str>;
    fn node_level(&self) -> i32;
    fn node_display_order(&self) -> i32;
}

impl HierarchyNode for Category {
    fn node_path(&self) -> &str {
        &self.path
    }

    fn node_parent_path(&self) -> Option<&str> {
        self.parent_path.as_deref()
    }

    fn node_level(&self) -> i32 {
        self.level
    }

    fn node_display_order(&self) -> i32 {
        self.display_order
    }
}

/// Все записи, у которых `parent_path` равен `parent_path`. Порядок не задан.
pub fn get_children<'a, T: HierarchyNode>(all: &'a [T], parent_path: &str) -> Vec<&'a T> {
    all.iter()
        .filter(|c| c.node_parent_path() == Some(parent_path))
        .collect()
}

/// Корневые записи (без родителя)
pub fn get_roots<T: HierarchyNode>(all: &[T]) -> Vec<&T> {
    all.iter().filter(|c| c.node_parent_path().is_none()).collect()
}

/// Соседи по родителю: корни для `None`, иначе дети `parent_path`
pub fn get_siblings<'a, T: HierarchyNode>(all: &'a [T], parent_path: Option<&str>) -> Vec<&'a T> {
    match parent_path {
        Some(parent) => get_children(all, parent),
        None => get_roots(all),
    }
}

pub fn max_depth<T: HierarchyNode>(items: &[T]) -> i32 {
    items
        .iter()
        .map(|c| c.node_level())
        .max()
        .unwrap_or(0)
        .max(MIN_DISPLAY_DEPTH)
}

/// Одна ошибка на каждый путь, встречающийся больше одного раза
pub fn duplicate_path_check<T: HierarchyNode>(items: &[T]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item.node_path()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(path, count)| format!("Duplicate path \"{}\" ({} categories)", path, count))
        .collect()
}

/// Одна ошибка на каждую запись, чей `parent_path` не указывает на существующий путь
pub fn missing_parent_check<T: HierarchyNode>(items: &[T]) -> Vec<String> {
    let paths: HashSet<&str> = items.iter().map(|c| c.node_path()).collect();
    items
        .iter()
        .filter_map(|c| {
            let parent = c.node_parent_path()?;
            (!paths.contains(parent)).then(|| {
                format!(
                    "Category \"{}\" refers to missing parent \"{}\"",
                    c.node_path(),
                    parent
                )
            })
        })
        .collect()
}

pub fn sort_by_display_order<T: HierarchyNode>(items: &mut [&T]) {
    items.sort_by(|a, b| {
        a.node_display_order()
            .cmp(&b.node_display_order())
            .then_with(|| a.node_path().cmp(b.node_path()))
    });
}

// ============================================================================
// Path helpers
// ============================================================================

pub fn level_from_path(path: &str) -> i32 {
    if path.is_empty() {
        0
    } else {
        path.split('.').count() as i32
    }
}

pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

pub fn join_path(parent: Option<&str>, segment: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}.{}", parent, segment),
        _ => segment.to_string(),
    }
}

/// `true`, если `path` лежит строго внутри поддерева `ancestor`
pub fn is_descendant_path(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::CategoryType;

    fn cat(path: &str, parent: Option<&str>, level: i32, order: i32) -> Category {
        let mut c = Category::new(CategoryType::Consumer, path, parent.map(String::from), order, path);
        c.level = level;
        c
    }

    fn sample() -> Vec<Category> {
        vec![
            cat("a", None, 1, 1),
            cat("a.b", Some("a"), 2, 1),
            cat("c", None, 1, 2),
        ]
    }

    #[test]
    fn children_are_exactly_the_records_with_that_parent() {
        let list = sample();
        let children = get_children(&list, "a");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].path, "a.b");
        assert!(get_children(&list, "c").is_empty());
        assert!(get_children::<Category>(&[], "a").is_empty());
        assert_eq!(get_roots(&list).len(), 2);
    }

    #[test]
    fn max_depth_is_floored() {
        assert_eq!(max_depth(&sample()), MIN_DISPLAY_DEPTH);
        assert_eq!(max_depth::<Category>(&[]), MIN_DISPLAY_DEPTH);
        let deep = vec![cat("a.b.c.d", Some("a.b.c"), 4, 0)];
        assert_eq!(max_depth(&deep), 4);
    }

    #[test]
    fn duplicates_reported_once_per_path() {
        let mut list = sample();
        list.push(cat("a.b", Some("a"), 2, 5));
        list.push(cat("a.b", Some("a"), 2, 6));
        let errors = duplicate_path_check(&list);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("a.b"));
        assert!(duplicate_path_check(&sample()).is_empty());
    }

    #[test]
    fn dangling_parents_are_reported() {
        let mut list = sample();
        list.push(cat("x.y", Some("x"), 2, 0));
        let errors = missing_parent_check(&list);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("x.y"));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(level_from_path("a.b.c"), 3);
        assert_eq!(level_from_path(""), 0);
        assert_eq!(last_segment("a.b.c"), "c");
        assert_eq!(last_segment("root"), "root");
        assert_eq!(join_path(Some("a.b"), "c"), "a.b.c");
        assert_eq!(join_path(None, "c"), "c");
        assert!(is_descendant_path("a.b", "a"));
        assert!(!is_descendant_path("ab", "a"));
        assert!(!is_descendant_path("a", "a"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  New Category 2 "), "new-category-2");
        assert_eq!(slugify("Café"), "café");
        assert_eq!(slugify("---"), "");
    }
}
