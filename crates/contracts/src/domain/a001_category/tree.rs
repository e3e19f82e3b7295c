//! Плоское представление дерева для отображения: только раскрытые ветки.

use super::editing::EditableCategory;
use super::hierarchy::{sort_by_display_order, HierarchyNode};
use super::localization::get_name;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub key: String,
    /// Отступ в дереве, с нуля
    pub depth: i32,
    pub has_children: bool,
    pub is_expanded: bool,
}

struct TreeIndex<'a> {
    roots: Vec<&'a EditableCategory>,
    children: HashMap<&'a str, Vec<&'a EditableCategory>>,
}

impl<'a> TreeIndex<'a> {
    fn build(items: &'a [EditableCategory]) -> Self {
        let paths: HashSet<&str> = items.iter().map(|c| c.node_path()).collect();
        let mut roots = Vec::new();
        let mut children: HashMap<&str, Vec<&EditableCategory>> = HashMap::new();
        for item in items {
            match item.node_parent_path() {
                Some(parent) if paths.contains(parent) => {
                    children.entry(parent).or_default().push(item)
                }
                // Без родителя или с потерянным родителем - показываем в корне
                _ => roots.push(item),
            }
        }
        for list in children.values_mut() {
            sort_by_display_order(list);
        }

        // Записи, недостижимые из корней, зациклены через parent_path
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&EditableCategory> = roots.clone();
        while let Some(node) = stack.pop() {
            if reachable.insert(node.node_path()) {
                if let Some(list) = children.get(node.node_path()) {
                    stack.extend(list.iter().copied());
                }
            }
        }
        roots.extend(items.iter().filter(|c| !reachable.contains(c.node_path())));
        sort_by_display_order(&mut roots);

        Self { roots, children }
    }

    fn children_of(&self, item: &EditableCategory) -> &[&'a EditableCategory] {
        self.children
            .get(item.node_path())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Видимые строки дерева в порядке отображения
pub fn flatten_visible(
    items: &[EditableCategory],
    expanded: &HashSet<String>,
    max_depth: Option<i32>,
) -> Vec<TreeRow> {
    let index = TreeIndex::build(items);
    let mut rows = Vec::with_capacity(items.len());
    let mut visited = HashSet::new();
    for root in &index.roots {
        push_rows(&index, root, 0, expanded, max_depth, &mut visited, &mut rows, None);
    }
    rows
}

/// Строки, совпадающие с поиском, вместе с их предками; всё раскрыто
pub fn flatten_search(items: &[EditableCategory], query: &str, language_code: &str) -> Vec<TreeRow> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let by_path: HashMap<&str, &EditableCategory> =
        items.iter().map(|c| (c.node_path(), c)).collect();
    let mut keep: HashSet<String> = HashSet::new();
    for item in items {
        let name = get_name(&item.category, language_code).to_lowercase();
        if !name.contains(&query) && !item.category.path.to_lowercase().contains(&query) {
            continue;
        }
        let mut current = Some(item);
        while let Some(node) = current {
            if !keep.insert(node.key().to_string()) {
                break;
            }
            current = node.node_parent_path().and_then(|p| by_path.get(p).copied());
        }
    }

    let index = TreeIndex::build(items);
    let mut rows = Vec::new();
    let mut visited = HashSet::new();
    for root in &index.roots {
        push_rows(&index, root, 0, &keep, None, &mut visited, &mut rows, Some(&keep));
    }
    rows
}

#[allow(clippy::too_many_arguments)]
fn push_rows(
    index: &TreeIndex<'_>,
    item: &EditableCategory,
    depth: i32,
    expanded: &HashSet<String>,
    max_depth: Option<i32>,
    visited: &mut HashSet<String>,
    rows: &mut Vec<TreeRow>,
    only: Option<&HashSet<String>>,
) {
    if max_depth.is_some_and(|max| depth >= max) {
        return;
    }
    if only.is_some_and(|keep| !keep.contains(item.key())) {
        return;
    }
    if !visited.insert(item.key().to_string()) {
        return;
    }

    let children = index.children_of(item);
    let is_expanded = expanded.contains(item.key());
    rows.push(TreeRow {
        key: item.key().to_string(),
        depth,
        has_children: !children.is_empty(),
        is_expanded,
    });

    if is_expanded {
        for child in children {
            push_rows(index, child, depth + 1, expanded, max_depth, visited, rows, only);
        }
    }
}

pub fn visible_keys(rows: &[TreeRow]) -> Vec<String> {
    rows.iter().map(|r| r.key.clone()).collect()
}

pub fn toggle_expanded(expanded: &mut HashSet<String>, key: &str) {
    if !expanded.remove(key) {
        expanded.insert(key.to_string());
    }
}

/// Ключи всех категорий, у которых есть дети
pub fn expand_all(items: &[EditableCategory]) -> HashSet<String> {
    let parents: HashSet<&str> = items.iter().filter_map(|c| c.node_parent_path()).collect();
    items
        .iter()
        .filter(|c| parents.contains(c.node_path()))
        .map(|c| c.key().to_string())
        .collect()
}

pub fn collapse_all(expanded: &mut HashSet<String>) {
    expanded.clear();
}

/// Раскрывает всех предков категории, чтобы она стала видимой
pub fn reveal(items: &[EditableCategory], expanded: &mut HashSet<String>, key: &str) {
    let by_path: HashMap<&str, &EditableCategory> =
        items.iter().map(|c| (c.node_path(), c)).collect();
    let mut current = items
        .iter()
        .find(|c| c.key() == key)
        .and_then(|c| c.node_parent_path());
    let mut guard = HashSet::new();
    while let Some(path) = current {
        if !guard.insert(path) {
            break;
        }
        let Some(parent) = by_path.get(path) else {
            break;
        };
        expanded.insert(parent.key().to_string());
        current = parent.node_parent_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::{Category, CategoryType};

    fn item(path: &str, parent: Option<&str>, level: i32, order: i32) -> EditableCategory {
        let mut c = Category::new(CategoryType::Consumer, path, parent.map(String::from), order, path);
        c.category_id = path.to_string();
        c.level = level;
        EditableCategory::from_server(c)
    }

    fn sample() -> Vec<EditableCategory> {
        vec![
            item("a", None, 1, 1),
            item("a.b", Some("a"), 2, 1),
            item("c", None, 1, 2),
        ]
    }

    fn set(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn collapsed_tree_shows_roots_only() {
        let rows = flatten_visible(&sample(), &HashSet::new(), None);
        assert_eq!(visible_keys(&rows), vec!["a", "c"]);
        assert!(rows[0].has_children);
        assert!(!rows[0].is_expanded);
        assert!(!rows[1].has_children);
    }

    #[test]
    fn expanded_parent_shows_children_in_order() {
        let rows = flatten_visible(&sample(), &set(&["a"]), None);
        assert_eq!(visible_keys(&rows), vec!["a", "a.b", "c"]);
        assert_eq!(rows[1].depth, 1);
    }

    #[test]
    fn max_depth_hides_deeper_rows() {
        let rows = flatten_visible(&sample(), &set(&["a"]), Some(1));
        assert_eq!(visible_keys(&rows), vec!["a", "c"]);
    }

    #[test]
    fn cyclic_data_terminates() {
        // x и y ссылаются друг на друга
        let items = vec![item("x", Some("y"), 1, 0), item("y", Some("x"), 1, 1)];
        let rows = flatten_visible(&items, &set(&["x", "y"]), None);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn dangling_parent_is_shown_at_root() {
        let items = vec![item("a", None, 1, 0), item("q.r", Some("q"), 2, 0)];
        let rows = flatten_visible(&items, &HashSet::new(), None);
        assert_eq!(visible_keys(&rows), vec!["a", "q.r"]);
    }

    #[test]
    fn expand_toggle_and_collapse() {
        let items = sample();
        let mut expanded = expand_all(&items);
        assert_eq!(expanded, set(&["a"]));
        toggle_expanded(&mut expanded, "a");
        assert!(expanded.is_empty());
        toggle_expanded(&mut expanded, "c");
        collapse_all(&mut expanded);
        assert!(expanded.is_empty());
    }

    #[test]
    fn reveal_expands_ancestors() {
        let mut items = sample();
        items.push(item("a.b.d", Some("a.b"), 3, 0));
        let mut expanded = HashSet::new();
        reveal(&items, &mut expanded, "a.b.d");
        assert_eq!(expanded, set(&["a", "a.b"]));
    }

    #[test]
    fn search_keeps_ancestors_of_matches() {
        let mut items = sample();
        items.push(item("a.b.d", Some("a.b"), 3, 0));
        let rows = flatten_search(&items, "D", "en");
        assert_eq!(visible_keys(&rows), vec!["a", "a.b", "a.b.d"]);
        assert!(flatten_search(&items, "  ", "en").is_empty());
    }
}
