//! Перемещение категории перетаскиванием: смена порядка и смена родителя.

use super::editing::EditableCategory;
use super::hierarchy::{
    get_siblings, is_descendant_path, join_path, last_segment, level_from_path, sort_by_display_order,
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderOptions {
    /// Максимальная глубина дерева после перемещения
    pub max_depth: Option<i32>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Category {0} is not in the tree")]
    UnknownItem(String),
    #[error("Drop position {position} is out of range (0..={len})")]
    OutOfRange { position: usize, len: usize },
    #[error("A category cannot be moved into its own subtree")]
    IntoOwnSubtree,
    #[error("Moving here would nest categories {depth} levels deep (maximum is {max})")]
    TooDeep { depth: i32, max: i32 },
    #[error("A category with path \"{0}\" already exists")]
    PathConflict(String),
}

/// Перемещает `dragged_key` так, чтобы в видимом списке без него он оказался
/// на позиции `destination`.
///
/// Новый родитель определяется строкой, перед которой вставляется категория:
/// это её родитель. Вставка в конец списка делает категорию корневой.
pub fn move_category(
    all: &[EditableCategory],
    visible_keys: &[String],
    dragged_key: &str,
    destination: usize,
    options: ReorderOptions,
) -> Result<Vec<EditableCategory>, ReorderError> {
    let dragged = find(all, dragged_key)?;
    if !visible_keys.iter().any(|k| k == dragged_key) {
        return Err(ReorderError::UnknownItem(dragged_key.to_string()));
    }
    let rest: Vec<&str> = visible_keys
        .iter()
        .map(String::as_str)
        .filter(|k| *k != dragged_key)
        .collect();
    if destination > rest.len() {
        return Err(ReorderError::OutOfRange {
            position: destination,
            len: rest.len(),
        });
    }

    let new_parent = match rest.get(destination) {
        Some(anchor_key) => {
            let anchor = find(all, anchor_key)?;
            anchor
                .category
                .parent_path
                .as_deref()
                .and_then(|parent| all.iter().find(|c| c.category.path == parent))
        }
        None => None,
    };

    // Позиция среди будущих соседей: сколько из них стоит в видимом списке
    // до точки вставки.
    let before: HashSet<&str> = rest[..destination].iter().copied().collect();
    let new_parent_path = new_parent.map(|p| p.category.path.as_str());
    let insert_at = get_siblings(all, new_parent_path)
        .into_iter()
        .filter(|s| s.key() != dragged_key && before.contains(s.key()))
        .count();

    relocate(all, dragged, new_parent, insert_at, options)
}

/// Делает `dragged_key` последним ребёнком `parent_key` (бросок на строку)
pub fn move_into(
    all: &[EditableCategory],
    dragged_key: &str,
    parent_key: &str,
    options: ReorderOptions,
) -> Result<Vec<EditableCategory>, ReorderError> {
    let dragged = find(all, dragged_key)?;
    let parent = find(all, parent_key)?;
    let insert_at = get_siblings(all, Some(&parent.category.path))
        .into_iter()
        .filter(|s| s.key() != dragged_key)
        .count();
    relocate(all, dragged, Some(parent), insert_at, options)
}

fn find<'a>(all: &'a [EditableCategory], key: &str) -> Result<&'a EditableCategory, ReorderError> {
    all.iter()
        .find(|c| c.key() == key)
        .ok_or_else(|| ReorderError::UnknownItem(key.to_string()))
}

fn relocate(
    all: &[EditableCategory],
    dragged: &EditableCategory,
    new_parent: Option<&EditableCategory>,
    insert_at: usize,
    options: ReorderOptions,
) -> Result<Vec<EditableCategory>, ReorderError> {
    let old_path = dragged.category.path.clone();
    let old_parent_path = dragged.category.parent_path.clone();
    let new_parent_path = new_parent.map(|p| p.category.path.clone());

    if let Some(parent) = new_parent {
        if parent.key() == dragged.key()
            || parent.category.path == old_path
            || is_descendant_path(&parent.category.path, &old_path)
            || has_ancestor(all, parent, &old_path)
        {
            return Err(ReorderError::IntoOwnSubtree);
        }
    }

    let parent_changed = new_parent_path != old_parent_path;
    let new_level = new_parent.map_or(1, |p| p.category.level + 1);

    if let Some(max) = options.max_depth {
        let subtree_height = all
            .iter()
            .filter(|c| is_descendant_path(&c.category.path, &old_path))
            .map(|c| c.category.level - dragged.category.level)
            .max()
            .unwrap_or(0);
        let depth = new_level + subtree_height;
        if depth > max {
            return Err(ReorderError::TooDeep { depth, max });
        }
    }

    // Новые пути для перемещаемого поддерева
    let mut rewrites: HashMap<String, String> = HashMap::new();
    if parent_changed {
        let new_path = join_path(new_parent_path.as_deref(), last_segment(&old_path));
        for item in all {
            let path = &item.category.path;
            if *path == old_path {
                rewrites.insert(path.clone(), new_path.clone());
            } else if is_descendant_path(path, &old_path) {
                rewrites.insert(path.clone(), format!("{}{}", new_path, &path[old_path.len()..]));
            }
        }
        let untouched: HashSet<&str> = all
            .iter()
            .map(|c| c.category.path.as_str())
            .filter(|p| !rewrites.contains_key(*p))
            .collect();
        if let Some(conflict) = rewrites.values().find(|p| untouched.contains(p.as_str())) {
            return Err(ReorderError::PathConflict(conflict.clone()));
        }
    }

    let mut siblings: Vec<&EditableCategory> = get_siblings(all, new_parent_path.as_deref())
        .into_iter()
        .filter(|s| s.key() != dragged.key())
        .collect();
    // insert_at отсчитан в порядке строк дерева
    sort_by_display_order(&mut siblings);
    let mut new_order: Vec<String> = siblings.iter().map(|s| s.key().to_string()).collect();
    new_order.insert(insert_at.min(new_order.len()), dragged.key().to_string());

    let old_order: Vec<String> = if parent_changed {
        let mut old_siblings: Vec<&EditableCategory> = get_siblings(all, old_parent_path.as_deref())
            .into_iter()
            .filter(|s| s.key() != dragged.key())
            .collect();
        sort_by_display_order(&mut old_siblings);
        old_siblings.iter().map(|s| s.key().to_string()).collect()
    } else {
        Vec::new()
    };

    // Старые соседи нумеруются заново с нуля
    let mut positions: HashMap<&str, i32> = HashMap::new();
    for (index, key) in new_order.iter().enumerate() {
        positions.insert(key.as_str(), index as i32);
    }
    for (index, key) in old_order.iter().enumerate() {
        positions.insert(key.as_str(), index as i32);
    }

    let mut result = all.to_vec();
    for item in result.iter_mut() {
        let mut touched = false;

        if let Some(new_path) = rewrites.get(&item.category.path).cloned() {
            item.category.parent_path = if item.key() == dragged.key() {
                new_parent_path.clone()
            } else {
                item.category
                    .parent_path
                    .as_ref()
                    .and_then(|pp| rewrites.get(pp).cloned())
                    .or_else(|| item.category.parent_path.clone())
            };
            item.category.level = level_from_path(&new_path);
            item.category.path = new_path;
            touched = true;
        }

        if let Some(position) = positions.get(item.key()) {
            if item.category.display_order != *position {
                item.category.display_order = *position;
                touched = true;
            }
        }

        if touched {
            item.mark_dirty();
        }
    }

    Ok(result)
}

/// Обход цепочки родителей с защитой от циклов в данных
fn has_ancestor(all: &[EditableCategory], start: &EditableCategory, ancestor_path: &str) -> bool {
    let mut visited = HashSet::new();
    let mut current = start.category.parent_path.as_deref();
    while let Some(path) = current {
        if path == ancestor_path {
            return true;
        }
        if !visited.insert(path) {
            return false;
        }
        current = all
            .iter()
            .find(|c| c.category.path == path)
            .and_then(|c| c.category.parent_path.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::{Category, CategoryType};
    use crate::domain::a001_category::tree::{flatten_visible, visible_keys};
    use std::collections::HashSet;

    fn item(path: &str, parent: Option<&str>, order: i32) -> EditableCategory {
        let mut c = Category::new(CategoryType::Consumer, path, parent.map(String::from), order, path);
        c.category_id = path.to_string();
        EditableCategory::from_server(c)
    }

    // a(0) [a.x(0), a.y(1)], b(1) [b.z(0)], c(2)
    fn sample() -> Vec<EditableCategory> {
        vec![
            item("a", None, 0),
            item("a.x", Some("a"), 0),
            item("a.y", Some("a"), 1),
            item("b", None, 1),
            item("b.z", Some("b"), 0),
            item("c", None, 2),
        ]
    }

    fn visible(items: &[EditableCategory], expanded: &[&str]) -> Vec<String> {
        let expanded: HashSet<String> = expanded.iter().map(|s| s.to_string()).collect();
        visible_keys(&flatten_visible(items, &expanded, None))
    }

    fn get<'a>(items: &'a [EditableCategory], key: &str) -> &'a Category {
        &items.iter().find(|c| c.key() == key).unwrap().category
    }

    #[test]
    fn reorder_among_roots_renumbers_contiguously() {
        let items = sample();
        let keys = visible(&items, &[]);
        assert_eq!(keys, vec!["a", "b", "c"]);

        // c перед a
        let moved = move_category(&items, &keys, "c", 0, ReorderOptions::default()).unwrap();
        assert_eq!(get(&moved, "c").display_order, 0);
        assert_eq!(get(&moved, "a").display_order, 1);
        assert_eq!(get(&moved, "b").display_order, 2);
        for key in ["a", "b", "c"] {
            assert_eq!(get(&moved, key).parent_path, None);
            assert_eq!(get(&moved, key).level, 1);
        }
        assert!(moved.iter().filter(|c| c.key().contains('.')).all(|c| !c.is_dirty));
    }

    #[test]
    fn equal_display_orders_follow_the_visible_order() {
        let items = vec![item("b", None, 0), item("a", None, 0), item("c", None, 0)];
        let keys = visible(&items, &[]);
        assert_eq!(keys, vec!["a", "b", "c"]);

        // c между a и b
        let moved = move_category(&items, &keys, "c", 1, ReorderOptions::default()).unwrap();
        assert_eq!(visible(&moved, &[]), vec!["a", "c", "b"]);
        assert_eq!(get(&moved, "a").display_order, 0);
        assert_eq!(get(&moved, "c").display_order, 1);
        assert_eq!(get(&moved, "b").display_order, 2);
    }

    #[test]
    fn dropping_at_same_place_changes_nothing() {
        let items = sample();
        let keys = visible(&items, &[]);
        let moved = move_category(&items, &keys, "b", 1, ReorderOptions::default()).unwrap();
        assert_eq!(moved, items);
    }

    #[test]
    fn reparent_rewrites_subtree_and_renumbers_both_parents() {
        let items = sample();
        let keys = visible(&items, &["a", "b"]);
        assert_eq!(keys, vec!["a", "a.x", "a.y", "b", "b.z", "c"]);

        // b перед a.y: новым родителем становится a
        let moved = move_category(&items, &keys, "b", 2, ReorderOptions::default()).unwrap();
        let b = get(&moved, "b");
        assert_eq!(b.path, "a.b");
        assert_eq!(b.parent_path.as_deref(), Some("a"));
        assert_eq!(b.level, 2);
        assert_eq!(b.display_order, 1);

        let z = get(&moved, "b.z");
        assert_eq!(z.path, "a.b.z");
        assert_eq!(z.parent_path.as_deref(), Some("a.b"));
        assert_eq!(z.level, 3);

        assert_eq!(get(&moved, "a.x").display_order, 0);
        assert_eq!(get(&moved, "a.y").display_order, 2);
        assert_eq!(get(&moved, "a").display_order, 0);
        assert_eq!(get(&moved, "c").display_order, 1);
        assert!(moved.iter().find(|c| c.key() == "b.z").unwrap().is_dirty);
    }

    #[test]
    fn dropping_at_the_end_moves_to_root() {
        let items = sample();
        let keys = visible(&items, &["a"]);
        let last = keys.len() - 1;
        let moved = move_category(&items, &keys, "a.x", last, ReorderOptions::default()).unwrap();
        let x = get(&moved, "a.x");
        assert_eq!(x.path, "x");
        assert_eq!(x.parent_path, None);
        assert_eq!(x.level, 1);
        assert_eq!(x.display_order, 3);
        assert_eq!(get(&moved, "a.y").display_order, 0);
    }

    #[test]
    fn cannot_move_into_own_subtree() {
        let items = sample();
        let err = move_into(&items, "a", "a.x", ReorderOptions::default()).unwrap_err();
        assert_eq!(err, ReorderError::IntoOwnSubtree);
    }

    #[test]
    fn depth_limit_counts_the_moved_subtree() {
        let items = sample();
        let options = ReorderOptions { max_depth: Some(2) };
        let err = move_into(&items, "b", "a.x", options).unwrap_err();
        assert_eq!(err, ReorderError::TooDeep { depth: 4, max: 2 });
        assert!(move_into(&items, "c", "a", options).is_ok());
    }

    #[test]
    fn colliding_path_is_rejected() {
        let mut items = sample();
        items.push(item("a.c", Some("a"), 2));
        let err = move_into(&items, "c", "a", ReorderOptions::default()).unwrap_err();
        assert_eq!(err, ReorderError::PathConflict("a.c".into()));
    }

    #[test]
    fn bad_input_is_rejected() {
        let items = sample();
        let keys = visible(&items, &[]);
        assert_eq!(
            move_category(&items, &keys, "zzz", 0, ReorderOptions::default()).unwrap_err(),
            ReorderError::UnknownItem("zzz".into())
        );
        assert_eq!(
            move_category(&items, &keys, "a", 3, ReorderOptions::default()).unwrap_err(),
            ReorderError::OutOfRange { position: 3, len: 2 }
        );
    }

    #[test]
    fn move_into_appends_as_last_child() {
        let items = sample();
        let moved = move_into(&items, "c", "b", ReorderOptions::default()).unwrap();
        let c = get(&moved, "c");
        assert_eq!(c.path, "b.c");
        assert_eq!(c.display_order, 1);
        assert_eq!(get(&moved, "b").display_order, 1);
    }
}
