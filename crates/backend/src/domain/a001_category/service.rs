use super::{history_repository, repository};
use crate::shared::data::db::get_connection;
use crate::shared::error::ApiError;
use crate::shared::logger;
use chrono::Utc;
use contracts::domain::a001_category::aggregate::{Category, CategoryType};
use contracts::domain::a001_category::dto::{BulkUpdateRequest, BulkUpdateResponse};
use contracts::domain::a001_category::hierarchy::{duplicate_path_check, missing_parent_check};
use contracts::domain::a001_category::history::{
    diff_snapshots, CategoryHistoryDetails, CategoryHistoryEntry,
};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use std::collections::HashSet;
use uuid::Uuid;

/// Получение дерева категорий одного типа
pub async fn list(category_type: CategoryType) -> anyhow::Result<Vec<Category>> {
    repository::list_by_type(get_connection(), category_type).await
}

/// Итоговое дерево после массового сохранения.
///
/// Категории, которых нет ни в запросе, ни в `deleted_ids`, остаются как есть.
/// Новые категории (пустой ID) получают UUID; непустой ID обязан быть среди
/// текущих категорий этого типа.
pub fn assemble_tree(
    current: Vec<Category>,
    category_type: CategoryType,
    submitted: Vec<Category>,
    deleted_ids: &[String],
) -> Result<Vec<Category>, Vec<String>> {
    let deleted: HashSet<&str> = deleted_ids.iter().map(String::as_str).collect();
    let mut errors = Vec::new();

    let current_ids: HashSet<&str> = current.iter().map(|c| c.category_id.as_str()).collect();
    let mut submitted_ids = HashSet::new();
    for category in submitted.iter().filter(|c| c.is_saved()) {
        if !current_ids.contains(category.category_id.as_str()) {
            errors.push(format!(
                "Category {} does not exist in {}",
                category.category_id, category_type
            ));
        }
        if !submitted_ids.insert(category.category_id.clone()) {
            errors.push(format!("Category {} is submitted twice", category.category_id));
        }
        if deleted.contains(category.category_id.as_str()) {
            errors.push(format!(
                "Category {} is both updated and deleted",
                category.category_id
            ));
        }
    }

    let mut tree: Vec<Category> = current
        .into_iter()
        .filter(|c| {
            !deleted.contains(c.category_id.as_str()) && !submitted_ids.contains(&c.category_id)
        })
        .collect();
    for mut category in submitted {
        category.category_type = category_type;
        if category.category_id.is_empty() {
            category.category_id = Uuid::new_v4().to_string();
        }
        tree.push(category);
    }
    check_and_sort(tree, errors)
}

/// Дерево из снимка истории: ID берутся из снимка как есть
pub fn restore_tree(
    category_type: CategoryType,
    snapshot: Vec<Category>,
) -> Result<Vec<Category>, Vec<String>> {
    let tree = snapshot
        .into_iter()
        .map(|mut c| {
            c.category_type = category_type;
            c
        })
        .collect();
    check_and_sort(tree, Vec::new())
}

fn check_and_sort(
    mut tree: Vec<Category>,
    mut errors: Vec<String>,
) -> Result<Vec<Category>, Vec<String>> {
    errors.extend(tree.iter().filter_map(|c| c.validate().err()));
    errors.extend(duplicate_path_check(&tree));
    errors.extend(missing_parent_check(&tree));
    if !errors.is_empty() {
        return Err(errors);
    }

    tree.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| a.parent_path.cmp(&b.parent_path))
            .then_with(|| a.display_order.cmp(&b.display_order))
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(tree)
}

/// Перезапись дерева типа целиком и снимок в историю, внутри транзакции
async fn replace_tree(
    txn: &DatabaseTransaction,
    category_type: CategoryType,
    tree: &[Category],
    change_description: &str,
) -> anyhow::Result<i64> {
    let created = repository::created_at_by_id(txn, category_type).await?;
    let removed = repository::delete_by_type(txn, category_type).await?;

    let now = Utc::now();
    for category in tree {
        let created_at = created.get(&category.category_id).copied().unwrap_or(now);
        repository::insert(txn, category, created_at, now).await?;
    }

    let history_id =
        history_repository::insert(txn, category_type, change_description, tree).await?;
    tracing::info!(
        "Replaced {} tree: {} rows removed, {} rows written, history #{}",
        category_type,
        removed,
        tree.len(),
        history_id
    );
    Ok(history_id)
}

/// Массовое сохранение дерева из редактора
pub async fn bulk_update(request: BulkUpdateRequest) -> anyhow::Result<BulkUpdateResponse> {
    let BulkUpdateRequest {
        category_type,
        categories,
        deleted_ids,
        change_description,
    } = request;

    let txn = get_connection().begin().await?;
    let current = repository::list_by_type(&txn, category_type).await?;
    let tree = assemble_tree(current, category_type, categories, &deleted_ids)
        .map_err(|errors| ApiError::validation_list(&errors))?;

    let description = match change_description.trim() {
        "" => "Bulk update".to_string(),
        text => text.to_string(),
    };
    let history_id = replace_tree(&txn, category_type, &tree, &description).await?;
    txn.commit().await?;

    logger::log(
        "a001_category",
        &format!(
            "{} categories saved ({} deleted): {}",
            category_type,
            deleted_ids.len(),
            description
        ),
    );

    Ok(BulkUpdateResponse {
        categories: tree,
        history_id,
    })
}

pub async fn history(category_type: CategoryType) -> anyhow::Result<Vec<CategoryHistoryEntry>> {
    history_repository::list_by_type(get_connection(), category_type).await
}

/// Снимок из истории и его отличия от предыдущего
pub async fn history_details(id: i64) -> anyhow::Result<CategoryHistoryDetails> {
    let db = get_connection();
    let model = history_repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("History entry #{}", id)))?;
    let categories = model.categories()?;
    let previous = match history_repository::get_previous(db, &model).await? {
        Some(prev) => prev.categories()?,
        None => Vec::new(),
    };

    Ok(CategoryHistoryDetails {
        entry: model.entry()?,
        changes: diff_snapshots(&previous, &categories),
        categories,
    })
}

/// Возврат дерева к снимку из истории. Сам возврат тоже попадает в историю.
pub async fn recover(id: i64) -> anyhow::Result<BulkUpdateResponse> {
    let txn = get_connection().begin().await?;
    let model = history_repository::get_by_id(&txn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("History entry #{}", id)))?;
    let entry = model.entry()?;

    let tree = restore_tree(entry.category_type, model.categories()?)
        .map_err(|errors| ApiError::validation_list(&errors))?;
    let description = format!("Recovered to #{} ({})", entry.id, entry.change_description);
    let history_id = replace_tree(&txn, entry.category_type, &tree, &description).await?;
    txn.commit().await?;

    logger::log("a001_category", &description);
    Ok(BulkUpdateResponse {
        categories: tree,
        history_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, path: &str, parent: Option<&str>) -> Category {
        let mut c = Category::new(CategoryType::Consumer, path, parent.map(String::from), 0, path);
        c.category_id = id.into();
        c
    }

    #[test]
    fn untouched_rows_survive_and_new_rows_get_ids() {
        let current = vec![cat("1", "a", None), cat("2", "b", None)];
        let submitted = vec![cat("1", "a", None), cat("", "a.x", Some("a"))];
        let tree = assemble_tree(current, CategoryType::Consumer, submitted, &[]).unwrap();

        assert_eq!(tree.len(), 3);
        let new = tree.iter().find(|c| c.path == "a.x").unwrap();
        assert!(Uuid::parse_str(&new.category_id).is_ok());
        assert!(tree.iter().any(|c| c.category_id == "2"));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let current = vec![cat("1", "a", None)];
        let errors = assemble_tree(
            current,
            CategoryType::Consumer,
            vec![cat("1", "a", None), cat("from-brand", "b", None)],
            &[],
        )
        .unwrap_err();
        assert_eq!(errors, vec!["Category from-brand does not exist in consumer".to_string()]);
    }

    #[test]
    fn snapshot_restore_keeps_historic_ids() {
        let snapshot = vec![cat("old-1", "a", None), cat("old-2", "a.b", Some("a"))];
        let tree = restore_tree(CategoryType::Consumer, snapshot).unwrap();
        let ids: Vec<&str> = tree.iter().map(|c| c.category_id.as_str()).collect();
        assert_eq!(ids, vec!["old-1", "old-2"]);
    }

    #[test]
    fn deletions_are_applied() {
        let current = vec![cat("1", "a", None), cat("2", "b", None)];
        let tree = assemble_tree(
            current,
            CategoryType::Consumer,
            vec![cat("1", "a", None)],
            &["2".to_string()],
        )
        .unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn deleting_a_parent_without_its_child_is_rejected() {
        let current = vec![cat("1", "a", None), cat("2", "a.b", Some("a"))];
        let errors = assemble_tree(current, CategoryType::Consumer, vec![], &["1".to_string()])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing parent"));
    }

    #[test]
    fn conflicting_submission_is_rejected() {
        let current = vec![cat("1", "a", None)];
        let errors = assemble_tree(
            current,
            CategoryType::Consumer,
            vec![cat("1", "a", None), cat("", "a", None)],
            &["1".to_string()],
        )
        .unwrap_err();
        assert!(errors.iter().any(|e| e.contains("both updated and deleted")));
        assert!(errors.iter().any(|e| e.contains("Duplicate path")));
    }
}
