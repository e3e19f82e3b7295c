use contracts::domain::a001_category::CategoryType;
use contracts::domain::a002_commission_rule::{CommissionRule, RuleListQuery, RuleState};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_SORT: &str = "name";

fn is_first_page(page: &usize) -> bool {
    *page <= 1
}

/// Состояние списка правил, которое живёт в query-параметрах URL.
/// Сортировка пишется как `field` или `-field` (по убыванию).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleListUrlState {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subcategory: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort: String,
    #[serde(skip_serializing_if = "is_first_page")]
    pub page: usize,
}

impl Default for RuleListUrlState {
    fn default() -> Self {
        Self {
            team: String::new(),
            category: String::new(),
            subcategory: String::new(),
            state: String::new(),
            search: String::new(),
            sort: String::new(),
            page: 1,
        }
    }
}

impl RuleListUrlState {
    /// Фильтры для сервера. Подкатегория без категории не имеет смысла.
    pub fn to_query(&self) -> RuleListQuery {
        let non_empty = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        let category_type = CategoryType::parse(&self.category);
        RuleListQuery {
            team_id: non_empty(&self.team),
            category_type,
            category_path: category_type.and_then(|_| non_empty(&self.subcategory)),
            state: RuleState::parse(&self.state),
            search: non_empty(&self.search),
        }
    }

    /// (поле, по возрастанию)
    pub fn sort_order(&self) -> (String, bool) {
        match self.sort.strip_prefix('-') {
            Some(field) if !field.is_empty() => (field.to_string(), false),
            _ if self.sort.is_empty() => (DEFAULT_SORT.to_string(), true),
            _ => (self.sort.clone(), true),
        }
    }

    /// Клик по заголовку: тот же столбец меняет направление, новый - по возрастанию
    pub fn toggle_sort(&mut self, field: &str) {
        let (current, ascending) = self.sort_order();
        self.sort = if current == field && ascending {
            format!("-{}", field)
        } else {
            field.to_string()
        };
        self.page = 1;
    }

    /// Любой фильтр возвращает на первую страницу
    pub fn set_filter(&mut self, update: impl FnOnce(&mut Self)) {
        update(self);
        self.page = 1;
    }

    pub fn current_page(&self) -> usize {
        self.page.max(1)
    }
}

pub fn compare_rules(a: &CommissionRule, b: &CommissionRule, field: &str) -> Ordering {
    match field {
        "priority" => a.priority.cmp(&b.priority),
        "state" => a.state.as_str().cmp(b.state.as_str()),
        "team" => a.team_id.cmp(&b.team_id),
        "scope" => a.category_path.cmp(&b.category_path),
        "valid_from" => a.valid_from.cmp(&b.valid_from),
        "updated_at" => a.metadata.updated_at.cmp(&b.metadata.updated_at),
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

pub fn sort_rules(rules: &mut [CommissionRule], field: &str, ascending: bool) {
    rules.sort_by(|a, b| {
        let cmp = compare_rules(a, b, field);
        if ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::url_state::{build_query, parse_query};
    use contracts::domain::a002_commission_rule::CommissionRuleDto;

    fn rule(name: &str, priority: i32) -> CommissionRule {
        CommissionRule::new_for_insert(&CommissionRuleDto {
            team_id: "team-1".to_string(),
            name: name.to_string(),
            formula: "price * 0.1".to_string(),
            priority: Some(priority),
            ..Default::default()
        })
    }

    #[test]
    fn default_state_writes_only_the_active_tab() {
        let state = RuleListUrlState::default();
        assert_eq!(build_query(Some("a002_commission_rule"), &state), "?active=a002_commission_rule");
    }

    #[test]
    fn url_round_trip_keeps_filters() {
        let state = RuleListUrlState {
            category: "brand".to_string(),
            subcategory: "shoes".to_string(),
            state: "active".to_string(),
            search: "fee".to_string(),
            sort: "-priority".to_string(),
            page: 3,
            ..Default::default()
        };
        let query = build_query(None, &state);
        assert_eq!(parse_query::<RuleListUrlState>(&query), state);
    }

    #[test]
    fn subcategory_needs_a_category() {
        let mut state = RuleListUrlState {
            subcategory: "shoes".to_string(),
            state: "bogus".to_string(),
            ..Default::default()
        };
        let query = state.to_query();
        assert_eq!(query.category_path, None);
        assert_eq!(query.state, None);

        state.category = "brand".to_string();
        let query = state.to_query();
        assert_eq!(query.category_type, Some(CategoryType::Brand));
        assert_eq!(query.category_path.as_deref(), Some("shoes"));
    }

    #[test]
    fn toggling_sort_flips_direction_and_resets_page() {
        let mut state = RuleListUrlState {
            page: 4,
            ..Default::default()
        };
        assert_eq!(state.sort_order(), ("name".to_string(), true));

        state.toggle_sort("name");
        assert_eq!(state.sort_order(), ("name".to_string(), false));
        assert_eq!(state.page, 1);

        state.toggle_sort("name");
        assert_eq!(state.sort_order(), ("name".to_string(), true));

        state.toggle_sort("priority");
        assert_eq!(state.sort, "priority");
    }

    #[test]
    fn rules_sort_by_priority_descending() {
        let mut rules = vec![rule("b", 1), rule("a", 5), rule("c", 3)];
        sort_rules(&mut rules, "priority", false);
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);

        sort_rules(&mut rules, "name", true);
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
