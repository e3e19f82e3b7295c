use super::aggregate::{CommissionRule, RuleState};
use crate::domain::a001_category::aggregate::CategoryType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Переменные, доступные в формулах: (имя, описание)
pub const FORMULA_VARIABLES: &[(&str, &str)] = &[
    ("price", "Item price"),
    ("quantity", "Number of items in the order line"),
    ("amount", "Order line total (price * quantity)"),
    ("cost", "Item cost"),
    ("shipping", "Shipping fee charged to the buyer"),
    ("discount", "Discount applied to the line"),
    ("level", "Depth of the item's category"),
];

pub fn is_formula_variable(name: &str) -> bool {
    FORMULA_VARIABLES.iter().any(|(n, _)| *n == name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionRuleDto {
    pub team_id: String,
    pub name: String,
    pub description: Option<String>,
    pub formula: String,
    pub priority: Option<i32>,
    pub category_type: Option<CategoryType>,
    pub category_path: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl From<&CommissionRule> for CommissionRuleDto {
    fn from(rule: &CommissionRule) -> Self {
        Self {
            team_id: rule.team_id.clone(),
            name: rule.name.clone(),
            description: Some(rule.description.clone()).filter(|d| !d.is_empty()),
            formula: rule.formula.clone(),
            priority: Some(rule.priority),
            category_type: rule.category_type,
            category_path: rule.category_path.clone(),
            valid_from: rule.valid_from,
            valid_to: rule.valid_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleStateUpdate {
    pub state: RuleState,
}

/// Фильтры списка правил; пустые поля не фильтруют
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleListQuery {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub category_type: Option<CategoryType>,
    #[serde(default)]
    pub category_path: Option<String>,
    #[serde(default)]
    pub state: Option<RuleState>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RuleListQuery {
    pub fn matches(&self, rule: &CommissionRule) -> bool {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        if let Some(team) = non_empty(&self.team_id) {
            if rule.team_id != team {
                return false;
            }
        }
        if let Some(category_type) = self.category_type {
            if rule.category_type != Some(category_type) {
                return false;
            }
        }
        if let Some(path) = non_empty(&self.category_path) {
            let rule_path = rule.category_path.as_deref().unwrap_or_default();
            if rule_path != path && !rule_path.starts_with(&format!("{}.", path)) {
                return false;
            }
        }
        if let Some(state) = self.state {
            if rule.state != state {
                return false;
            }
        }
        if let Some(search) = non_empty(&self.search) {
            let search = search.to_lowercase();
            if !rule.name.to_lowercase().contains(&search)
                && !rule.formula.to_lowercase().contains(&search)
                && !rule.description.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaValidationRequest {
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaError {
    /// Позиция в символах от начала формулы
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaValidationResponse {
    pub is_valid: bool,
    pub errors: Vec<FormulaError>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaTestRequest {
    pub formula: String,
    #[serde(default)]
    pub variables: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTestResponse {
    pub result: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    SamePriority,
    DuplicateFormula,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConflict {
    pub rule_a: String,
    pub rule_b: String,
    pub kind: ConflictKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, path: Option<&str>, state: RuleState) -> CommissionRule {
        let mut rule = CommissionRule::new_for_insert(&CommissionRuleDto {
            team_id: "t1".into(),
            name: name.into(),
            formula: "price * 0.05".into(),
            category_type: Some(CategoryType::Consumer),
            category_path: path.map(String::from),
            ..Default::default()
        });
        rule.state = state;
        rule
    }

    #[test]
    fn list_filters() {
        let rule = rule("Electronics fee", Some("electronics.phones"), RuleState::Active);

        assert!(RuleListQuery::default().matches(&rule));
        let by_parent = RuleListQuery {
            category_path: Some("electronics".into()),
            ..Default::default()
        };
        assert!(by_parent.matches(&rule));
        let by_prefix_only = RuleListQuery {
            category_path: Some("electro".into()),
            ..Default::default()
        };
        assert!(!by_prefix_only.matches(&rule));

        let search = RuleListQuery {
            search: Some("FEE".into()),
            state: Some(RuleState::Active),
            ..Default::default()
        };
        assert!(search.matches(&rule));
        let other_team = RuleListQuery {
            team_id: Some("t2".into()),
            ..Default::default()
        };
        assert!(!other_team.matches(&rule));
    }

    #[test]
    fn dto_from_rule_keeps_fields() {
        let rule = rule("Base", None, RuleState::Draft);
        let dto = CommissionRuleDto::from(&rule);
        assert_eq!(dto.description, None);
        assert_eq!(dto.priority, Some(0));
        assert!(is_formula_variable("price"));
        assert!(!is_formula_variable("tax"));
    }
}
