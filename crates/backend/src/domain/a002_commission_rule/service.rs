use super::{conflicts, formula, repository};
use crate::shared::error::ApiError;
use crate::shared::logger;
use contracts::domain::a002_commission_rule::aggregate::{CommissionRule, RuleState};
use contracts::domain::a002_commission_rule::dto::{
    CommissionRuleDto, FormulaTestRequest, FormulaTestResponse, FormulaValidationResponse,
    RuleConflict, RuleListQuery,
};

/// Полная проверка правила, включая формулу
fn validate_rule(rule: &CommissionRule) -> anyhow::Result<()> {
    rule.validate().map_err(ApiError::Validation)?;
    let check = formula::validate(&rule.formula);
    if !check.is_valid {
        let errors: Vec<String> = check
            .errors
            .iter()
            .map(|e| format!("Formula, position {}: {}", e.position, e.message))
            .collect();
        return Err(ApiError::validation_list(&errors).into());
    }
    Ok(())
}

async fn load(id: &str) -> anyhow::Result<CommissionRule> {
    repository::get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Commission rule {} not found", id)).into())
}

pub async fn create(dto: CommissionRuleDto) -> anyhow::Result<CommissionRule> {
    let rule = CommissionRule::new_for_insert(&dto);
    validate_rule(&rule)?;
    repository::insert(&rule).await?;
    logger::log(
        "commission_rule",
        &format!("Created rule '{}' ({})", rule.name, rule.to_string_id()),
    );
    Ok(rule)
}

pub async fn update(id: &str, dto: CommissionRuleDto) -> anyhow::Result<CommissionRule> {
    let mut rule = load(id).await?;
    rule.update(&dto);
    validate_rule(&rule)?;
    repository::update(&rule).await?;
    Ok(rule)
}

pub async fn delete(id: &str) -> anyhow::Result<()> {
    if !repository::delete(id).await? {
        return Err(ApiError::NotFound(format!("Commission rule {} not found", id)).into());
    }
    logger::log("commission_rule", &format!("Deleted rule {}", id));
    Ok(())
}

pub async fn get_by_id(id: &str) -> anyhow::Result<CommissionRule> {
    load(id).await
}

/// Список с фильтрами, по убыванию приоритета
pub async fn list(query: &RuleListQuery) -> anyhow::Result<Vec<CommissionRule>> {
    let rules = repository::list_all().await?;
    Ok(filter_sorted(rules, query))
}

fn filter_sorted(rules: Vec<CommissionRule>, query: &RuleListQuery) -> Vec<CommissionRule> {
    let mut rules: Vec<CommissionRule> = rules.into_iter().filter(|r| query.matches(r)).collect();
    rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
    rules
}

pub async fn update_state(id: &str, state: RuleState) -> anyhow::Result<CommissionRule> {
    let mut rule = load(id).await?;
    if rule.state == state {
        return Ok(rule);
    }
    if !rule.state.can_transition_to(state) {
        return Err(ApiError::BadRequest(format!(
            "Cannot change state from {} to {}",
            rule.state.label(),
            state.label()
        ))
        .into());
    }
    if state == RuleState::Active {
        validate_rule(&rule)?;
    }
    rule.state = state;
    rule.metadata.touch();
    repository::update(&rule).await?;
    logger::log(
        "commission_rule",
        &format!("Rule {} is now {}", rule.to_string_id(), state.as_str()),
    );
    Ok(rule)
}

pub fn validate_formula(source: &str) -> FormulaValidationResponse {
    formula::validate(source)
}

pub fn test_formula(request: &FormulaTestRequest) -> FormulaTestResponse {
    formula::try_evaluate(&request.formula, &request.variables)
}

pub async fn conflicts(team_id: &str) -> anyhow::Result<Vec<RuleConflict>> {
    let rules = repository::list_by_team(team_id).await?;
    Ok(conflicts::detect_conflicts(&rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, priority: i32, formula: &str) -> CommissionRule {
        CommissionRule::new_for_insert(&CommissionRuleDto {
            team_id: "team-1".into(),
            name: name.into(),
            formula: formula.into(),
            priority: Some(priority),
            ..Default::default()
        })
    }

    #[test]
    fn rule_validation_reports_formula_errors() {
        assert!(validate_rule(&rule("Ok", 1, "amount * 0.1")).is_ok());

        let err = validate_rule(&rule("Bad", 1, "amount * fee")).unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(message) => {
                assert!(message.contains("Unknown variable 'fee'"), "{}", message)
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = validate_rule(&rule("", 1, "amount")).unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Validation(_)));
    }

    #[test]
    fn list_is_filtered_and_sorted_by_priority() {
        let rules = vec![
            rule("Low", 1, "amount"),
            rule("High", 9, "amount"),
            rule("Mid fee", 5, "amount"),
        ];
        let all = filter_sorted(rules.clone(), &RuleListQuery::default());
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid fee", "Low"]);

        let query = RuleListQuery {
            search: Some("fee".into()),
            ..Default::default()
        };
        assert_eq!(filter_sorted(rules, &query).len(), 1);
    }
}
