//! HTTP-доступ к API правил комиссий

use crate::shared::api_utils::{delete, get_json, post_json, put_json};
use contracts::domain::a002_commission_rule::{
    CommissionRule, CommissionRuleDto, FormulaTestRequest, FormulaTestResponse,
    FormulaValidationRequest, FormulaValidationResponse, RuleConflict, RuleListQuery, RuleState,
    RuleStateUpdate,
};
use std::collections::HashMap;

/// Query-строка списка; пустые фильтры не передаются
pub fn list_query_string(query: &RuleListQuery) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    let mut push = |name: &'static str, value: Option<&str>| {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            params.push((name, v.to_string()));
        }
    };
    push("team_id", query.team_id.as_deref());
    push("category_type", query.category_type.map(|t| t.as_str()));
    push("category_path", query.category_path.as_deref());
    push("state", query.state.map(|s| s.as_str()));
    push("search", query.search.as_deref());

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn fetch_rules(query: &RuleListQuery) -> Result<Vec<CommissionRule>, String> {
    let qs = list_query_string(query);
    if qs.is_empty() {
        get_json("/api/commission-rules").await
    } else {
        get_json(&format!("/api/commission-rules?{}", qs)).await
    }
}

pub async fn fetch_by_id(id: &str) -> Result<CommissionRule, String> {
    get_json(&format!("/api/commission-rules/{}", id)).await
}

pub async fn create(dto: &CommissionRuleDto) -> Result<CommissionRule, String> {
    post_json("/api/commission-rules", dto).await
}

pub async fn update(id: &str, dto: &CommissionRuleDto) -> Result<CommissionRule, String> {
    put_json(&format!("/api/commission-rules/{}", id), dto).await
}

pub async fn remove(id: &str) -> Result<(), String> {
    delete(&format!("/api/commission-rules/{}", id)).await
}

pub async fn update_state(id: &str, state: RuleState) -> Result<CommissionRule, String> {
    post_json(
        &format!("/api/commission-rules/{}/state", id),
        &RuleStateUpdate { state },
    )
    .await
}

pub async fn validate_formula(formula: &str) -> Result<FormulaValidationResponse, String> {
    post_json(
        "/api/commission-rules/validate-formula",
        &FormulaValidationRequest {
            formula: formula.to_string(),
        },
    )
    .await
}

pub async fn test_formula(
    formula: &str,
    variables: HashMap<String, f64>,
) -> Result<FormulaTestResponse, String> {
    post_json(
        "/api/commission-rules/test-formula",
        &FormulaTestRequest {
            formula: formula.to_string(),
            variables,
        },
    )
    .await
}

pub async fn fetch_conflicts(team_id: &str) -> Result<Vec<RuleConflict>, String> {
    get_json(&format!(
        "/api/commission-rules/conflicts?team_id={}",
        urlencoding::encode(team_id.trim())
    ))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_category::CategoryType;

    #[test]
    fn empty_filters_are_omitted() {
        assert_eq!(list_query_string(&RuleListQuery::default()), "");

        let query = RuleListQuery {
            team_id: Some("  ".to_string()),
            category_type: Some(CategoryType::Brand),
            category_path: Some("shoes.running".to_string()),
            state: Some(RuleState::Active),
            search: Some("base fee".to_string()),
        };
        assert_eq!(
            list_query_string(&query),
            "category_type=brand&category_path=shoes.running&state=active&search=base%20fee"
        );
    }
}
