use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a002_commission_rule::aggregate::CommissionRule;
use contracts::domain::a002_commission_rule::dto::{
    CommissionRuleDto, FormulaTestRequest, FormulaTestResponse, FormulaValidationRequest,
    FormulaValidationResponse, RuleConflict, RuleListQuery, RuleStateUpdate,
};
use serde::Deserialize;

use crate::domain::a002_commission_rule::service;
use crate::shared::error::{ApiError, ApiResult};

/// GET /api/commission-rules?team_id=..&state=..&search=..
pub async fn list(Query(query): Query<RuleListQuery>) -> ApiResult<Json<Vec<CommissionRule>>> {
    Ok(Json(service::list(&query).await?))
}

/// POST /api/commission-rules
pub async fn create(
    Json(dto): Json<CommissionRuleDto>,
) -> ApiResult<(StatusCode, Json<CommissionRule>)> {
    let rule = service::create(dto).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// GET /api/commission-rules/:id
pub async fn get_by_id(Path(id): Path<String>) -> ApiResult<Json<CommissionRule>> {
    Ok(Json(service::get_by_id(&id).await?))
}

/// PUT /api/commission-rules/:id
pub async fn update(
    Path(id): Path<String>,
    Json(dto): Json<CommissionRuleDto>,
) -> ApiResult<Json<CommissionRule>> {
    Ok(Json(service::update(&id, dto).await?))
}

/// DELETE /api/commission-rules/:id
pub async fn delete(Path(id): Path<String>) -> ApiResult<StatusCode> {
    service::delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/commission-rules/:id/state
pub async fn update_state(
    Path(id): Path<String>,
    Json(update): Json<RuleStateUpdate>,
) -> ApiResult<Json<CommissionRule>> {
    Ok(Json(service::update_state(&id, update.state).await?))
}

/// POST /api/commission-rules/validate-formula
pub async fn validate_formula(
    Json(request): Json<FormulaValidationRequest>,
) -> Json<FormulaValidationResponse> {
    Json(service::validate_formula(&request.formula))
}

/// POST /api/commission-rules/test-formula
pub async fn test_formula(Json(request): Json<FormulaTestRequest>) -> Json<FormulaTestResponse> {
    Json(service::test_formula(&request))
}

#[derive(Debug, Deserialize)]
pub struct ConflictsQuery {
    pub team_id: Option<String>,
}

/// GET /api/commission-rules/conflicts?team_id=..
pub async fn conflicts(Query(query): Query<ConflictsQuery>) -> ApiResult<Json<Vec<RuleConflict>>> {
    let team_id = query
        .team_id
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("team_id is required".into()))?;
    Ok(Json(service::conflicts(team_id.trim()).await?))
}
