pub mod aggregate;
pub mod dto;

pub use aggregate::{CommissionRule, CommissionRuleId, RuleState};
pub use dto::{
    CommissionRuleDto, ConflictKind, FormulaError, FormulaTestRequest, FormulaTestResponse,
    FormulaValidationRequest, FormulaValidationResponse, RuleConflict, RuleListQuery,
    RuleStateUpdate, FORMULA_VARIABLES,
};
