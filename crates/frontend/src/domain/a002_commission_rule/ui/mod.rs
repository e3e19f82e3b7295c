pub mod conflicts;
pub mod details;
pub mod list;

pub use conflicts::RuleConflictsPage;
pub use details::CommissionRuleDetails;
pub use list::CommissionRuleList;
