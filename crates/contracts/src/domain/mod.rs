pub mod a001_category;
pub mod a002_commission_rule;
pub mod common;
