//! Карточка правила комиссии
//!
//! - view_model.rs: форма, команды и состояние
//! - view.rs: Leptos-компонент

mod view;
mod view_model;

pub use view::CommissionRuleDetails;
