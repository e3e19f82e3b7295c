//! Tab content registry - единственный источник правды для маппинга tab.key → View
//!
//! Функция `render_tab_content` по ключу таба возвращает соответствующий View.
//! Все tab keys собраны здесь в одном месте.

use super::tab_labels::RULE_DETAIL_PREFIX;
use crate::domain::a001_category::ui::CategoryManager;
use crate::domain::a002_commission_rule::ui::{
    CommissionRuleDetails, CommissionRuleList, RuleConflictsPage,
};
use crate::layout::global_context::AppGlobalContext;
use crate::system::logs::LogViewer;
use leptos::prelude::*;

/// Рендерит контент таба по его ключу.
///
/// `tabs_store` нужен detail-views, которые закрывают свой таб сами.
pub fn render_tab_content(key: &str, tabs_store: AppGlobalContext) -> AnyView {
    let key_for_close = key.to_string();

    match key {
        // ═══════════════════════════════════════════════════════════════════
        // Catalog
        // ═══════════════════════════════════════════════════════════════════
        "a001_category" => view! { <CategoryManager /> }.into_any(),

        // ═══════════════════════════════════════════════════════════════════
        // Commission rules
        // ═══════════════════════════════════════════════════════════════════
        "a002_commission_rule" => view! { <CommissionRuleList /> }.into_any(),
        "a002_commission_rule_conflicts" => view! { <RuleConflictsPage /> }.into_any(),
        k if k.starts_with(RULE_DETAIL_PREFIX) => {
            let id = match k.strip_prefix(RULE_DETAIL_PREFIX) {
                Some("new") | None => None,
                Some(id) => Some(id.to_string()),
            };
            view! {
                <CommissionRuleDetails
                    id=id
                    tab_key=key_for_close.clone()
                    on_close=Callback::new({
                        let key_for_close = key_for_close.clone();
                        move |_| {
                            tabs_store.close_tab(&key_for_close);
                        }
                    })
                />
            }
            .into_any()
        }

        // ═══════════════════════════════════════════════════════════════════
        // System
        // ═══════════════════════════════════════════════════════════════════
        "sys_logs" => view! { <LogViewer /> }.into_any(),

        _ => {
            log::warn!("unknown tab type: {}", key);
            view! { <div class="placeholder">{"Not implemented yet"}</div> }.into_any()
        }
    }
}
