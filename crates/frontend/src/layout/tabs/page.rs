//! TabPage component - wrapper для отображения контента таба

use super::registry::render_tab_content;
use crate::layout::global_context::{AppGlobalContext, Tab as TabData};
use leptos::prelude::*;

/// Компонент-обёртка для отдельного таба.
///
/// Рендерит контент через `registry::render_tab_content` и скрывает его
/// CSS-классом, когда таб не активен.
#[component]
pub fn TabPage(tab: TabData, tabs_store: AppGlobalContext) -> impl IntoView {
    let tab_key = tab.key.clone();
    let tab_key_for_active_check = tab_key.clone();

    let is_active = move || {
        let current_active = tabs_store.active.get();
        current_active.as_ref() == Some(&tab_key_for_active_check)
    };

    log::debug!("tab page created: {}", tab_key);

    let tab_key_for_cleanup = tab_key.clone();
    on_cleanup(move || {
        log::debug!("tab page destroyed: {}", tab_key_for_cleanup);
    });

    let content = render_tab_content(&tab_key, tabs_store);

    view! {
        <div
            class="tabs__item"
            class:tabs__item--hidden=move || !is_active()
            data-tab-key=tab_key
        >
            {content}
        </div>
    }
}
