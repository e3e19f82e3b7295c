use super::tab::Tab as TabHeader;
use crate::layout::global_context::{AppGlobalContext, Tab as TabData};
use crate::layout::tabs::TabPage;
use leptos::prelude::*;

/// Полоса табов и содержимое открытых табов.
///
/// Содержимое неактивных табов остаётся в DOM (скрыто), чтобы не терять
/// несохранённое состояние страниц.
#[component]
pub fn Tabs() -> impl IntoView {
    let tabs_store = leptos::context::use_context::<AppGlobalContext>()
        .expect("AppGlobalContext context not found");

    view! {
        <div class="tabs">
            <div class="tabs__bar">
                <For
                    each=move || tabs_store.opened.get()
                    key=|tab| (tab.key.clone(), tab.title.clone(), tab.dirty)
                    children=move |tab: TabData| view! { <TabHeader tab=tab /> }
                />
            </div>
            <div class="tabs__content">
                <For
                    each=move || tabs_store.opened.get()
                    key=|tab| tab.key.clone()
                    children=move |tab: TabData| view! { <TabPage tab=tab tabs_store=tabs_store /> }
                />
            </div>
        </div>
    }
}
