//! Верхняя панель приложения: переключатель навигации и заголовок

use crate::layout::global_context::AppGlobalContext;
use crate::shared::icons::icon;
use leptos::prelude::*;

#[component]
pub fn TopHeader() -> impl IntoView {
    let ctx =
        leptos::context::use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    let is_sidebar_visible = move || ctx.left_open.get();

    view! {
        <div class="top-header">
            <div class="top-header__brand">
                <button
                    class="top-header__icon-btn"
                    on:click=move |_| ctx.toggle_left()
                    title=move || if is_sidebar_visible() { "Hide navigation" } else { "Show navigation" }
                >
                    {move || if is_sidebar_visible() {
                        icon("panel-left-close")
                    } else {
                        icon("panel-left-open")
                    }}
                </button>
                <span class="top-header__title">"Catalog Console"</span>
            </div>

            <div class="top-header__actions">
                {move || {
                    let dirty = ctx.opened.get().iter().filter(|t| t.dirty).count();
                    (dirty > 0).then(|| view! {
                        <span class="top-header__hint">
                            {format!("{} tab(s) with unsaved changes", dirty)}
                        </span>
                    })
                }}
            </div>
        </div>
    }
}
