use crate::layout::global_context::AppGlobalContext;
use crate::routes::routes::AppRoutes;
use crate::shared::toast::{ToastHost, ToastService};
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    // Provide the AppGlobalContext store to the whole app via context.
    provide_context(AppGlobalContext::new());
    provide_context(ToastService::new());

    view! {
        <AppRoutes />
        <ToastHost />
    }
}
