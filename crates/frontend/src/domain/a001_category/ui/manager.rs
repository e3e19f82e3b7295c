use super::edit_modal::EditCategoryModal;
use super::history::HistoryModal;
use super::statistics::StatisticsModal;
use super::transfer::TransferModal;
use super::translations::TranslationsModal;
use super::tree::CategoryTree;
use super::view_model::{CategoryManagerVm, ManagerModal};
use crate::layout::global_context::AppGlobalContext;
use crate::shared::icons::icon;
use crate::shared::list_utils::SearchInput;
use crate::shared::page_frame::PageFrame;
use crate::shared::page_standard::PAGE_CAT_EDITOR;
use crate::shared::toast::use_toasts;
use contracts::domain::a001_category::aggregate::language_label;
use contracts::domain::a001_category::{CategoryType, SUPPORTED_LANGUAGES};
use leptos::prelude::*;
use thaw::*;

const TAB_KEY: &str = "a001_category";

/// Редактор дерева категорий: все правки локальные до "Save"
#[component]
pub fn CategoryManager() -> impl IntoView {
    let ctx = leptos::context::use_context::<AppGlobalContext>().expect("AppGlobalContext not found");
    let vm = CategoryManagerVm::new(use_toasts());
    vm.load();

    Effect::new(move |_| {
        ctx.set_tab_dirty(TAB_KEY, vm.has_changes());
    });

    let on_search = Callback::new(move |value: String| vm.search.set(value));
    let close_modal = Callback::new(move |_| vm.modal.set(None));

    view! {
        <PageFrame page_id="a001_category--editor" category=PAGE_CAT_EDITOR>
            <div class="page__header">
                <div class="page__header-left">
                    {icon("folder-open")}
                    <h1 class="page__title">"Categories"</h1>
                    <Show when=move || vm.has_changes()>
                        <span class="badge badge--warning">
                            {move || format!("{} unsaved", vm.dirty_count())}
                        </span>
                    </Show>
                </div>
                <div class="page__header-right">
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=move |_| vm.modal.set(Some(ManagerModal::History))
                    >
                        {icon("history")}
                        " History"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=move |_| vm.discard()
                        disabled=Signal::derive(move || !vm.has_changes() || vm.saving.get())
                    >
                        {icon("undo")}
                        " Discard"
                    </Button>
                </div>
            </div>

            <div class="page__content">
                <div class="filter-panel">
                    <Flex gap=FlexGap::Small align=FlexAlign::Center>
                        <div class="type-switcher">
                            {CategoryType::ALL
                                .into_iter()
                                .map(|category_type| {
                                    view! {
                                        <button
                                            class="type-switcher__item"
                                            class:type-switcher__item--active=move || {
                                                vm.category_type.get() == category_type
                                            }
                                            on:click=move |_| vm.switch_type(category_type)
                                        >
                                            {category_type.label()}
                                        </button>
                                    }
                                })
                                .collect_view()}
                        </div>
                        <SearchInput
                            initial=vm.search.get_untracked()
                            on_change=on_search
                            placeholder="Search categories..."
                        />
                        <select
                            class="form__select"
                            title="Display language"
                            on:change=move |ev| vm.language.set(event_target_value(&ev))
                            prop:value=move || vm.language.get()
                        >
                            {SUPPORTED_LANGUAGES
                                .into_iter()
                                .map(|code| view! { <option value=code>{language_label(code)}</option> })
                                .collect_view()}
                        </select>
                    </Flex>
                </div>

                <div class="toolbar">
                    <Flex gap=FlexGap::Small>
                        <Button appearance=ButtonAppearance::Primary on_click=move |_| vm.add(None)>
                            {icon("plus")}
                            " Add category"
                        </Button>
                        <Button appearance=ButtonAppearance::Subtle on_click=move |_| vm.expand_all()>
                            {icon("expand")}
                            " Expand all"
                        </Button>
                        <Button appearance=ButtonAppearance::Subtle on_click=move |_| vm.collapse_all()>
                            {icon("collapse")}
                            " Collapse all"
                        </Button>
                        <Button
                            appearance=ButtonAppearance::Subtle
                            on_click=move |_| vm.modal.set(Some(ManagerModal::Translations))
                        >
                            {icon("languages")}
                            " Translations"
                        </Button>
                        <Button
                            appearance=ButtonAppearance::Subtle
                            on_click=move |_| vm.modal.set(Some(ManagerModal::Transfer))
                        >
                            {icon("download")}
                            " Import / Export"
                        </Button>
                        <Button
                            appearance=ButtonAppearance::Subtle
                            on_click=move |_| vm.modal.set(Some(ManagerModal::Statistics))
                        >
                            {icon("bar-chart")}
                            " Statistics"
                        </Button>
                    </Flex>
                </div>

                <Show when=move || !vm.validation_errors.get().is_empty()>
                    <div class="alert alert--error">
                        <strong>"Cannot save:"</strong>
                        <ul>
                            {move || {
                                vm.validation_errors
                                    .get()
                                    .into_iter()
                                    .map(|e| view! { <li>{e}</li> })
                                    .collect_view()
                            }}
                        </ul>
                    </div>
                </Show>

                <Show
                    when=move || !vm.loading.get()
                    fallback=|| view! { <div class="loading">"Loading categories..."</div> }
                >
                    <CategoryTree vm=vm />
                </Show>

                <div class="save-bar">
                    <Input
                        value=vm.change_description
                        placeholder="Describe the change (optional)"
                    />
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=move |_| vm.save()
                        disabled=Signal::derive(move || !vm.has_changes() || vm.saving.get())
                    >
                        {icon("save")}
                        {move || if vm.saving.get() { " Saving..." } else { " Save" }}
                    </Button>
                </div>
            </div>

            {move || match vm.modal.get() {
                Some(ManagerModal::Edit(key)) => {
                    view! { <EditCategoryModal vm=vm category_key=key on_close=close_modal /> }.into_any()
                }
                Some(ManagerModal::Translations) => {
                    view! { <TranslationsModal vm=vm on_close=close_modal /> }.into_any()
                }
                Some(ManagerModal::Transfer) => {
                    view! { <TransferModal vm=vm on_close=close_modal /> }.into_any()
                }
                Some(ManagerModal::Statistics) => {
                    view! { <StatisticsModal vm=vm on_close=close_modal /> }.into_any()
                }
                Some(ManagerModal::History) => {
                    view! { <HistoryModal vm=vm on_close=close_modal /> }.into_any()
                }
                None => view! { <></> }.into_any(),
            }}
        </PageFrame>
    }
}
