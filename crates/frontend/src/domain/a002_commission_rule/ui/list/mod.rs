pub mod state;

use self::state::{sort_rules, RuleListUrlState};
use super::super::api;
use crate::domain::a001_category::api::HttpCategoryGateway;
use crate::layout::global_context::AppGlobalContext;
use crate::layout::tabs::tab_labels::{detail_tab_label, rule_detail_key};
use crate::shared::components::pagination_controls::PaginationControls;
use crate::shared::date_utils::format_utc;
use crate::shared::icons::icon;
use crate::shared::list_utils::{get_sort_indicator, highlight_matches, page_count, page_slice, SearchInput};
use crate::shared::page_frame::PageFrame;
use crate::shared::page_standard::PAGE_CAT_LIST;
use crate::shared::url_state::{read_query, write_query, Debouncer, URL_DEBOUNCE_MS};
use contracts::domain::a001_category::localization::get_name;
use contracts::domain::a001_category::{CategoryGateway, CategoryType, ENGLISH};
use contracts::domain::a002_commission_rule::{CommissionRule, RuleState};
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;
use thaw::*;
use wasm_bindgen_futures::spawn_local;

const TAB_KEY: &str = "a002_commission_rule";

fn scope_text(rule: &CommissionRule) -> String {
    match (rule.category_type, rule.category_path.as_deref()) {
        (None, _) => "All categories".to_string(),
        (Some(t), None) => t.label().to_string(),
        (Some(t), Some(path)) => format!("{} / {}", t.label(), path),
    }
}

fn validity_text(rule: &CommissionRule) -> String {
    let day = |d: &chrono::DateTime<chrono::Utc>| d.format("%Y-%m-%d").to_string();
    match (&rule.valid_from, &rule.valid_to) {
        (None, None) => "Always".to_string(),
        (Some(from), None) => format!("from {}", day(from)),
        (None, Some(to)) => format!("until {}", day(to)),
        (Some(from), Some(to)) => format!("{} - {}", day(from), day(to)),
    }
}

/// Список правил комиссий. Фильтры, сортировка и страница живут в URL.
#[component]
pub fn CommissionRuleList() -> impl IntoView {
    let ctx = leptos::context::use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    let state = RwSignal::new(read_query::<RuleListUrlState>());
    let rules = RwSignal::new(Vec::<CommissionRule>::new());
    let loading = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let page_size = RwSignal::new(25usize);
    // Пути категорий выбранного типа для фильтра подкатегории: (path, name)
    let subcategories = RwSignal::new(Vec::<(String, String)>::new());

    let url_debounce = Debouncer::new();
    let request_seq = StoredValue::new(0u64);

    // URL пишем только пока таб активен: иначе он перетрёт чужие параметры
    Effect::new(move |_| {
        let snapshot = state.get();
        url_debounce.run(URL_DEBOUNCE_MS, move || {
            if ctx.active.get_untracked().as_deref() == Some(TAB_KEY) {
                write_query(Some(TAB_KEY), &snapshot);
            }
        });
    });

    let query = Memo::new(move |_| state.with(|s| s.to_query()));

    let fetch = move || {
        let q = query.get_untracked();
        let seq = request_seq.get_value() + 1;
        request_seq.set_value(seq);
        loading.set(true);
        spawn_local(async move {
            let result = api::fetch_rules(&q).await;
            // Ответ на устаревший запрос не нужен
            if request_seq.get_value() != seq {
                return;
            }
            match result {
                Ok(list) => {
                    rules.set(list);
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        query.track();
        fetch();
    });

    let category_filter = Memo::new(move |_| state.with(|s| CategoryType::parse(&s.category)));
    Effect::new(move |_| {
        let Some(category_type) = category_filter.get() else {
            subcategories.set(Vec::new());
            return;
        };
        spawn_local(async move {
            match HttpCategoryGateway.fetch_all(category_type).await {
                Ok(mut categories) => {
                    categories.sort_by(|a, b| a.path.cmp(&b.path));
                    subcategories.set(
                        categories
                            .iter()
                            .map(|c| (c.path.clone(), get_name(c, ENGLISH).to_string()))
                            .collect(),
                    );
                }
                Err(e) => {
                    log::warn!("failed to load categories for filter: {}", e);
                    subcategories.set(Vec::new());
                }
            }
        });
    });

    let sorted = Memo::new(move |_| {
        let (field, ascending) = state.with(|s| s.sort_order());
        let mut list = rules.get();
        sort_rules(&mut list, &field, ascending);
        list
    });
    let total_count = Signal::derive(move || sorted.with(|r| r.len()));
    let total_pages = Signal::derive(move || page_count(total_count.get(), page_size.get()));
    let current_page = Signal::derive(move || {
        let page = state.with(|s| s.current_page()) - 1;
        page.min(total_pages.get().saturating_sub(1))
    });
    let visible = Memo::new(move |_| {
        sorted.with(|r| page_slice(r, current_page.get(), page_size.get()))
    });

    let open_rule = move |id: Option<String>, name: &str| {
        let key = rule_detail_key(id.as_deref());
        ctx.open_tab(&key, &detail_tab_label(CommissionRule::element_name(), name));
    };

    let sort_header = move |field: &'static str, title: &'static str| {
        view! {
            <span class="table__sortable" on:click=move |_| state.update(|s| s.toggle_sort(field))>
                {title}
                {move || {
                    let (current, ascending) = state.with(|s| s.sort_order());
                    get_sort_indicator(&current, field, ascending)
                }}
            </span>
        }
    };

    view! {
        <PageFrame page_id="a002_commission_rule--list" category=PAGE_CAT_LIST>
            <div class="page__header">
                <div class="page__header-left">
                    {icon("percent")}
                    <h1 class="page__title">{CommissionRule::list_name()}</h1>
                </div>
                <div class="page__header-right">
                    <Button appearance=ButtonAppearance::Primary on_click=move |_| open_rule(None, "")>
                        {icon("plus")}
                        " New rule"
                    </Button>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| fetch()>
                        {icon("refresh")}
                        " Refresh"
                    </Button>
                </div>
            </div>

            <div class="page__content">
                <div class="filter-panel">
                    <Flex gap=FlexGap::Small align=FlexAlign::Center>
                        <input
                            class="form__input"
                            placeholder="Team"
                            prop:value=move || state.with(|s| s.team.clone())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                state.update(|s| s.set_filter(|s| s.team = value));
                            }
                        />
                        <select
                            class="form__select"
                            prop:value=move || state.with(|s| s.category.clone())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                state.update(|s| s.set_filter(|s| {
                                    s.category = value;
                                    s.subcategory.clear();
                                }));
                            }
                        >
                            <option value="">"All category types"</option>
                            {CategoryType::ALL
                                .into_iter()
                                .map(|t| view! { <option value=t.as_str()>{t.label()}</option> })
                                .collect_view()}
                        </select>
                        <select
                            class="form__select"
                            disabled=move || category_filter.get().is_none()
                            prop:value=move || state.with(|s| s.subcategory.clone())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                state.update(|s| s.set_filter(|s| s.subcategory = value));
                            }
                        >
                            <option value="">"All subcategories"</option>
                            {move || {
                                subcategories
                                    .get()
                                    .into_iter()
                                    .map(|(path, name)| {
                                        let label = format!("{} ({})", name, path);
                                        view! { <option value=path>{label}</option> }
                                    })
                                    .collect_view()
                            }}
                        </select>
                        <select
                            class="form__select"
                            prop:value=move || state.with(|s| s.state.clone())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                state.update(|s| s.set_filter(|s| s.state = value));
                            }
                        >
                            <option value="">"Any state"</option>
                            {RuleState::ALL
                                .into_iter()
                                .map(|st| view! { <option value=st.as_str()>{st.label()}</option> })
                                .collect_view()}
                        </select>
                        <SearchInput
                            initial=state.with_untracked(|s| s.search.clone())
                            on_change=Callback::new(move |value: String| {
                                state.update(|s| s.set_filter(|s| s.search = value));
                            })
                            placeholder="Search name or formula..."
                        />
                    </Flex>
                </div>

                {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}

                <Table>
                    <TableHeader>
                        <TableRow>
                            <TableHeaderCell resizable=false min_width=200.0>{sort_header("name", "Name")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=100.0>{sort_header("state", "State")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=80.0>{sort_header("priority", "Priority")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=120.0>{sort_header("team", "Team")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=180.0>{sort_header("scope", "Scope")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=160.0>{sort_header("valid_from", "Validity")}</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=220.0>"Formula"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=150.0>{sort_header("updated_at", "Updated")}</TableHeaderCell>
                        </TableRow>
                    </TableHeader>
                    <TableBody>
                        {move || {
                            let search = state.with(|s| s.search.clone());
                            let list = visible.get();
                            if list.is_empty() && !loading.get() {
                                return view! {
                                    <TableRow>
                                        <TableCell>"No rules match the filters"</TableCell>
                                    </TableRow>
                                }
                                .into_any();
                            }
                            list.into_iter()
                                .map(|rule| {
                                    let id = rule.to_string_id();
                                    let name = rule.name.clone();
                                    let state_class = format!("badge badge--{}", rule.state.as_str());
                                    let name_view = highlight_matches(&rule.name, &search);
                                    let team_id = rule.team_id.clone();
                                    let scope = scope_text(&rule);
                                    let validity = validity_text(&rule);
                                    let formula_view = highlight_matches(&rule.formula, &search);
                                    view! {
                                        <TableRow>
                                            <TableCell>
                                                <TableCellLayout truncate=true>
                                                    <a
                                                        href="#"
                                                        class="table__link"
                                                        on:click=move |e| {
                                                            e.prevent_default();
                                                            open_rule(Some(id.clone()), &name);
                                                        }
                                                    >
                                                        {name_view}
                                                    </a>
                                                </TableCellLayout>
                                            </TableCell>
                                            <TableCell>
                                                <span class=state_class>{rule.state.label()}</span>
                                            </TableCell>
                                            <TableCell>{rule.priority}</TableCell>
                                            <TableCell>
                                                <TableCellLayout truncate=true>{team_id}</TableCellLayout>
                                            </TableCell>
                                            <TableCell>
                                                <TableCellLayout truncate=true>{scope}</TableCellLayout>
                                            </TableCell>
                                            <TableCell>{validity}</TableCell>
                                            <TableCell>
                                                <TableCellLayout truncate=true>
                                                    <code>{formula_view}</code>
                                                </TableCellLayout>
                                            </TableCell>
                                            <TableCell>{format_utc(&rule.metadata.updated_at)}</TableCell>
                                        </TableRow>
                                    }
                                })
                                .collect_view()
                                .into_any()
                        }}
                    </TableBody>
                </Table>

                <PaginationControls
                    current_page=current_page
                    total_pages=total_pages
                    total_count=total_count
                    page_size=page_size
                    on_page_change=Callback::new(move |page: usize| state.update(|s| s.page = page + 1))
                    on_page_size_change=Callback::new(move |size: usize| {
                        page_size.set(size);
                        state.update(|s| s.page = 1);
                    })
                />
            </div>
        </PageFrame>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::domain::a002_commission_rule::CommissionRuleDto;

    #[test]
    fn scope_and_validity_texts() {
        let mut rule = CommissionRule::new_for_insert(&CommissionRuleDto {
            team_id: "t".to_string(),
            name: "Base".to_string(),
            formula: "amount * 0.05".to_string(),
            ..Default::default()
        });
        assert_eq!(scope_text(&rule), "All categories");
        assert_eq!(validity_text(&rule), "Always");

        rule.category_type = Some(CategoryType::Brand);
        rule.category_path = Some("shoes".to_string());
        rule.valid_from = Some(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(scope_text(&rule), "Brand / shoes");
        assert_eq!(validity_text(&rule), "from 2024-01-01");
    }
}
