use super::super::api;
use crate::layout::global_context::AppGlobalContext;
use crate::layout::tabs::tab_labels::{detail_tab_label, rule_detail_key};
use crate::shared::icons::icon;
use crate::shared::page_frame::PageFrame;
use crate::shared::page_standard::PAGE_CAT_LIST;
use crate::shared::url_state::{read_query, write_query};
use contracts::domain::a002_commission_rule::{CommissionRule, ConflictKind, RuleConflict};
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use thaw::*;
use wasm_bindgen_futures::spawn_local;

const TAB_KEY: &str = "a002_commission_rule_conflicts";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct ConflictsUrlState {
    #[serde(skip_serializing_if = "String::is_empty")]
    team: String,
}

fn kind_label(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::SamePriority => "Same priority",
        ConflictKind::DuplicateFormula => "Duplicate formula",
    }
}

/// Пересекающиеся правила одной команды
#[component]
pub fn RuleConflictsPage() -> impl IntoView {
    let ctx = leptos::context::use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    let team = RwSignal::new(read_query::<ConflictsUrlState>().team);
    let conflicts = RwSignal::new(None::<Vec<RuleConflict>>);
    let loading = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let load = move || {
        let team_id = team.get_untracked().trim().to_string();
        if team_id.is_empty() {
            error.set(Some("Enter a team to check".to_string()));
            return;
        }
        write_query(Some(TAB_KEY), &ConflictsUrlState { team: team_id.clone() });
        loading.set(true);
        spawn_local(async move {
            match api::fetch_conflicts(&team_id).await {
                Ok(list) => {
                    conflicts.set(Some(list));
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
            loading.set(false);
        });
    };

    if !team.get_untracked().trim().is_empty() {
        load();
    }

    let open_rule = move |id: String| {
        ctx.open_tab(
            &rule_detail_key(Some(&id)),
            &detail_tab_label(CommissionRule::element_name(), &id),
        );
    };

    let rule_link = move |id: String| {
        let label = id.chars().take(8).collect::<String>();
        view! {
            <a
                href="#"
                class="table__link"
                title=id.clone()
                on:click=move |e| {
                    e.prevent_default();
                    open_rule(id.clone());
                }
            >
                {label}
            </a>
        }
    };

    view! {
        <PageFrame page_id="a002_commission_rule_conflicts--list" category=PAGE_CAT_LIST>
            <div class="page__header">
                <div class="page__header-left">
                    {icon("alert")}
                    <h1 class="page__title">"Rule Conflicts"</h1>
                </div>
            </div>

            <div class="page__content">
                <div class="filter-panel">
                    <Flex gap=FlexGap::Small align=FlexAlign::Center>
                        <Input value=team placeholder="Team" />
                        <Button
                            appearance=ButtonAppearance::Primary
                            on_click=move |_| load()
                            disabled=Signal::derive(move || loading.get())
                        >
                            {icon("refresh")}
                            " Check"
                        </Button>
                    </Flex>
                </div>

                {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}

                {move || match conflicts.get() {
                    None => view! {
                        <div class="empty-state">"Enter a team to look for overlapping rules"</div>
                    }
                    .into_any(),
                    Some(list) if list.is_empty() => view! {
                        <div class="alert alert--success">"No conflicts found"</div>
                    }
                    .into_any(),
                    Some(list) => view! {
                        <Table>
                            <TableHeader>
                                <TableRow>
                                    <TableHeaderCell resizable=false min_width=140.0>"Kind"</TableHeaderCell>
                                    <TableHeaderCell resizable=false min_width=100.0>"Rule A"</TableHeaderCell>
                                    <TableHeaderCell resizable=false min_width=100.0>"Rule B"</TableHeaderCell>
                                    <TableHeaderCell resizable=false min_width=320.0>"Details"</TableHeaderCell>
                                </TableRow>
                            </TableHeader>
                            <TableBody>
                                {list
                                    .into_iter()
                                    .map(|c| {
                                        view! {
                                            <TableRow>
                                                <TableCell>
                                                    <span class="badge badge--warning">{kind_label(c.kind)}</span>
                                                </TableCell>
                                                <TableCell>{rule_link(c.rule_a)}</TableCell>
                                                <TableCell>{rule_link(c.rule_b)}</TableCell>
                                                <TableCell>
                                                    <TableCellLayout truncate=true>{c.message}</TableCellLayout>
                                                </TableCell>
                                            </TableRow>
                                        }
                                    })
                                    .collect_view()}
                            </TableBody>
                        </Table>
                    }
                    .into_any(),
                }}
            </div>
        </PageFrame>
    }
}
