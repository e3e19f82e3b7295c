use super::super::api;
use super::view_model::CategoryManagerVm;
use crate::shared::date_utils::format_utc;
use crate::shared::icons::icon;
use crate::shared::logger::log_client;
use crate::shared::modal_frame::{confirm, ModalFrame};
use crate::shared::toast::use_toasts;
use contracts::domain::a001_category::history::{
    CategoryHistoryDetails, CategoryHistoryEntry, HistoryChange, HistoryChangeKind,
};
use leptos::prelude::*;
use thaw::*;
use wasm_bindgen_futures::spawn_local;

fn kind_label(kind: HistoryChangeKind) -> (&'static str, &'static str) {
    match kind {
        HistoryChangeKind::Added => ("added", "history-change--added"),
        HistoryChangeKind::Removed => ("removed", "history-change--removed"),
        HistoryChangeKind::Modified => ("modified", "history-change--modified"),
    }
}

fn change_row(change: HistoryChange) -> impl IntoView {
    let (label, class) = kind_label(change.kind);
    let fields = change.fields.join(", ");
    view! {
        <li class=format!("history-change {}", class)>
            <span class="history-change__kind">{label}</span>
            <span class="history-change__name">{change.name}</span>
            <span class="history-change__path">{change.path}</span>
            {(!fields.is_empty()).then(|| view! { <span class="history-change__fields">{fields}</span> })}
        </li>
    }
}

fn description_or_default(entry: &CategoryHistoryEntry) -> String {
    if entry.change_description.trim().is_empty() {
        "(no description)".to_string()
    } else {
        entry.change_description.clone()
    }
}

/// История сохранений дерева текущего типа с просмотром отличий и откатом
#[component]
pub fn HistoryModal(vm: CategoryManagerVm, on_close: Callback<()>) -> impl IntoView {
    let toasts = use_toasts();
    let category_type = vm.category_type.get_untracked();
    let entries = RwSignal::new(Vec::<CategoryHistoryEntry>::new());
    let details = RwSignal::new(None::<CategoryHistoryDetails>);
    let loading = RwSignal::new(true);
    let recovering = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    spawn_local(async move {
        match api::fetch_history(category_type).await {
            Ok(list) => entries.set(list),
            Err(e) => error.set(Some(e)),
        }
        loading.set(false);
    });

    let open_details = move |id: i64| {
        loading.set(true);
        spawn_local(async move {
            match api::fetch_history_details(id).await {
                Ok(d) => {
                    error.set(None);
                    details.set(Some(d));
                }
                Err(e) => error.set(Some(e)),
            }
            loading.set(false);
        });
    };

    let recover = move |id: i64| {
        if vm.has_changes()
            && !confirm("Recovering replaces the tree and discards unsaved changes. Continue?")
        {
            return;
        }
        if vm.is_locked() {
            toasts.error("Wait until the current save finishes");
            return;
        }
        if !confirm(&format!("Restore the tree from history entry #{}?", id)) {
            return;
        }
        recovering.set(true);
        spawn_local(async move {
            match api::recover(id).await {
                Ok(response) => {
                    vm.apply_server_state(response.categories);
                    toasts.success(format!("Restored from entry #{}", id));
                    log_client("category", format!("recovered history #{}", id));
                    on_close.run(());
                }
                Err(e) => toasts.error(format!("Recovery failed: {}", e)),
            }
            recovering.set(false);
        });
    };

    let list_view = move || {
        let list = entries.get();
        if list.is_empty() {
            return view! { <div class="empty-state">"No saved versions yet"</div> }.into_any();
        }
        view! {
            <Table>
                <TableHeader>
                    <TableRow>
                        <TableHeaderCell resizable=false min_width=60.0>"#"</TableHeaderCell>
                        <TableHeaderCell resizable=false min_width=160.0>"Saved at"</TableHeaderCell>
                        <TableHeaderCell resizable=false min_width=240.0>"Description"</TableHeaderCell>
                        <TableHeaderCell resizable=false min_width=90.0>"Categories"</TableHeaderCell>
                    </TableRow>
                </TableHeader>
                <TableBody>
                    {list
                        .into_iter()
                        .map(|entry| {
                            let id = entry.id;
                            let description = description_or_default(&entry);
                            view! {
                                <TableRow>
                                    <TableCell>
                                        <a
                                            href="#"
                                            class="table__link"
                                            on:click=move |e| {
                                                e.prevent_default();
                                                open_details(id);
                                            }
                                        >
                                            {format!("#{}", id)}
                                        </a>
                                    </TableCell>
                                    <TableCell>{format_utc(&entry.changed_at)}</TableCell>
                                    <TableCell>
                                        <TableCellLayout truncate=true>
                                            {description}
                                        </TableCellLayout>
                                    </TableCell>
                                    <TableCell>{entry.category_count}</TableCell>
                                </TableRow>
                            }
                        })
                        .collect_view()}
                </TableBody>
            </Table>
        }
        .into_any()
    };

    let details_view = move |d: CategoryHistoryDetails| {
        let id = d.entry.id;
        let changes = d.changes;
        view! {
            <div class="history-details">
                <Flex justify=FlexJustify::SpaceBetween align=FlexAlign::Center>
                    <Button appearance=ButtonAppearance::Subtle on_click=move |_| details.set(None)>
                        {icon("chevron-left")}
                        " All versions"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=move |_| recover(id)
                        disabled=Signal::derive(move || recovering.get())
                    >
                        {icon("undo")}
                        " Restore this version"
                    </Button>
                </Flex>
                <div class="history-details__meta">
                    <strong>{format!("#{} ", id)}</strong>
                    {format_utc(&d.entry.changed_at)}
                    " - "
                    {description_or_default(&d.entry)}
                    {format!(" ({} categories)", d.categories.len())}
                </div>
                {if changes.is_empty() {
                    view! { <div class="empty-state">"No differences from the previous version"</div> }
                        .into_any()
                } else {
                    view! {
                        <ul class="history-changes">
                            {changes.into_iter().map(change_row).collect_view()}
                        </ul>
                    }
                    .into_any()
                }}
            </div>
        }
    };

    view! {
        <ModalFrame
            title=format!("History: {}", category_type.label())
            on_close=on_close
            width="820px"
        >
            {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}
            <div class="modal-body modal-body--scroll">
                {move || {
                    if loading.get() {
                        return view! { <div class="loading">"Loading..."</div> }.into_any();
                    }
                    match details.get() {
                        Some(d) => details_view(d).into_any(),
                        None => list_view(),
                    }
                }}
            </div>
        </ModalFrame>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::domain::a001_category::CategoryType;

    #[test]
    fn blank_description_gets_placeholder() {
        let mut entry = CategoryHistoryEntry {
            id: 1,
            category_type: CategoryType::Consumer,
            change_description: "  ".to_string(),
            changed_at: Utc::now(),
            category_count: 3,
        };
        assert_eq!(description_or_default(&entry), "(no description)");

        entry.change_description = "Renamed shoes".to_string();
        assert_eq!(description_or_default(&entry), "Renamed shoes");
    }
}
