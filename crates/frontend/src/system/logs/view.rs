use super::api;
use crate::shared::date_utils::format_datetime;
use crate::shared::icons::icon;
use crate::shared::list_utils::highlight_matches;
use crate::shared::modal_frame::confirm;
use crate::shared::page_frame::PageFrame;
use crate::shared::page_standard::PAGE_CAT_SYSTEM;
use crate::shared::toast::use_toasts;
use contracts::shared::logger::LogEntry;
use leptos::prelude::*;
use thaw::*;
use wasm_bindgen_futures::spawn_local;

const LIMIT_OPTIONS: [u64; 4] = [100, 500, 1000, 5000];

fn matches_filter(entry: &LogEntry, source: &str, filter: &str) -> bool {
    if !source.is_empty() && entry.source != source {
        return false;
    }
    let filter = filter.trim().to_lowercase();
    filter.is_empty()
        || entry.message.to_lowercase().contains(&filter)
        || entry.category.to_lowercase().contains(&filter)
}

/// Системный журнал: записи сервера и клиента
#[component]
pub fn LogViewer() -> impl IntoView {
    let toasts = use_toasts();
    let entries = RwSignal::new(Vec::<LogEntry>::new());
    let loading = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let limit = RwSignal::new(500u64);
    let source = RwSignal::new(String::new());
    let filter = RwSignal::new(String::new());

    let load = move || {
        loading.set(true);
        let limit = limit.get_untracked();
        spawn_local(async move {
            match api::fetch_logs(limit).await {
                Ok(list) => {
                    entries.set(list);
                    error.set(None);
                }
                Err(e) => error.set(Some(format!("Failed to load logs: {}", e))),
            }
            loading.set(false);
        });
    };
    load();

    let clear = move |_| {
        if !confirm("Delete all log entries?") {
            return;
        }
        spawn_local(async move {
            match api::clear_logs().await {
                Ok(()) => {
                    entries.set(Vec::new());
                    toasts.success("Logs cleared");
                }
                Err(e) => toasts.error(format!("Failed to clear logs: {}", e)),
            }
        });
    };

    let visible = Memo::new(move |_| {
        let source = source.get();
        let filter = filter.get();
        entries.with(|list| {
            list.iter()
                .filter(|e| matches_filter(e, &source, &filter))
                .cloned()
                .collect::<Vec<_>>()
        })
    });

    view! {
        <PageFrame page_id="sys_logs--system" category=PAGE_CAT_SYSTEM>
            <div class="page__header">
                <div class="page__header-left">
                    {icon("file-text")}
                    <h1 class="page__title">"Logs"</h1>
                    <span class="badge">{move || visible.with(|v| v.len())}</span>
                </div>
                <div class="page__header-right">
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=move |_| load()
                        disabled=Signal::derive(move || loading.get())
                    >
                        {icon("refresh")}
                        " Refresh"
                    </Button>
                    <Button appearance=ButtonAppearance::Subtle on_click=clear>
                        {icon("trash")}
                        " Clear"
                    </Button>
                </div>
            </div>

            <div class="page__content">
                <div class="filter-panel">
                    <Flex gap=FlexGap::Small align=FlexAlign::Center>
                        <select
                            class="form__select"
                            prop:value=move || source.get()
                            on:change=move |ev| source.set(event_target_value(&ev))
                        >
                            <option value="">"All sources"</option>
                            <option value="server">"Server"</option>
                            <option value="client">"Client"</option>
                        </select>
                        <select
                            class="form__select"
                            prop:value=move || limit.get().to_string()
                            on:change=move |ev| {
                                if let Ok(value) = event_target_value(&ev).parse::<u64>() {
                                    limit.set(value);
                                    load();
                                }
                            }
                        >
                            {LIMIT_OPTIONS
                                .into_iter()
                                .map(|n| view! { <option value=n.to_string()>{format!("Last {}", n)}</option> })
                                .collect_view()}
                        </select>
                        <Input value=filter placeholder="Filter messages..." />
                    </Flex>
                </div>

                {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}

                <Table>
                    <TableHeader>
                        <TableRow>
                            <TableHeaderCell resizable=false min_width=150.0>"Time"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=80.0>"Source"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=120.0>"Category"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=400.0>"Message"</TableHeaderCell>
                        </TableRow>
                    </TableHeader>
                    <TableBody>
                        {move || {
                            let filter = filter.get();
                            visible
                                .get()
                                .into_iter()
                                .map(|entry| {
                                    let message_view = highlight_matches(&entry.message, &filter);
                                    view! {
                                        <TableRow>
                                            <TableCell>{format_datetime(&entry.timestamp)}</TableCell>
                                            <TableCell>
                                                <span class=format!("badge badge--{}", entry.source)>
                                                    {entry.source.clone()}
                                                </span>
                                            </TableCell>
                                            <TableCell>{entry.category.clone()}</TableCell>
                                            <TableCell>
                                                <TableCellLayout truncate=true>
                                                    {message_view}
                                                </TableCellLayout>
                                            </TableCell>
                                        </TableRow>
                                    }
                                })
                                .collect_view()
                        }}
                    </TableBody>
                </Table>
            </div>
        </PageFrame>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, category: &str, message: &str) -> LogEntry {
        LogEntry {
            id: 1,
            timestamp: "2024-03-01T10:00:00Z".to_string(),
            source: source.to_string(),
            category: category.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn filter_by_source_and_text() {
        let e = entry("client", "category", "Bulk save #3");
        assert!(matches_filter(&e, "", ""));
        assert!(matches_filter(&e, "client", "BULK"));
        assert!(matches_filter(&e, "", "categ"));
        assert!(!matches_filter(&e, "server", ""));
        assert!(!matches_filter(&e, "", "delete"));
    }
}
