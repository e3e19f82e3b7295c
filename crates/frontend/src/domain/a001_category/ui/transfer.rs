use super::super::api;
use super::view_model::CategoryManagerVm;
use crate::shared::export::{download_text, download_url, read_file_text, selected_file, MIME_JSON};
use crate::shared::icons::icon;
use crate::shared::modal_frame::{confirm, ModalFrame};
use crate::shared::toast::use_toasts;
use contracts::domain::a001_category::transfer::{parse_import, CategoryExportFile, ImportMode, ImportSummary};
use leptos::prelude::*;
use thaw::*;
use wasm_bindgen_futures::spawn_local;

fn summary_text(summary: &ImportSummary) -> String {
    format!(
        "Import staged: {} added, {} updated, {} removed. Save to apply.",
        summary.added, summary.updated, summary.removed
    )
}

/// Экспорт дерева в JSON/CSV и импорт из JSON в рабочий набор
#[component]
pub fn TransferModal(vm: CategoryManagerVm, on_close: Callback<()>) -> impl IntoView {
    let toasts = use_toasts();
    let mode = RwSignal::new(ImportMode::default());
    let file = StoredValue::new_local(None::<web_sys::File>);
    let file_name = RwSignal::new(None::<String>);
    let importing = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let export_json = move |_| {
        let export = vm
            .working
            .with_untracked(|w| CategoryExportFile::new(w.category_type(), w.categories()));
        let result = export
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| download_text(&json, &export.file_name(), MIME_JSON));
        if let Err(e) = result {
            toasts.error(format!("Export failed: {}", e));
        }
    };

    let export_csv = move |_| {
        let url = api::export_csv_url(vm.category_type.get_untracked());
        if let Err(e) = download_url(&url) {
            toasts.error(format!("Export failed: {}", e));
        }
    };

    let on_file = move |ev: leptos::ev::Event| {
        let selected = selected_file(&ev);
        file_name.set(selected.as_ref().map(|f| f.name()));
        file.set_value(selected);
        error.set(None);
    };

    let run_import = move |_| {
        let Some(f) = file.get_value() else {
            error.set(Some("Choose a file to import".to_string()));
            return;
        };
        if vm.is_locked() {
            error.set(Some("Wait until the current save finishes".to_string()));
            return;
        }
        let mode = mode.get_untracked();
        if mode == ImportMode::Replace
            && !confirm("Replace mode removes categories that are not in the file. Continue?")
        {
            return;
        }
        let category_type = vm.category_type.get_untracked();
        importing.set(true);
        spawn_local(async move {
            let parsed = read_file_text(&f)
                .await
                .and_then(|text| parse_import(&text, category_type).map_err(|e| e.to_string()));
            importing.set(false);
            match parsed {
                Ok(_) if vm.is_locked() => {
                    error.set(Some("Wait until the current save finishes".to_string()));
                }
                Ok(categories) => {
                    let Some(summary) = vm.working.try_update(|w| w.stage_import(categories, mode))
                    else {
                        return;
                    };
                    vm.expand_all();
                    vm.validation_errors.set(Vec::new());
                    toasts.success(summary_text(&summary));
                    on_close.run(());
                }
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
        <ModalFrame title="Import / Export" on_close=on_close>
            <div class="modal-body">
                <h3 class="modal-section__title">"Export"</h3>
                <Flex gap=FlexGap::Small>
                    <Button appearance=ButtonAppearance::Secondary on_click=export_json>
                        {icon("download")}
                        " JSON (current tree)"
                    </Button>
                    <Button appearance=ButtonAppearance::Secondary on_click=export_csv>
                        {icon("file-text")}
                        " CSV (saved tree)"
                    </Button>
                </Flex>

                <h3 class="modal-section__title">"Import"</h3>
                {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}
                <div class="form">
                    <input type="file" accept=".json,application/json" on:change=on_file />
                    {move || file_name.get().map(|n| view! { <div class="form__hint">{n}</div> })}
                    <label class="form__radio">
                        <input
                            type="radio"
                            name="import-mode"
                            prop:checked=move || mode.get() == ImportMode::Merge
                            on:change=move |_| mode.set(ImportMode::Merge)
                        />
                        " Merge: update matching paths, add new ones"
                    </label>
                    <label class="form__radio">
                        <input
                            type="radio"
                            name="import-mode"
                            prop:checked=move || mode.get() == ImportMode::Replace
                            on:change=move |_| mode.set(ImportMode::Replace)
                        />
                        " Replace: the file becomes the whole tree"
                    </label>
                    <div class="form__hint">"Imported changes stay local until you save."</div>
                </div>
            </div>

            <div class="modal-footer">
                <Flex gap=FlexGap::Small justify=FlexJustify::End>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| on_close.run(())>
                        "Close"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=run_import
                        disabled=Signal::derive(move || importing.get() || file_name.get().is_none())
                    >
                        {icon("upload")}
                        {move || if importing.get() { " Importing..." } else { " Import" }}
                    </Button>
                </Flex>
            </div>
        </ModalFrame>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_every_count() {
        let text = summary_text(&ImportSummary {
            added: 2,
            updated: 1,
            removed: 0,
        });
        assert!(text.contains("2 added"));
        assert!(text.contains("1 updated"));
        assert!(text.contains("0 removed"));
    }
}
