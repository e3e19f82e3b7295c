use super::view_model::CategoryManagerVm;
use crate::shared::modal_frame::ModalFrame;
use contracts::domain::a001_category::aggregate::language_label;
use contracts::domain::a001_category::localization::{get_description, get_name, has_translation};
use contracts::domain::a001_category::statistics::CategoryStatistics;
use contracts::domain::a001_category::{CategoryLocalization, ENGLISH, SUPPORTED_LANGUAGES};
use leptos::prelude::*;
use thaw::*;

/// Строка таблицы переводов
#[derive(Debug, Clone, PartialEq)]
struct TranslationRow {
    key: String,
    path: String,
    english: String,
    translation: Option<String>,
}

fn translation_rows(vm: &CategoryManagerVm, language: &str, only_missing: bool) -> Vec<TranslationRow> {
    vm.working.with(|w| {
        let mut rows: Vec<TranslationRow> = w
            .items()
            .iter()
            .filter(|i| !only_missing || !has_translation(&i.category, language))
            .map(|i| TranslationRow {
                key: i.key().to_string(),
                path: i.category.path.clone(),
                english: get_name(&i.category, ENGLISH).to_string(),
                translation: has_translation(&i.category, language)
                    .then(|| get_name(&i.category, language).to_string()),
            })
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    })
}

/// Массовое заполнение переводов для одного языка. Правки сразу попадают в
/// рабочий набор, как и любые другие локальные изменения.
#[component]
pub fn TranslationsModal(vm: CategoryManagerVm, on_close: Callback<()>) -> impl IntoView {
    let first_foreign = SUPPORTED_LANGUAGES
        .into_iter()
        .find(|code| *code != ENGLISH)
        .unwrap_or(ENGLISH);
    let language = RwSignal::new(first_foreign.to_string());
    let only_missing = RwSignal::new(false);

    let coverage = Memo::new(move |_| {
        let code = language.get();
        vm.working.with(|w| {
            CategoryStatistics::compute(&w.categories())
                .coverage
                .into_iter()
                .find(|c| c.language_code == code)
        })
    });

    let commit = move |key: String, value: String| {
        let code = language.get_untracked();
        let value = value.trim().to_string();
        if value.is_empty() {
            vm.mutate(|w| w.remove_translation(&key, &code));
            return;
        }
        let description = vm.working.with_untracked(|w| {
            w.get(&key)
                .filter(|i| has_translation(&i.category, &code))
                .map(|i| get_description(&i.category, &code).to_string())
                .unwrap_or_default()
        });
        vm.mutate(|w| {
            w.set_translation(
                &key,
                CategoryLocalization::new(code.clone(), value).with_description(description),
            )
        });
    };

    view! {
        <ModalFrame title="Translations" on_close=on_close width="820px">
            <div class="filter-panel">
                <Flex gap=FlexGap::Medium align=FlexAlign::Center>
                    <Label>"Language"</Label>
                    <select
                        class="form__select"
                        prop:value=move || language.get()
                        on:change=move |ev| language.set(event_target_value(&ev))
                    >
                        {SUPPORTED_LANGUAGES
                            .into_iter()
                            .filter(|code| *code != ENGLISH)
                            .map(|code| view! { <option value=code>{language_label(code)}</option> })
                            .collect_view()}
                    </select>
                    <label class="form__checkbox">
                        <input
                            type="checkbox"
                            prop:checked=move || only_missing.get()
                            on:change=move |ev| only_missing.set(event_target_checked(&ev))
                        />
                        " Only missing"
                    </label>
                    {move || {
                        coverage
                            .get()
                            .map(|c| {
                                view! {
                                    <span class="coverage-hint">
                                        {format!(
                                            "{} of {} translated ({:.0}%)",
                                            c.translated,
                                            c.translated + c.missing,
                                            c.percent(),
                                        )}
                                    </span>
                                }
                            })
                    }}
                </Flex>
            </div>

            <div class="modal-body modal-body--scroll">
                <Table>
                    <TableHeader>
                        <TableRow>
                            <TableHeaderCell resizable=false min_width=200.0>"Path"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=180.0>"English"</TableHeaderCell>
                            <TableHeaderCell resizable=false min_width=220.0>
                                {move || language_label(&language.get())}
                            </TableHeaderCell>
                        </TableRow>
                    </TableHeader>
                    <TableBody>
                        {move || {
                            let rows = translation_rows(&vm, &language.get(), only_missing.get());
                            if rows.is_empty() {
                                return view! {
                                    <TableRow>
                                        <TableCell>"All categories are translated"</TableCell>
                                    </TableRow>
                                }
                                .into_any();
                            }
                            rows.into_iter()
                                .map(|row| {
                                    let key = row.key.clone();
                                    let missing = row.translation.is_none();
                                    let english = row.english.clone();
                                    view! {
                                        <TableRow>
                                            <TableCell>
                                                <TableCellLayout truncate=true>{row.path}</TableCellLayout>
                                            </TableCell>
                                            <TableCell>
                                                <TableCellLayout truncate=true>{english}</TableCellLayout>
                                            </TableCell>
                                            <TableCell>
                                                <input
                                                    class="form__input"
                                                    class:form__input--missing=missing
                                                    placeholder=row.english
                                                    prop:value=row.translation.unwrap_or_default()
                                                    on:change=move |ev| commit(key.clone(), event_target_value(&ev))
                                                />
                                            </TableCell>
                                        </TableRow>
                                    }
                                })
                                .collect_view()
                                .into_any()
                        }}
                    </TableBody>
                </Table>
            </div>

            <div class="modal-footer">
                <Flex justify=FlexJustify::End>
                    <Button appearance=ButtonAppearance::Primary on_click=move |_| on_close.run(())>
                        "Done"
                    </Button>
                </Flex>
            </div>
        </ModalFrame>
    }
}
