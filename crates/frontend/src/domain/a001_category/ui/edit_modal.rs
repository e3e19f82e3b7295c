use super::view_model::CategoryManagerVm;
use crate::shared::export::selected_file;
use crate::shared::icons::{category_icon, icon};
use crate::shared::modal_frame::ModalFrame;
use contracts::domain::a001_category::aggregate::language_label;
use contracts::domain::a001_category::icons::CATEGORY_ICONS;
use contracts::domain::a001_category::localization::{get_description, get_name, has_translation};
use contracts::domain::a001_category::{
    Category, CategoryLocalization, ImageChange, PendingChanges, ENGLISH, SUPPORTED_LANGUAGES,
};
use leptos::prelude::*;
use thaw::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditTab {
    General,
    Translations,
}

/// Английское имя обязательно, остальные переводы - нет
fn check_pending(category: &Category) -> Result<(), String> {
    if get_name(category, ENGLISH).trim().is_empty() {
        return Err("English name is required".to_string());
    }
    Ok(())
}

/// Модальное окно редактирования одной категории. Изменения копятся в
/// `PendingChanges` и переносятся в рабочий набор только по "Apply".
#[component]
pub fn EditCategoryModal(
    vm: CategoryManagerVm,
    category_key: String,
    on_close: Callback<()>,
) -> impl IntoView {
    let Some(original) = vm
        .working
        .with_untracked(|w| w.get(&category_key).map(|i| i.category.clone()))
    else {
        return view! {
            <ModalFrame title="Edit category" on_close=on_close>
                <div class="alert alert--error">"Category no longer exists"</div>
            </ModalFrame>
        }
        .into_any();
    };

    let key = StoredValue::new(category_key);
    let original = StoredValue::new(original);
    let pending = RwSignal::new(PendingChanges::new());
    let tab = RwSignal::new(EditTab::General);
    let error = RwSignal::new(None::<String>);

    let file = StoredValue::new_local(None::<web_sys::File>);
    let preview = RwSignal::new(None::<String>);

    let edited = Memo::new(move |_| pending.with(|p| original.with_value(|c| p.apply_to(c))));

    let title = Signal::derive(move || {
        format!("Edit category: {}", edited.with(|c| get_name(c, ENGLISH).to_string()))
    });

    let release_preview = move || {
        if let Some(url) = preview.try_update(Option::take).flatten() {
            let _ = web_sys::Url::revoke_object_url(&url);
        }
    };

    let close = move || {
        release_preview();
        on_close.run(());
    };

    let apply = move |_| {
        let category = edited.get_untracked();
        if let Err(e) = check_pending(&category) {
            error.set(Some(e));
            return;
        }
        let changes = pending.get_untracked();
        let key = key.get_value();
        if vm.mutate(|w| w.apply_pending(&key, &changes)).is_none() {
            return;
        }
        match &changes.image {
            ImageChange::Replace { .. } => {
                if let Some(f) = file.get_value() {
                    vm.stage_file(&key, f);
                }
            }
            ImageChange::Remove => vm.forget_file(&key),
            ImageChange::Keep => {}
        }
        close();
    };

    // ------------------------------------------------------------------------
    // General tab
    // ------------------------------------------------------------------------

    let on_file = move |ev: leptos::ev::Event| {
        let Some(f) = selected_file(&ev) else {
            return;
        };
        release_preview();
        preview.set(web_sys::Url::create_object_url_with_blob(&f).ok());
        pending.update(|p| p.stage_image(ImageChange::Replace { file_name: f.name() }));
        file.set_value(Some(f));
    };

    let remove_image = move |_| {
        release_preview();
        file.set_value(None);
        pending.update(|p| p.stage_image(ImageChange::Remove));
    };

    let current_image = move || match pending.with(|p| p.image.clone()) {
        ImageChange::Remove => None,
        ImageChange::Replace { .. } => preview.get(),
        ImageChange::Keep => {
            let image_id = original.with_value(|c| c.image_id.clone());
            vm.image_url(&key.get_value(), image_id.as_deref())
        }
    };

    let general = move || {
        let selected_icon = edited.with(|c| c.icon_name.clone());
        view! {
            <div class="form">
                <label class="form__checkbox">
                    <input
                        type="checkbox"
                        prop:checked=move || edited.with(|c| c.is_active)
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            pending.update(|p| p.set_active(checked));
                        }
                    />
                    " Active"
                </label>

                <div class="form__group">
                    <Label>"Icon"</Label>
                    <div class="icon-picker">
                        <button
                            class="icon-picker__item"
                            class:icon-picker__item--selected=selected_icon.is_none()
                            title="No icon"
                            on:click=move |_| pending.update(|p| p.stage_icon(None))
                        >
                            {icon("x")}
                        </button>
                        {CATEGORY_ICONS
                            .iter()
                            .map(|(name, label)| {
                                let selected = selected_icon.as_deref() == Some(*name);
                                view! {
                                    <button
                                        class="icon-picker__item"
                                        class:icon-picker__item--selected=selected
                                        title=*label
                                        on:click=move |_| {
                                            pending.update(|p| p.stage_icon(Some(name.to_string())))
                                        }
                                    >
                                        {category_icon(name)}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                </div>

                <div class="form__group">
                    <Label>"Image"</Label>
                    <div class="image-field">
                        {move || match current_image() {
                            Some(url) => view! { <img class="image-field__preview" src=url alt="" /> }.into_any(),
                            None => view! { <div class="image-field__empty">"No image"</div> }.into_any(),
                        }}
                        <Flex gap=FlexGap::Small align=FlexAlign::Center>
                            <input type="file" accept="image/*" on:change=on_file />
                            <Button appearance=ButtonAppearance::Subtle on_click=remove_image>
                                {icon("trash")}
                                " Remove image"
                            </Button>
                        </Flex>
                        <Show when=move || pending.with(|p| p.image != ImageChange::Keep)>
                            <div class="form__hint">"The image is uploaded when the tree is saved"</div>
                        </Show>
                    </div>
                </div>
            </div>
        }
    };

    // ------------------------------------------------------------------------
    // Translations tab
    // ------------------------------------------------------------------------

    let language = RwSignal::new(ENGLISH.to_string());
    let name = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());

    let load_language = move |code: String| {
        let (n, d) = edited.with_untracked(|c| {
            (get_name(c, &code).to_string(), get_description(c, &code).to_string())
        });
        // get_name откатывается на английский; для пустого перевода поле пустое
        let has = edited.with_untracked(|c| has_translation(c, &code));
        name.set(if has || code == ENGLISH { n } else { String::new() });
        description.set(if has { d } else { String::new() });
        language.set(code);
    };
    load_language(ENGLISH.to_string());

    let stage_translation = move |_| {
        let code = language.get_untracked();
        let value = name.get_untracked();
        if value.trim().is_empty() {
            error.set(Some(format!("Name for {} is empty", language_label(&code))));
            return;
        }
        error.set(None);
        let localization =
            CategoryLocalization::new(code, value.trim()).with_description(description.get_untracked());
        pending.update(|p| p.stage_localization(localization));
    };

    let remove_translation = move |_| {
        let code = language.get_untracked();
        pending.update(|p| p.stage_removal(&code));
        load_language(code);
    };

    let translations = move || {
        view! {
            <div class="form">
                <table class="translation-table">
                    <tbody>
                        {SUPPORTED_LANGUAGES
                            .into_iter()
                            .map(|code| {
                                let translated = move || edited.with(|c| has_translation(c, code));
                                view! {
                                    <tr
                                        class="translation-table__row"
                                        class:translation-table__row--selected=move || language.get() == code
                                        on:click=move |_| load_language(code.to_string())
                                    >
                                        <td>{language_label(code)}</td>
                                        <td>
                                            {move || {
                                                if translated() {
                                                    edited.with(|c| get_name(c, code).to_string())
                                                } else {
                                                    "(missing)".to_string()
                                                }
                                            }}
                                        </td>
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>

                <div class="form__group">
                    <Label>{move || format!("Name ({})", language_label(&language.get()))}</Label>
                    <Input value=name placeholder="Name" />
                </div>
                <div class="form__group">
                    <Label>"Description"</Label>
                    <textarea
                        class="form__textarea"
                        rows="3"
                        prop:value=move || description.get()
                        on:input=move |ev| description.set(event_target_value(&ev))
                    ></textarea>
                </div>
                <Flex gap=FlexGap::Small>
                    <Button appearance=ButtonAppearance::Secondary on_click=stage_translation>
                        {icon("check")}
                        " Set translation"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Subtle
                        on_click=remove_translation
                        disabled=Signal::derive(move || language.get() == ENGLISH)
                    >
                        {icon("trash")}
                        " Remove translation"
                    </Button>
                </Flex>
            </div>
        }
    };

    view! {
        <ModalFrame title=title on_close=Callback::new(move |_| close()) width="720px">
            <div class="modal-tabs">
                <button
                    class="modal-tabs__item"
                    class:modal-tabs__item--active=move || tab.get() == EditTab::General
                    on:click=move |_| tab.set(EditTab::General)
                >
                    "General"
                </button>
                <button
                    class="modal-tabs__item"
                    class:modal-tabs__item--active=move || tab.get() == EditTab::Translations
                    on:click=move |_| tab.set(EditTab::Translations)
                >
                    "Translations"
                </button>
            </div>

            {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}

            <div class="modal-body">
                {move || match tab.get() {
                    EditTab::General => general().into_any(),
                    EditTab::Translations => translations().into_any(),
                }}
            </div>

            <div class="modal-footer">
                <Flex gap=FlexGap::Small justify=FlexJustify::End>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| close()>
                        "Cancel"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=apply
                        disabled=Signal::derive(move || pending.with(|p| p.is_empty()) || vm.saving.get())
                    >
                        "Apply"
                    </Button>
                </Flex>
            </div>
        </ModalFrame>
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_category::CategoryType;

    #[test]
    fn pending_without_english_name_is_rejected() {
        let mut category = Category::new(CategoryType::Consumer, "books", None, 0, "Books");
        assert!(check_pending(&category).is_ok());

        category.localizations[0].name = "  ".to_string();
        assert!(check_pending(&category).is_err());
    }
}
