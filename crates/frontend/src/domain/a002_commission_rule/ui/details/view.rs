use super::view_model::{next_states, RuleDetailsVm, RuleForm};
use crate::layout::global_context::AppGlobalContext;
use crate::layout::tabs::tab_labels::{detail_tab_label, rule_detail_key};
use crate::shared::icons::icon;
use crate::shared::modal_frame::confirm;
use crate::shared::page_frame::PageFrame;
use crate::shared::page_standard::PAGE_CAT_DETAIL;
use crate::shared::toast::use_toasts;
use contracts::domain::a001_category::CategoryType;
use contracts::domain::a002_commission_rule::{CommissionRule, FORMULA_VARIABLES};
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;
use thaw::*;

/// Поле формы, привязанное к одному строковому полю `RuleForm`
fn text_field(
    vm: RuleDetailsVm,
    label: &'static str,
    input_type: &'static str,
    get: fn(&RuleForm) -> String,
    set: fn(&mut RuleForm, String),
) -> impl IntoView {
    view! {
        <div class="form__group">
            <label class="form__label">{label}</label>
            <input
                class="form__input"
                type=input_type
                prop:value=move || vm.form.with(get)
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    vm.form.update(|f| set(f, value));
                }
            />
        </div>
    }
}

/// Карточка правила комиссии: форма, редактор формулы с проверкой и
/// тестовым прогоном, смена состояния
#[component]
pub fn CommissionRuleDetails(
    id: Option<String>,
    tab_key: String,
    on_close: Callback<()>,
) -> impl IntoView {
    let ctx = leptos::context::use_context::<AppGlobalContext>().expect("AppGlobalContext not found");
    let vm = RuleDetailsVm::new(id, use_toasts());
    vm.load();

    let tab_key = StoredValue::new(tab_key);
    Effect::new(move |_| {
        let dirty = vm.is_dirty();
        tab_key.with_value(|key| ctx.set_tab_dirty(key, dirty));
    });

    // Новое правило после первого сохранения переезжает в свой таб
    let on_saved = Callback::new(move |rule: CommissionRule| {
        let title = detail_tab_label(CommissionRule::element_name(), &rule.name);
        let key = rule_detail_key(Some(&rule.to_string_id()));
        let current = tab_key.get_value();
        if key != current {
            ctx.close_tab(&current);
            ctx.open_tab(&key, &title);
        } else {
            ctx.update_tab_title(&key, &title);
        }
    });

    let on_delete = move |_| {
        let name = vm.form.with_untracked(|f| f.name.clone());
        if confirm(&format!("Delete rule \"{}\"?", name)) {
            vm.delete(on_close);
        }
    };

    let on_cancel = move |_| {
        if !vm.is_dirty() || confirm("Close without saving changes?") {
            on_close.run(());
        }
    };

    let title = move || {
        if vm.is_new() {
            "New commission rule".to_string()
        } else {
            vm.form.with(|f| f.name.clone())
        }
    };

    let state_panel = move || {
        vm.rule.get().map(|rule| {
            let current = rule.state;
            view! {
                <div class="state-panel">
                    <span class=format!("badge badge--{}", current.as_str())>{current.label()}</span>
                    {next_states(current)
                        .into_iter()
                        .map(|next| {
                            view! {
                                <Button
                                    appearance=ButtonAppearance::Subtle
                                    disabled=Signal::derive(move || vm.busy.get())
                                    on_click=move |_| vm.change_state(next)
                                >
                                    {format!("Move to {}", next.label())}
                                </Button>
                            }
                        })
                        .collect_view()}
                </div>
            }
        })
    };

    let validation_panel = move || {
        vm.validation.get().map(|v| {
            let class = if v.is_valid { "alert alert--success" } else { "alert alert--error" };
            view! {
                <div class=class>
                    {if v.is_valid { "Formula is valid" } else { "Formula has errors" }}
                    <ul>
                        {v.errors
                            .into_iter()
                            .map(|e| view! { <li>{format!("at {}: {}", e.position, e.message)}</li> })
                            .collect_view()}
                    </ul>
                    {(!v.variables.is_empty()).then(|| {
                        view! { <div class="form__hint">{format!("Uses: {}", v.variables.join(", "))}</div> }
                    })}
                </div>
            }
        })
    };

    let test_panel = move || {
        view! {
            <div class="formula-test">
                <div class="formula-test__inputs">
                    {FORMULA_VARIABLES
                        .iter()
                        .map(|(name, hint)| {
                            let name = name.to_string();
                            let name_for_input = name.clone();
                            view! {
                                <label class="formula-test__var" title=*hint>
                                    <span>{name.clone()}</span>
                                    <input
                                        class="form__input"
                                        inputmode="decimal"
                                        prop:value=move || {
                                            vm.test_inputs.with(|m| m.get(&name).cloned().unwrap_or_default())
                                        }
                                        on:input=move |ev| {
                                            let value = event_target_value(&ev);
                                            vm.test_inputs.update(|m| {
                                                m.insert(name_for_input.clone(), value);
                                            });
                                        }
                                    />
                                </label>
                            }
                        })
                        .collect_view()}
                </div>
                <Button appearance=ButtonAppearance::Secondary on_click=move |_| vm.test_formula()>
                    {icon("play")}
                    " Run test"
                </Button>
                {move || {
                    vm.test_result.get().map(|r| match (r.result, r.error) {
                        (Some(value), _) => view! {
                            <div class="alert alert--success">{format!("Result: {}", value)}</div>
                        }
                        .into_any(),
                        (None, Some(e)) => view! { <div class="alert alert--error">{e}</div> }.into_any(),
                        (None, None) => view! { <div class="alert">"No result"</div> }.into_any(),
                    })
                }}
            </div>
        }
    };

    view! {
        <PageFrame page_id="a002_commission_rule--detail" category=PAGE_CAT_DETAIL>
            <div class="page__header">
                <div class="page__header-left">
                    {icon("percent")}
                    <h1 class="page__title">{title}</h1>
                    <Show when=move || vm.is_dirty()>
                        <span class="badge badge--warning">"unsaved"</span>
                    </Show>
                </div>
                <div class="page__header-right">
                    <Button
                        appearance=ButtonAppearance::Primary
                        disabled=Signal::derive(move || vm.busy.get())
                        on_click=move |_| vm.save(on_saved)
                    >
                        {icon("save")}
                        " Save"
                    </Button>
                    <Show when=move || !vm.is_new()>
                        <Button appearance=ButtonAppearance::Subtle on_click=on_delete>
                            {icon("trash")}
                            " Delete"
                        </Button>
                    </Show>
                    <Button appearance=ButtonAppearance::Secondary on_click=on_cancel>
                        {icon("x")}
                        " Close"
                    </Button>
                </div>
            </div>

            <div class="page__content">
                {move || vm.error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}
                {state_panel}

                <div class="details-form">
                    {text_field(vm, "Team", "text", |f| f.team_id.clone(), |f, v| f.team_id = v)}
                    {text_field(vm, "Name", "text", |f| f.name.clone(), |f, v| f.name = v)}
                    <div class="form__group">
                        <label class="form__label">"Description"</label>
                        <textarea
                            class="form__textarea"
                            rows="2"
                            prop:value=move || vm.form.with(|f| f.description.clone())
                            on:input=move |ev| {
                                let value = event_target_value(&ev);
                                vm.form.update(|f| f.description = value);
                            }
                        ></textarea>
                    </div>
                    {text_field(vm, "Priority", "number", |f| f.priority.clone(), |f, v| f.priority = v)}
                    <div class="form__group">
                        <label class="form__label">"Category type"</label>
                        <select
                            class="form__select"
                            prop:value=move || vm.form.with(|f| f.category_type.clone())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                vm.form.update(|f| f.category_type = value);
                            }
                        >
                            <option value="">"All types"</option>
                            {CategoryType::ALL
                                .into_iter()
                                .map(|t| view! { <option value=t.as_str()>{t.label()}</option> })
                                .collect_view()}
                        </select>
                    </div>
                    {text_field(vm, "Category path", "text", |f| f.category_path.clone(), |f, v| f.category_path = v)}
                    {text_field(vm, "Valid from", "date", |f| f.valid_from.clone(), |f, v| f.valid_from = v)}
                    {text_field(vm, "Valid to", "date", |f| f.valid_to.clone(), |f, v| f.valid_to = v)}
                </div>

                <h3 class="section__title">"Formula"</h3>
                <div class="formula-editor">
                    <textarea
                        class="form__textarea formula-editor__input"
                        rows="4"
                        spellcheck="false"
                        prop:value=move || vm.form.with(|f| f.formula.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            vm.form.update(|f| f.formula = value);
                            vm.validation.set(None);
                        }
                    ></textarea>
                    <div class="formula-editor__vars">
                        {FORMULA_VARIABLES
                            .iter()
                            .map(|(name, hint)| {
                                view! {
                                    <button
                                        class="formula-editor__var"
                                        title=*hint
                                        on:click=move |_| {
                                            vm.form.update(|f| {
                                                if !f.formula.is_empty() && !f.formula.ends_with(' ') {
                                                    f.formula.push(' ');
                                                }
                                                f.formula.push_str(name);
                                            });
                                        }
                                    >
                                        {*name}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                    <div class="form__hint">
                        "Operators: + - * / % and comparisons; functions: min, max, abs, round, if"
                    </div>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| vm.validate_formula()>
                        {icon("check")}
                        " Validate"
                    </Button>
                    {validation_panel}
                </div>

                <h3 class="section__title">"Test"</h3>
                {test_panel}
            </div>
        </PageFrame>
    }
}
