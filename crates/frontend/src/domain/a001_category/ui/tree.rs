use super::view_model::{CategoryManagerVm, DropTarget, ManagerModal};
use crate::shared::icons::{category_icon, icon};
use crate::shared::list_utils::highlight_matches;
use contracts::domain::a001_category::localization::{get_missing_translations, get_name};
use contracts::domain::a001_category::{EditableCategory, TreeRow};
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

const INDENT_PX: i32 = 20;

/// Верхняя половина строки - вставка перед ней, нижняя - внутрь
fn drop_target_for(ev: &ev::DragEvent, key: &str) -> DropTarget {
    let height = ev
        .current_target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|el| el.offset_height())
        .unwrap_or(0);
    if height > 0 && ev.offset_y() > height / 2 {
        DropTarget::Into(key.to_string())
    } else {
        DropTarget::Before(key.to_string())
    }
}

fn status_badges(item: &EditableCategory) -> AnyView {
    let mut badges: Vec<AnyView> = Vec::new();
    if item.is_new {
        badges.push(view! { <span class="tree-badge tree-badge--new">"new"</span> }.into_any());
    } else if item.is_dirty {
        badges.push(
            view! { <span class="tree-badge tree-badge--modified">"modified"</span> }.into_any(),
        );
    }
    if !item.category.is_active {
        badges.push(
            view! { <span class="tree-badge tree-badge--inactive">"inactive"</span> }.into_any(),
        );
    }
    let missing = get_missing_translations(&item.category).len();
    if missing > 0 {
        badges.push(
            view! {
                <span class="tree-badge" title="Languages without a translation">
                    {format!("{} missing", missing)}
                </span>
            }
            .into_any(),
        );
    }
    view! { <>{badges}</> }.into_any()
}

fn render_row(vm: CategoryManagerVm, row: TreeRow, drag_enabled: bool) -> AnyView {
    let Some(item) = vm.working.with_untracked(|w| w.get(&row.key).cloned()) else {
        return view! { <></> }.into_any();
    };
    let language = vm.language.get_untracked();
    let filter = vm.search.get_untracked();

    let key = row.key.clone();
    let name = get_name(&item.category, &language).to_string();
    let image = vm.image_url(&key, item.category.image_id.as_deref());
    let icon_view = match item.category.icon_name.as_deref() {
        Some(name) => category_icon(name),
        None if row.has_children && row.is_expanded => icon("folder-open"),
        None if row.has_children => icon("folder-closed"),
        None => icon("item"),
    };

    let toggle: AnyView = if row.has_children {
        let key = key.clone();
        view! {
            <button class="tree-toggle" on:click=move |_| vm.toggle(&key)>
                {if row.is_expanded { icon("chevron-down") } else { icon("chevron-right") }}
            </button>
        }
        .into_any()
    } else {
        view! { <span class="tree-toggle tree-toggle--empty"></span> }.into_any()
    };

    let row_class = {
        let key = key.clone();
        move || {
            let mut class = String::from("tree-row");
            match vm.drop_target.get() {
                Some(DropTarget::Before(k)) if k == key => class.push_str(" tree-row--drop-before"),
                Some(DropTarget::Into(k)) if k == key => class.push_str(" tree-row--drop-into"),
                _ => {}
            }
            if vm.dragged.get().as_deref() == Some(key.as_str()) {
                class.push_str(" tree-row--dragging");
            }
            class
        }
    };

    let key_drag = key.clone();
    let key_over = key.clone();
    let key_drop = key.clone();
    let key_add = key.clone();
    let key_edit = key.clone();
    let key_delete = key.clone();
    let key_active = key.clone();
    let is_active = item.category.is_active;

    view! {
        <div
            class=row_class
            draggable=if drag_enabled { "true" } else { "false" }
            data-key=key.clone()
            on:dragstart=move |ev: ev::DragEvent| {
                if let Some(dt) = ev.data_transfer() {
                    let _ = dt.set_data("text/plain", &key_drag);
                    dt.set_effect_allowed("move");
                }
                vm.start_drag(&key_drag);
            }
            on:dragover=move |ev: ev::DragEvent| {
                if vm.dragged.get_untracked().is_none() {
                    return;
                }
                ev.prevent_default();
                let target = drop_target_for(&ev, &key_over);
                if vm.drop_target.get_untracked().as_ref() != Some(&target) {
                    vm.drop_target.set(Some(target));
                }
            }
            on:drop=move |ev: ev::DragEvent| {
                ev.prevent_default();
                ev.stop_propagation();
                vm.drop_on(drop_target_for(&ev, &key_drop));
            }
            on:dragend=move |_| vm.end_drag()
        >
            <div class="tree-row__main" style=format!("padding-left: {}px;", row.depth * INDENT_PX)>
                {drag_enabled.then(|| view! { <span class="tree-row__grip">{icon("grip")}</span> })}
                {toggle}
                <span class="tree-row__icon">{icon_view}</span>
                {image.map(|url| view! { <img class="tree-row__thumb" src=url alt="" /> })}
                <span
                    class="tree-row__label"
                    on:dblclick=move |_| vm.modal.set(Some(ManagerModal::Edit(key_edit.clone())))
                >
                    {highlight_matches(&name, &filter)}
                </span>
                {status_badges(&item)}
            </div>
            <div class="tree-row__actions">
                <input
                    type="checkbox"
                    title="Active"
                    prop:checked=is_active
                    on:change=move |ev| vm.set_active(&key_active, event_target_checked(&ev))
                />
                <button class="tree-action" title="Add subcategory" on:click=move |_| vm.add(Some(key_add.clone()))>
                    {icon("plus")}
                </button>
                <button
                    class="tree-action"
                    title="Edit"
                    on:click={
                        let key = key.clone();
                        move |_| vm.modal.set(Some(ManagerModal::Edit(key.clone())))
                    }
                >
                    {icon("edit")}
                </button>
                <button class="tree-action tree-action--danger" title="Delete" on:click=move |_| vm.delete(&key_delete)>
                    {icon("trash")}
                </button>
            </div>
        </div>
    }
    .into_any()
}

/// Дерево категорий с раскрытием веток и перетаскиванием строк
#[component]
pub fn CategoryTree(vm: CategoryManagerVm) -> impl IntoView {
    let rows = Memo::new(move |_| vm.rows());
    let drag_enabled = Memo::new(move |_| vm.drag_enabled());

    view! {
        <div class="category-tree" on:dragleave=move |_| vm.drop_target.set(None)>
            {move || {
                let rows = rows.get();
                if rows.is_empty() {
                    let message = if vm.is_searching() {
                        "Nothing matches the search"
                    } else {
                        "No categories yet. Use \"Add category\" to create the first one."
                    };
                    return view! { <div class="category-tree__empty">{message}</div> }.into_any();
                }
                let enabled = drag_enabled.get();
                rows.into_iter()
                    .map(|row| render_row(vm, row, enabled))
                    .collect_view()
                    .into_any()
            }}
            <Show when=move || drag_enabled.get() && vm.dragged.get().is_some()>
                <div
                    class="category-tree__drop-end"
                    class:category-tree__drop-end--active=move || vm.drop_target.get() == Some(DropTarget::End)
                    on:dragover=move |ev: ev::DragEvent| {
                        ev.prevent_default();
                        vm.drop_target.set(Some(DropTarget::End));
                    }
                    on:drop=move |ev: ev::DragEvent| {
                        ev.prevent_default();
                        vm.drop_on(DropTarget::End);
                    }
                >
                    "Drop here to move to the top level"
                </div>
            </Show>
        </div>
    }
}
