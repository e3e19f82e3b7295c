use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Модальное окно: затемнение, поверхность с заголовком и кнопкой закрытия.
///
/// Закрывается по клику на затемнение, только если и нажатие, и отпускание
/// кнопки мыши были на нём (выделение текста внутри окна не закрывает его).
#[component]
pub fn ModalFrame(
    #[prop(into)] title: Signal<String>,
    on_close: Callback<()>,
    /// Ширина поверхности, CSS (по умолчанию 640px)
    #[prop(optional, into)]
    width: Option<String>,
    #[prop(optional)] z_index: Option<i32>,
    children: Children,
) -> impl IntoView {
    let z_index = z_index.unwrap_or(1000);
    let width = width.unwrap_or_else(|| "640px".to_string());
    let overlay_mouse_down = RwSignal::new(false);

    let is_direct_overlay_event = |ev: &ev::MouseEvent| -> bool {
        match (ev.target(), ev.current_target()) {
            (Some(t), Some(ct)) => t == ct,
            _ => false,
        }
    };

    // Закрытие откладывается на следующий тик: обработчик не должен снимать
    // собственный overlay во время диспатча клика.
    let close_deferred = move || {
        spawn_local(async move {
            TimeoutFuture::new(0).await;
            on_close.run(());
        });
    };

    let handle_overlay_click = move |ev: ev::MouseEvent| {
        let should_close = overlay_mouse_down.get_untracked() && is_direct_overlay_event(&ev);
        overlay_mouse_down.set(false);
        if should_close {
            close_deferred();
        }
    };

    view! {
        <div
            class="modal-overlay"
            style=format!("z-index: {z_index};")
            on:mousedown=move |ev| overlay_mouse_down.set(is_direct_overlay_event(&ev))
            on:click=handle_overlay_click
        >
            <div
                class="modal"
                style=format!("position: relative; width: {width}; max-width: 95vw;")
                on:click=|ev: ev::MouseEvent| ev.stop_propagation()
            >
                <div class="modal__header">
                    <h3 class="modal__title">{move || title.get()}</h3>
                    <button class="modal__close" title="Close" on:click=move |_| close_deferred()>
                        "×"
                    </button>
                </div>
                <div class="modal__body">{children()}</div>
            </div>
        </div>
    }
}

/// Нативный диалог подтверждения браузера
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}
