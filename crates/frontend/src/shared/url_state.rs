//! Состояние страниц в query-параметрах URL.
//!
//! Параметр `active` принадлежит `AppGlobalContext`, остальные - активной
//! странице. Запись в URL откладывается, пока пользователь печатает.

use crate::layout::global_context::replace_url;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen_futures::spawn_local;

pub const URL_DEBOUNCE_MS: u32 = 300;

fn current_search() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

/// Разбирает query-строку (с `?` или без) в состояние страницы
pub fn parse_query<T: DeserializeOwned + Default>(search: &str) -> T {
    serde_qs::from_str(search.trim_start_matches('?')).unwrap_or_default()
}

/// Query-строка для состояния страницы с сохранением активного таба
pub fn build_query<T: Serialize>(active: Option<&str>, state: &T) -> String {
    let page = serde_qs::to_string(state).unwrap_or_default();
    match (active, page.is_empty()) {
        (Some(active), true) => format!("?active={}", urlencoding::encode(active)),
        (Some(active), false) => format!("?active={}&{}", urlencoding::encode(active), page),
        (None, _) => format!("?{}", page),
    }
}

pub fn read_query<T: DeserializeOwned + Default>() -> T {
    parse_query(&current_search())
}

pub fn write_query<T: Serialize>(active: Option<&str>, state: &T) {
    replace_url(&build_query(active, state));
}

/// Откладывает действие; новый вызов отменяет предыдущий
#[derive(Clone, Copy)]
pub struct Debouncer {
    generation: StoredValue<u64>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            generation: StoredValue::new(0),
        }
    }

    pub fn run(&self, delay_ms: u32, action: impl FnOnce() + 'static) {
        let generation = self.generation.get_value() + 1;
        self.generation.set_value(generation);
        let stored = self.generation;
        spawn_local(async move {
            TimeoutFuture::new(delay_ms).await;
            if stored.try_get_value() == Some(generation) {
                action();
            }
        });
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct ListState {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        search: String,
        #[serde(default)]
        page: usize,
    }

    #[test]
    fn query_keeps_active_tab() {
        let state = ListState {
            search: "fee".into(),
            page: 2,
        };
        let query = build_query(Some("a002_commission_rule"), &state);
        assert_eq!(query, "?active=a002_commission_rule&search=fee&page=2");
        assert_eq!(parse_query::<ListState>(&query), state);
    }

    #[test]
    fn broken_query_falls_back_to_default() {
        assert_eq!(parse_query::<ListState>("?page=abc"), ListState::default());
        assert_eq!(parse_query::<ListState>(""), ListState::default());
    }
}
