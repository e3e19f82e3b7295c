use leptos::prelude::Effect;
use leptos::prelude::*;
use std::collections::HashMap;
use web_sys::window;

#[derive(Clone, Copy)]
pub struct AppGlobalContext {
    pub opened: RwSignal<Vec<Tab>>,
    pub active: RwSignal<Option<String>>,
    pub left_open: RwSignal<bool>,
}

impl AppGlobalContext {
    pub fn new() -> Self {
        Self {
            opened: RwSignal::new(vec![]),
            active: RwSignal::new(None),
            left_open: RwSignal::new(true),
        }
    }

    /// Восстанавливает активный таб из `?active=..` и дальше держит URL в
    /// синхронизации с ним. Остальные параметры URL принадлежат страницам.
    pub fn init_router_integration(&self) {
        let search = window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        let params: HashMap<String, String> =
            serde_qs::from_str(search.trim_start_matches('?')).unwrap_or_default();
        if let Some(active_key) = params.get("active").cloned() {
            let title = super::tabs::tab_label_for_key(&active_key);
            self.open_tab(&active_key, title);
        } else {
            self.open_tab("a001_category", super::tabs::tab_label_for_key("a001_category"));
        }

        let this = *self;
        Effect::new(move |_| {
            let Some(active_key) = this.active.get() else {
                return;
            };
            let current_search = window()
                .and_then(|w| w.location().search().ok())
                .unwrap_or_default();
            let mut params: HashMap<String, String> =
                serde_qs::from_str(current_search.trim_start_matches('?')).unwrap_or_default();

            // Параметры страницы живут только пока открыт её таб
            if params.get("active") != Some(&active_key) {
                params.clear();
                params.insert("active".to_string(), active_key);
            }

            let new_url = format!("?{}", serde_qs::to_string(&params).unwrap_or_default());
            // Only update URL if it actually changed
            if current_search != new_url {
                replace_url(&new_url);
            }
        });
    }

    pub fn open_tab(&self, key: &str, title: &str) {
        leptos::logging::log!("open_tab: key='{}', title='{}'", key, title);
        let exists = self
            .opened
            .with_untracked(|tabs| tabs.iter().any(|tab| tab.key == key));
        if !exists {
            let tab = Tab {
                key: key.to_string(),
                title: title.to_string(),
                dirty: false,
            };
            self.opened.update(|tabs| tabs.push(tab));
        }
        self.activate_tab(key);
    }

    pub fn activate_tab(&self, key: &str) {
        self.active.set(Some(key.to_string()));
    }

    pub fn update_tab_title(&self, key: &str, new_title: &str) {
        self.opened.update(|tabs| {
            if let Some(tab) = tabs.iter_mut().find(|t| t.key == key) {
                tab.title = new_title.to_string();
            }
        });
    }

    /// Отметка о несохранённых изменениях на заголовке таба
    pub fn set_tab_dirty(&self, key: &str, dirty: bool) {
        let changed = self.opened.with_untracked(|tabs| {
            tabs.iter().any(|t| t.key == key && t.dirty != dirty)
        });
        if changed {
            self.opened.update(|tabs| {
                if let Some(tab) = tabs.iter_mut().find(|t| t.key == key) {
                    tab.dirty = dirty;
                }
            });
        }
    }

    pub fn close_tab(&self, key: &str) {
        leptos::logging::log!("close_tab: key='{}'", key);
        self.opened.update(|tabs| tabs.retain(|tab| tab.key != key));
        if self
            .active
            .with_untracked(|active| active.as_deref() == Some(key))
        {
            let next_active = self
                .opened
                .with_untracked(|tabs| tabs.last().map(|t| t.key.clone()));
            self.active.set(next_active);
        }
    }

    pub fn toggle_left(&self) {
        self.left_open.update(|val| *val = !*val);
    }
}

impl Default for AppGlobalContext {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn replace_url(url: &str) {
    if let Some(w) = window() {
        if let Ok(history) = w.history() {
            let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub key: String,
    pub title: String,
    pub dirty: bool,
}
