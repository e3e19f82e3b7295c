/// Утилиты для списков и деревьев: подсветка поиска, сортировка, страницы
use crate::shared::url_state::{Debouncer, URL_DEBOUNCE_MS};
use leptos::prelude::*;

/// Байтовые диапазоны совпадений `filter` в `text` без учёта регистра
pub fn match_ranges(text: &str, filter: &str) -> Vec<(usize, usize)> {
    let needle: Vec<char> = filter.trim().to_lowercase().chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + needle.len() <= chars.len() {
        let matched = needle.iter().enumerate().all(|(offset, expected)| {
            chars[i + offset].1.to_lowercase().eq(std::iter::once(*expected))
        });
        if matched {
            let start = chars[i].0;
            let end = chars
                .get(i + needle.len())
                .map_or(text.len(), |(index, _)| *index);
            ranges.push((start, end));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    ranges
}

/// Подсветка совпадений в тексте (case-insensitive)
pub fn highlight_matches(text: &str, filter: &str) -> AnyView {
    let ranges = match_ranges(text, filter);
    if ranges.is_empty() {
        return view! { <span>{text.to_string()}</span> }.into_any();
    }

    let mut parts: Vec<AnyView> = Vec::new();
    let mut last_pos = 0;
    for (start, end) in ranges {
        if start > last_pos {
            parts.push(view! { <span>{text[last_pos..start].to_string()}</span> }.into_any());
        }
        parts.push(
            view! { <mark class="search-match">{text[start..end].to_string()}</mark> }.into_any(),
        );
        last_pos = end;
    }
    if last_pos < text.len() {
        parts.push(view! { <span>{text[last_pos..].to_string()}</span> }.into_any());
    }

    view! { <>{parts}</> }.into_any()
}

/// Поле поиска: ввод виден сразу, `on_change` вызывается после паузы
#[component]
pub fn SearchInput(
    /// Начальное значение (например, из URL)
    #[prop(optional, into)]
    initial: String,
    #[prop(into)] on_change: Callback<String>,
    #[prop(optional, into)] placeholder: String,
) -> impl IntoView {
    let placeholder = if placeholder.is_empty() {
        "Search...".to_string()
    } else {
        placeholder
    };
    let input_value = RwSignal::new(initial);
    let debouncer = Debouncer::new();

    let handle_input = move |value: String| {
        input_value.set(value.clone());
        debouncer.run(URL_DEBOUNCE_MS, move || on_change.run(value));
    };

    let clear = move |_| {
        input_value.set(String::new());
        on_change.run(String::new());
    };

    view! {
        <div class="search-input" class:search-input--active=move || !input_value.get().trim().is_empty()>
            <input
                type="text"
                placeholder=placeholder
                prop:value=move || input_value.get()
                on:input=move |ev| handle_input(event_target_value(&ev))
            />
            <Show when=move || !input_value.get().is_empty()>
                <button class="search-input__clear" on:click=clear title="Clear">
                    {crate::shared::icons::icon("x")}
                </button>
            </Show>
        </div>
    }
}

/// Получить индикатор сортировки для заголовка
pub fn get_sort_indicator(current_field: &str, field: &str, ascending: bool) -> &'static str {
    if current_field == field {
        if ascending {
            " ▲"
        } else {
            " ▼"
        }
    } else {
        " ⇅"
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// Элементы страницы `page` (с нуля); номер за пределами обрезается
pub fn page_slice<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page = page.min(page_count(items.len(), page_size) - 1);
    items
        .iter()
        .skip(page * page_size)
        .take(page_size)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ranges_is_case_insensitive() {
        assert_eq!(match_ranges("Home & Garden", "home"), vec![(0, 4)]);
        assert_eq!(match_ranges("abcABC", "bc"), vec![(1, 3), (4, 6)]);
        assert!(match_ranges("Shoes", "").is_empty());
        assert!(match_ranges("Shoes", "hats").is_empty());
    }

    #[test]
    fn match_ranges_handles_multibyte_text() {
        let text = "Électronique";
        let ranges = match_ranges(text, "élec");
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].0..ranges[0].1], "Élec");
    }

    #[test]
    fn paging() {
        let items: Vec<i32> = (1..=7).collect();
        assert_eq!(page_count(7, 3), 3);
        assert_eq!(page_count(0, 3), 1);
        assert_eq!(page_slice(&items, 1, 3), vec![4, 5, 6]);
        assert_eq!(page_slice(&items, 9, 3), vec![7]);
    }

    #[test]
    fn sort_indicator() {
        assert_eq!(get_sort_indicator("name", "name", true), " ▲");
        assert_eq!(get_sort_indicator("name", "priority", true), " ⇅");
    }
}
