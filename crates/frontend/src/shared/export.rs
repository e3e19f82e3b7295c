/// Скачивание файлов из браузера: JSON-экспорт дерева и CSV с сервера
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

pub const MIME_JSON: &str = "application/json;charset=utf-8;";

/// Сохраняет текст как файл через временный Blob
pub fn download_text(content: &str, filename: &str, mime: &str) -> Result<(), String> {
    let array = js_sys::Array::new();
    array.push(&wasm_bindgen::JsValue::from_str(content));

    let properties = BlobPropertyBag::new();
    properties.set_type(mime);

    let blob = Blob::new_with_str_sequence_and_options(&array, &properties)
        .map_err(|e| format!("Failed to create blob: {:?}", e))?;

    let url = Url::create_object_url_with_blob(&blob)
        .map_err(|e| format!("Failed to create object URL: {:?}", e))?;
    let result = click_link(&url, Some(filename));
    Url::revoke_object_url(&url).map_err(|e| format!("Failed to revoke URL: {:?}", e))?;
    result
}

/// Скачивание файла, который отдаёт сервер (имя берётся из Content-Disposition)
pub fn download_url(url: &str) -> Result<(), String> {
    click_link(url, None)
}

fn click_link(href: &str, filename: Option<&str>) -> Result<(), String> {
    let window = web_sys::window().ok_or("No window object")?;
    let document = window.document().ok_or("No document object")?;
    let body = document.body().ok_or("No body element")?;

    let anchor = document
        .create_element("a")
        .map_err(|e| format!("Failed to create anchor: {:?}", e))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|e| format!("Failed to cast to anchor: {:?}", e))?;

    anchor.set_href(href);
    anchor.set_download(filename.unwrap_or(""));
    anchor
        .style()
        .set_property("display", "none")
        .map_err(|e| format!("Failed to set style: {:?}", e))?;

    body.append_child(&anchor)
        .map_err(|e| format!("Failed to append anchor: {:?}", e))?;
    anchor.click();
    body.remove_child(&anchor)
        .map_err(|e| format!("Failed to remove anchor: {:?}", e))?;

    Ok(())
}

/// Текстовое содержимое выбранного пользователем файла
pub async fn read_file_text(file: &web_sys::File) -> Result<String, String> {
    let text = wasm_bindgen_futures::JsFuture::from(file.text())
        .await
        .map_err(|e| format!("Failed to read file: {:?}", e))?;
    text.as_string()
        .ok_or_else(|| "File is not a text file".to_string())
}

/// Первый файл, выбранный в `<input type="file">`
pub fn selected_file(ev: &web_sys::Event) -> Option<web_sys::File> {
    ev.target()?
        .dyn_into::<web_sys::HtmlInputElement>()
        .ok()?
        .files()?
        .get(0)
}
