//! Clipboard writes for the copy buttons.

#![allow(clippy::unused_async)]

/// Copy `text`; resolves to `false` when the browser refuses or there is
/// no clipboard.
pub async fn copy_text(text: String) -> bool {
    #[cfg(feature = "csr")]
    {
        let Some(clipboard) = web_sys::window().and_then(|w| w.navigator().clipboard()) else {
            return false;
        };
        let promise = clipboard.write_text(&text);
        wasm_bindgen_futures::JsFuture::from(promise).await.is_ok()
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = text;
        false
    }
}
