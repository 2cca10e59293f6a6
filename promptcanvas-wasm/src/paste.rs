//! Browser clipboard payloads.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::Uint8Array;
use promptcanvas::{ClipboardData, ClipboardItem, ClipboardPayload, ClipboardSource, Error};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ClipboardEvent, File};

/// Snapshot of a paste event's `DataTransfer`. Strings are read while the
/// event is live; file bytes are read later, behind the ingestion guard.
pub struct DataTransferSource {
    texts: Vec<(String, String)>,
    images: Vec<File>,
}

impl DataTransferSource {
    pub fn from_event(ev: &ClipboardEvent) -> Self {
        let mut texts = Vec::new();
        let mut images = Vec::new();
        if let Some(dt) = ev.clipboard_data() {
            let items = dt.items();
            for i in 0..items.length() {
                let Some(item) = items.get(i) else { continue };
                let mime = item.type_();
                if item.kind() == "file" && mime.starts_with("image/") {
                    if let Ok(Some(file)) = item.get_as_file() {
                        images.push(file);
                    }
                }
            }
            for mime in ["text/plain", "text/uri-list"] {
                if let Ok(s) = dt.get_data(mime) {
                    if !s.is_empty() {
                        texts.push((mime.to_string(), s));
                    }
                }
            }
        }
        DataTransferSource { texts, images }
    }

    pub fn has_image(&self) -> bool {
        !self.images.is_empty()
    }
}

impl ClipboardSource for DataTransferSource {
    fn read(&self) -> LocalBoxFuture<'_, Result<ClipboardPayload, Error>> {
        async move {
            let mut payload = ClipboardPayload::default();
            for file in &self.images {
                let buf = JsFuture::from(file.array_buffer())
                    .await
                    .map_err(|e| Error::Clipboard(format!("reading {}: {e:?}", file.name())))?;
                payload.push(ClipboardItem {
                    mime: file.type_(),
                    data: ClipboardData::Bytes(Uint8Array::new(&buf).to_vec()),
                });
            }
            for (mime, text) in &self.texts {
                payload.push(ClipboardItem {
                    mime: mime.clone(),
                    data: ClipboardData::Text(text.clone()),
                });
            }
            Ok(payload)
        }
        .boxed_local()
    }
}
