//! Upload through a host-supplied JS function
//! `(bytes: Uint8Array, mime: string, name: string) => Promise<{url: string}>`.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::{Function, Promise, Uint8Array};
use promptcanvas::{UploadError, UploadFile, UploadResponse, Uploader};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub struct JsUploader {
    handler: Option<Function>,
}

impl JsUploader {
    pub fn new(handler: Option<Function>) -> Self {
        JsUploader { handler }
    }
}

fn describe(v: &JsValue) -> String {
    v.as_string()
        .or_else(|| v.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{v:?}"))
}

impl Uploader for JsUploader {
    fn upload(&self, file: UploadFile) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>> {
        async move {
            let f = self
                .handler
                .as_ref()
                .ok_or_else(|| UploadError("no upload handler registered".into()))?;
            let bytes = Uint8Array::from(file.bytes.as_slice());
            let ret = f
                .call3(&JsValue::NULL, &bytes, &JsValue::from_str(&file.mime), &JsValue::from_str(&file.name))
                .map_err(|e| UploadError(describe(&e)))?;
            let promise = Promise::resolve(&ret);
            let value = JsFuture::from(promise).await.map_err(|e| UploadError(describe(&e)))?;
            serde_wasm_bindgen::from_value::<UploadResponse>(value)
                .map_err(|e| UploadError(format!("bad upload response: {e}")))
        }
        .boxed_local()
    }
}
