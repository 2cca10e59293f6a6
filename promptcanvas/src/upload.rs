//! Boundary to the external upload service.

use crate::error::UploadError;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// File-like bytes handed to the upload service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Name a pasted blob after its MIME subtype, e.g. `pasted-image.png`.
    pub fn from_clipboard(mime: &str, bytes: Vec<u8>) -> Self {
        let ext = match mime.split_once('/').map(|(_, sub)| sub) {
            Some("jpeg") => "jpg",
            Some("svg+xml") => "svg",
            Some(sub) if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()) => sub,
            _ => "bin",
        };
        UploadFile {
            name: format!("pasted-image.{ext}"),
            mime: mime.to_string(),
            bytes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Accepts a file and answers with a URL. No timeout is imposed by callers.
pub trait Uploader {
    fn upload(&self, file: UploadFile) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>>;
}

impl<U: Uploader + ?Sized> Uploader for Rc<U> {
    fn upload(&self, file: UploadFile) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>> {
        (**self).upload(file)
    }
}
