use crate::model::{NodeId, PortRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid link {from:?} -> {to:?}: {reason}")]
    InvalidLink {
        from: PortRef,
        to: PortRef,
        reason: String,
    },
    #[error("malformed graph: {0}")]
    MalformedGraph(String),
    #[error("unknown node kind '{0}'")]
    UnknownKind(String),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} has no editable text")]
    NotEditable(NodeId),
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_link(from: PortRef, to: PortRef, reason: impl Into<String>) -> Self {
        Error::InvalidLink {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Stable short code, used by bindings that report errors as data.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidLink { .. } => "invalid_link",
            Error::MalformedGraph(_) => "malformed_graph",
            Error::UnknownKind(_) => "unknown_kind",
            Error::NodeNotFound(_) => "invalid_id",
            Error::NotEditable(_) => "not_editable",
            Error::InvalidViewport(_) => "invalid_viewport",
            Error::Upload(_) => "upload_failed",
            Error::Config(_) => "config",
            Error::Clipboard(_) => "clipboard",
            Error::Json(_) => "json",
        }
    }
}

/// Reported by the upload collaborator; never fatal to an already created node.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);
