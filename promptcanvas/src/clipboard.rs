//! Paste ingestion: classify a clipboard payload and materialize nodes.
//!
//! Classification is pure and synchronous. [`Ingestor`] drives the async part
//! (clipboard read, upload) against a shared [`Editor`], holding a borrow only
//! between await points. One ingestion runs at a time; a paste that arrives
//! while another is in flight is dropped with [`Ingested::Busy`].

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::Error;
use crate::json::{looks_like_node, looks_like_workflow};
use crate::kinds::{KindRegistry, IMAGE_SOURCE, PROMPT};
use crate::model::NodeId;
use crate::upload::{UploadFile, Uploader};
use futures::future::{self, LocalBoxFuture};
use log::{debug, info, warn};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipboardData {
    Text(String),
    Bytes(Vec<u8>),
}

/// One representation offered by the clipboard, tagged with its MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime: String,
    pub data: ClipboardData,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub items: Vec<ClipboardItem>,
}

impl ClipboardPayload {
    pub fn text(s: &str) -> Self {
        ClipboardPayload {
            items: vec![ClipboardItem {
                mime: "text/plain".into(),
                data: ClipboardData::Text(s.to_string()),
            }],
        }
    }

    pub fn image(mime: &str, bytes: Vec<u8>) -> Self {
        ClipboardPayload {
            items: vec![ClipboardItem {
                mime: mime.to_string(),
                data: ClipboardData::Bytes(bytes),
            }],
        }
    }

    pub fn push(&mut self, item: ClipboardItem) {
        self.items.push(item);
    }

    pub fn has_image(&self) -> bool {
        self.first_image().is_some()
    }

    fn first_image(&self) -> Option<(&str, &[u8])> {
        self.items.iter().find_map(|it| match &it.data {
            ClipboardData::Bytes(b) if it.mime.starts_with("image/") && !b.is_empty() => {
                Some((it.mime.as_str(), b.as_slice()))
            }
            _ => None,
        })
    }

    /// `text/plain` if offered, else the first other `text/*` item.
    fn first_text(&self) -> Option<&str> {
        fn text_of(it: &ClipboardItem) -> Option<&str> {
            match &it.data {
                ClipboardData::Text(s) => Some(s.as_str()),
                ClipboardData::Bytes(_) => None,
            }
        }
        self.items
            .iter()
            .filter(|it| it.mime == "text/plain")
            .find_map(text_of)
            .or_else(|| {
                self.items
                    .iter()
                    .filter(|it| it.mime.starts_with("text/"))
                    .find_map(text_of)
            })
    }
}

/// Where a paste reads its payload from.
pub trait ClipboardSource {
    fn read(&self) -> LocalBoxFuture<'_, Result<ClipboardPayload, Error>>;
}

impl ClipboardSource for ClipboardPayload {
    fn read(&self) -> LocalBoxFuture<'_, Result<ClipboardPayload, Error>> {
        Box::pin(future::ready(Ok(self.clone())))
    }
}

/// The host event a payload came from.
pub trait PasteEvent {
    /// Stop the host's default paste handling.
    fn prevent_default(&self);
}

/// What a payload turned out to be; first match wins.
#[derive(Clone, Debug, PartialEq)]
pub enum Classified {
    Image { mime: String, bytes: Vec<u8> },
    Workflow(Value),
    Node(Value),
    Nodes(Vec<Value>),
    ImageUrl(String),
    Prompt(String),
    Empty,
}

pub fn classify(payload: &ClipboardPayload, registry: &KindRegistry, config: &EditorConfig) -> Classified {
    if let Some((mime, bytes)) = payload.first_image() {
        return Classified::Image {
            mime: mime.to_string(),
            bytes: bytes.to_vec(),
        };
    }
    match payload.first_text() {
        Some(text) => classify_text(text, registry, config),
        None => Classified::Empty,
    }
}

pub fn classify_text(text: &str, registry: &KindRegistry, config: &EditorConfig) -> Classified {
    let text = text.trim();
    if text.is_empty() {
        return Classified::Empty;
    }
    if text.starts_with('{') || text.starts_with('[') {
        match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                if let Some(c) = classify_json(v, registry) {
                    return c;
                }
                debug!("paste: json is neither workflow nor node, treating as text");
            }
            Err(e) => debug!("paste: not json ({e}), treating as text"),
        }
    }
    if is_image_url(text, config) {
        return Classified::ImageUrl(text.to_string());
    }
    Classified::Prompt(text.to_string())
}

fn classify_json(v: Value, registry: &KindRegistry) -> Option<Classified> {
    let pasteable = |v: &Value| {
        looks_like_node(v) && v["type"].as_str().is_some_and(|t| registry.contains(t))
    };
    if looks_like_workflow(&v) {
        return Some(Classified::Workflow(v));
    }
    if pasteable(&v) {
        return Some(Classified::Node(v));
    }
    match v {
        Value::Array(items) if !items.is_empty() && items.iter().all(pasteable) => Some(Classified::Nodes(items)),
        _ => None,
    }
}

/// An `http(s)` URL whose last path segment has a known image extension.
pub fn is_image_url(text: &str, config: &EditorConfig) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(text) else { return false };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    url.path_segments()
        .and_then(|mut segs| segs.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && config.is_image_extension(ext))
}

/// Outcome of one paste.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ingested {
    /// Another paste was still in flight.
    Busy,
    Nothing,
    Node(NodeId),
    Nodes(Vec<NodeId>),
    Workflow,
    /// Reported through the error callback.
    Failed,
}

/// Held for the duration of one ingestion.
struct InFlight(Rc<Cell<bool>>);

impl InFlight {
    fn acquire(flag: &Rc<Cell<bool>>) -> Option<InFlight> {
        if flag.replace(true) {
            return None;
        }
        Some(InFlight(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

type NodeCallback = Box<dyn FnMut(NodeId)>;
type ErrorCallback = Box<dyn FnMut(&Error)>;

pub struct Ingestor<U> {
    editor: Rc<RefCell<Editor>>,
    uploader: U,
    in_flight: Rc<Cell<bool>>,
    on_node_created: RefCell<Option<NodeCallback>>,
    on_error: RefCell<Option<ErrorCallback>>,
}

impl<U: Uploader> Ingestor<U> {
    pub fn new(editor: Rc<RefCell<Editor>>, uploader: U) -> Self {
        Ingestor {
            editor,
            uploader,
            in_flight: Rc::new(Cell::new(false)),
            on_node_created: RefCell::new(None),
            on_error: RefCell::new(None),
        }
    }

    pub fn editor(&self) -> &Rc<RefCell<Editor>> {
        &self.editor
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    pub fn set_on_node_created(&self, f: impl FnMut(NodeId) + 'static) {
        *self.on_node_created.borrow_mut() = Some(Box::new(f));
    }

    pub fn set_on_error(&self, f: impl FnMut(&Error) + 'static) {
        *self.on_error.borrow_mut() = Some(Box::new(f));
    }

    /// Read `source`, then ingest what it yields.
    pub async fn paste(&self, source: &dyn ClipboardSource, event: Option<&dyn PasteEvent>) -> Ingested {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("paste: dropped, another paste in flight");
            return Ingested::Busy;
        };
        match source.read().await {
            Ok(payload) => self.run(payload, event).await,
            Err(e) => {
                self.report(&e);
                Ingested::Failed
            }
        }
    }

    pub async fn ingest(&self, payload: ClipboardPayload, event: Option<&dyn PasteEvent>) -> Ingested {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("paste: dropped, another paste in flight");
            return Ingested::Busy;
        };
        self.run(payload, event).await
    }

    async fn run(&self, payload: ClipboardPayload, event: Option<&dyn PasteEvent>) -> Ingested {
        let classified = {
            let ed = self.editor.borrow();
            classify(&payload, ed.graph().registry(), ed.config())
        };
        match classified {
            Classified::Empty => {
                debug!("paste: nothing to ingest");
                Ingested::Nothing
            }
            Classified::Image { mime, bytes } => {
                if let Some(ev) = event {
                    ev.prevent_default();
                }
                self.ingest_image(&mime, bytes).await
            }
            Classified::Workflow(v) => {
                let res = self.editor.borrow_mut().configure(&v);
                match res {
                    Ok(()) => Ingested::Workflow,
                    Err(e) => {
                        self.report(&e);
                        Ingested::Failed
                    }
                }
            }
            Classified::Node(v) => match self.paste_serialized(&[v]) {
                Ok(ids) => ids.first().copied().map_or(Ingested::Nothing, Ingested::Node),
                Err(e) => {
                    self.report(&e);
                    Ingested::Failed
                }
            },
            Classified::Nodes(vs) => match self.paste_serialized(&vs) {
                Ok(ids) => Ingested::Nodes(ids),
                Err(e) => {
                    self.report(&e);
                    Ingested::Failed
                }
            },
            Classified::ImageUrl(url) => {
                let res = {
                    let mut ed = self.editor.borrow_mut();
                    ed.create_centered(IMAGE_SOURCE).map(|id| {
                        ed.set_image_url(id, &url);
                        id
                    })
                };
                self.finish_created(res)
            }
            Classified::Prompt(text) => {
                let res = {
                    let mut ed = self.editor.borrow_mut();
                    ed.create_centered(PROMPT).and_then(|id| {
                        ed.graph_mut().set_text(id, &text)?;
                        Ok(id)
                    })
                };
                self.finish_created(res)
            }
        }
    }

    async fn ingest_image(&self, mime: &str, bytes: Vec<u8>) -> Ingested {
        let file = UploadFile::from_clipboard(mime, bytes);
        let (created, generation) = {
            let mut ed = self.editor.borrow_mut();
            let created = ed.create_centered(IMAGE_SOURCE);
            (created, ed.graph().generation())
        };
        let id = match self.finish_created(created) {
            Ingested::Node(id) => id,
            other => return other,
        };
        info!("paste: uploading {} ({} bytes) for node {id}", file.name, file.bytes.len());
        match self.uploader.upload(file).await {
            Ok(resp) => {
                let mut ed = self.editor.borrow_mut();
                if ed.graph().generation() != generation {
                    debug!("paste: graph replaced during upload, dropping url for node {id}");
                } else if ed.set_image_url(id, &resp.url) {
                    debug!("paste: node {id} -> {}", resp.url);
                }
            }
            Err(e) => self.report(&Error::Upload(e)),
        }
        Ingested::Node(id)
    }

    fn paste_serialized(&self, values: &[Value]) -> Result<Vec<NodeId>, Error> {
        let ids = self.editor.borrow_mut().paste_nodes(values)?;
        self.announce(&ids);
        Ok(ids)
    }

    fn finish_created(&self, res: Result<NodeId, Error>) -> Ingested {
        match res {
            Ok(id) => {
                self.announce(&[id]);
                Ingested::Node(id)
            }
            Err(e) => {
                self.report(&e);
                Ingested::Failed
            }
        }
    }

    /// Select fresh nodes, then tell the host about each.
    fn announce(&self, ids: &[NodeId]) {
        self.editor.borrow_mut().select_all(ids);
        debug!("paste: created {ids:?}");
        for id in ids {
            with_callback(&self.on_node_created, |f| f(*id));
        }
    }

    fn report(&self, e: &Error) {
        warn!("paste failed: {e}");
        with_callback(&self.on_error, |f| f(e));
    }
}

/// Calls the stored callback with its slot released, so it may replace itself.
fn with_callback<F: ?Sized>(slot: &RefCell<Option<Box<F>>>, call: impl FnOnce(&mut F)) {
    let Some(mut f) = slot.borrow_mut().take() else { return };
    call(f.as_mut());
    let mut cur = slot.borrow_mut();
    if cur.is_none() {
        *cur = Some(f);
    }
}
