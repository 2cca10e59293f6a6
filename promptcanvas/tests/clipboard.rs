use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use futures::{poll, FutureExt};
use promptcanvas::kinds::{ImageSourceKind, SourceMode};
use promptcanvas::kinds::{GENERATOR, IMAGE_SOURCE, PROMPT};
use promptcanvas::{
    ClipboardPayload, ClipboardSource, Editor, EditorConfig, Error, Ingested, Ingestor, PasteEvent, Surface,
    UploadError, UploadFile, UploadResponse, Uploader, Vec2,
};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::Poll;

/// Answers every upload with a fixed result and records what it was given.
#[derive(Default)]
struct FakeUploader {
    calls: RefCell<Vec<UploadFile>>,
    fail: bool,
}

impl Uploader for FakeUploader {
    fn upload(&self, file: UploadFile) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>> {
        self.calls.borrow_mut().push(file);
        let res = if self.fail {
            Err(UploadError("503 service unavailable".into()))
        } else {
            Ok(UploadResponse { url: "https://cdn.test/u/1.png".into() })
        };
        async move { res }.boxed_local()
    }
}

/// Upload that stays pending until the test releases it.
struct GatedUploader {
    gate: RefCell<Option<oneshot::Receiver<String>>>,
}

impl Uploader for GatedUploader {
    fn upload(&self, _file: UploadFile) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>> {
        let rx = self.gate.borrow_mut().take();
        async move {
            let rx = rx.ok_or_else(|| UploadError("no gate".into()))?;
            rx.await
                .map(|url| UploadResponse { url })
                .map_err(|_| UploadError("cancelled".into()))
        }
        .boxed_local()
    }
}

/// Clipboard read that stays pending until the test releases it.
struct GatedSource {
    gate: RefCell<Option<oneshot::Receiver<ClipboardPayload>>>,
}

impl ClipboardSource for GatedSource {
    fn read(&self) -> LocalBoxFuture<'_, Result<ClipboardPayload, Error>> {
        let rx = self.gate.borrow_mut().take();
        async move {
            let rx = rx.ok_or_else(|| Error::Clipboard("read twice".into()))?;
            rx.await.map_err(|_| Error::Clipboard("closed".into()))
        }
        .boxed_local()
    }
}

#[derive(Default)]
struct RecordingEvent {
    prevented: Cell<bool>,
}

impl PasteEvent for RecordingEvent {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}

fn ingestor<U: Uploader>(uploader: U) -> Ingestor<U> {
    let mut ed = Editor::new(EditorConfig::default());
    ed.set_surface(Surface::sized(800.0, 600.0));
    Ingestor::new(Rc::new(RefCell::new(ed)), uploader)
}

fn paste_text<U: Uploader>(ing: &Ingestor<U>, text: &str) -> Ingested {
    block_on(ing.ingest(ClipboardPayload::text(text), None))
}

#[test]
fn image_paste_creates_centered_node_and_uploads() {
    let up = Rc::new(FakeUploader::default());
    let ing = ingestor(up.clone());
    let created = Rc::new(RefCell::new(Vec::new()));
    let sink = created.clone();
    ing.set_on_node_created(move |id| sink.borrow_mut().push(id));
    let ev = RecordingEvent::default();

    let res = block_on(ing.ingest(ClipboardPayload::image("image/png", vec![0x89, 0x50]), Some(&ev)));
    let Ingested::Node(id) = res else { panic!("unexpected {res:?}") };
    assert!(ev.prevented.get());
    assert_eq!(*created.borrow(), vec![id]);
    assert!(!ing.is_busy());

    let ed = ing.editor().borrow();
    assert_eq!(ed.graph().node_count(), 1);
    let node = ed.graph().node(id).unwrap();
    assert_eq!(node.kind, IMAGE_SOURCE);
    assert_eq!(node.bounds().center(), Vec2::new(400.0, 300.0));
    assert_eq!(ImageSourceKind::url(node), Some("https://cdn.test/u/1.png"));
    assert_eq!(ImageSourceKind::source_mode(node), Some(SourceMode::Url));
    assert!(ed.selection().contains(id));

    let calls = up.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "pasted-image.png");
    assert_eq!(calls[0].mime, "image/png");
    assert_eq!(calls[0].bytes, vec![0x89, 0x50]);
}

#[test]
fn upload_failure_keeps_node_without_url() {
    let ing = ingestor(FakeUploader { fail: true, ..Default::default() });
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    ing.set_on_error(move |e: &Error| sink.borrow_mut().push(e.code()));

    let res = block_on(ing.ingest(ClipboardPayload::image("image/jpeg", vec![1, 2, 3]), None));
    let Ingested::Node(id) = res else { panic!("unexpected {res:?}") };
    assert_eq!(*errors.borrow(), vec!["upload_failed"]);
    let ed = ing.editor().borrow();
    let node = ed.graph().node(id).unwrap();
    assert_eq!(ImageSourceKind::url(node), None);
    assert_eq!(ImageSourceKind::source_mode(node), Some(SourceMode::Upload));
}

#[test]
fn image_url_text_skips_upload() {
    let up = Rc::new(FakeUploader::default());
    let ing = ingestor(up.clone());
    let Ingested::Node(id) = paste_text(&ing, "https://example.com/pic.png") else { panic!() };
    assert!(up.calls.borrow().is_empty());
    let ed = ing.editor().borrow();
    let node = ed.graph().node(id).unwrap();
    assert_eq!(node.kind, IMAGE_SOURCE);
    assert_eq!(ImageSourceKind::url(node), Some("https://example.com/pic.png"));
    assert_eq!(ImageSourceKind::source_mode(node), Some(SourceMode::Url));
}

#[test]
fn plain_text_becomes_trimmed_prompt() {
    let ing = ingestor(FakeUploader::default());
    let Ingested::Node(id) = paste_text(&ing, "  a red fox \n") else { panic!() };
    let ed = ing.editor().borrow();
    assert_eq!(ed.graph().node(id).unwrap().kind, PROMPT);
    assert_eq!(ed.graph().text(id), Some("a red fox"));
    assert_eq!(ed.graph().node(id).unwrap().bounds().center(), Vec2::new(400.0, 300.0));
}

#[test]
fn broken_json_becomes_prompt() {
    let ing = ingestor(FakeUploader::default());
    let Ingested::Node(id) = paste_text(&ing, "{not json") else { panic!() };
    assert_eq!(ing.editor().borrow().graph().text(id), Some("{not json"));
}

#[test]
fn whitespace_is_nothing() {
    let ing = ingestor(FakeUploader::default());
    assert_eq!(paste_text(&ing, "   \n\t"), Ingested::Nothing);
    assert_eq!(block_on(ing.ingest(ClipboardPayload::default(), None)), Ingested::Nothing);
    assert_eq!(ing.editor().borrow().graph().node_count(), 0);
}

#[test]
fn workflow_paste_replaces_graph() {
    let ing = ingestor(FakeUploader::default());
    paste_text(&ing, "first");
    paste_text(&ing, "second");
    let res = paste_text(&ing, r#"{"nodes":[{"id":1,"type":"prompt","pos":[0,0]}],"links":[]}"#);
    assert_eq!(res, Ingested::Workflow);
    let ed = ing.editor().borrow();
    assert_eq!(ed.graph().node_count(), 1);
    assert_eq!(ed.graph().nodes()[0].kind, PROMPT);
    assert!(ed.selection().is_empty());
}

#[test]
fn malformed_workflow_is_reported_and_graph_kept() {
    let ing = ingestor(FakeUploader::default());
    let errors = Rc::new(Cell::new(0));
    let count = errors.clone();
    ing.set_on_error(move |_| count.set(count.get() + 1));
    paste_text(&ing, "keep");
    let ver = ing.editor().borrow().graph().version();

    let res = paste_text(&ing, r#"{"nodes":[{"id":1,"type":"nope","pos":[0,0]}],"links":[]}"#);
    assert_eq!(res, Ingested::Failed);
    assert_eq!(errors.get(), 1);
    assert_eq!(ing.editor().borrow().graph().version(), ver);
    assert!(!ing.is_busy());
}

#[test]
fn serialized_node_is_pasted_with_offset() {
    let ing = ingestor(FakeUploader::default());
    ing.editor().borrow_mut().set_viewport(2.0, Vec2::ZERO).unwrap();
    let text = json!({"id": 77, "type": "prompt", "pos": [100, 40], "text": "copied"}).to_string();
    let Ingested::Node(id) = paste_text(&ing, &text) else { panic!() };
    let ed = ing.editor().borrow();
    assert_ne!(id, 77);
    let node = ed.graph().node(id).unwrap();
    // 10px screen offset at scale 2
    assert_eq!(node.pos, Vec2::new(105.0, 45.0));
    assert_eq!(ed.graph().text(id), Some("copied"));
    assert_eq!(ed.selection().ids(), vec![id]);
}

#[test]
fn node_array_is_pasted_and_selected() {
    let ing = ingestor(FakeUploader::default());
    let text = json!([
        {"type": "prompt", "pos": [0, 0], "text": "a"},
        {"type": "generator", "pos": [300, 0]}
    ])
    .to_string();
    let Ingested::Nodes(ids) = paste_text(&ing, &text) else { panic!() };
    assert_eq!(ids.len(), 2);
    let ed = ing.editor().borrow();
    assert_eq!(ed.graph().node(ids[1]).unwrap().kind, GENERATOR);
    assert_eq!(ed.selection().len(), 2);
}

#[test]
fn back_to_back_pastes_create_one_node() {
    let (tx, rx) = oneshot::channel();
    let ing = ingestor(GatedUploader { gate: RefCell::new(Some(rx)) });
    let event = RecordingEvent::default();
    block_on(async {
        let mut first = ing
            .ingest(ClipboardPayload::image("image/png", vec![1]), Some(&event))
            .boxed_local();
        assert!(matches!(poll!(&mut first), Poll::Pending));
        // handled before the upload resolves
        assert!(event.prevented.get());
        assert!(ing.is_busy());
        // the node exists before the upload resolves
        assert_eq!(ing.editor().borrow().graph().node_count(), 1);

        let second = ing.ingest(ClipboardPayload::text("hello"), None).await;
        assert_eq!(second, Ingested::Busy);

        tx.send("https://cdn.test/late.png".to_string()).unwrap();
        assert!(matches!(first.await, Ingested::Node(_)));
    });
    assert!(!ing.is_busy());
    assert_eq!(ing.editor().borrow().graph().node_count(), 1);
}

#[test]
fn pending_clipboard_read_blocks_other_pastes() {
    let (tx, rx) = oneshot::channel();
    let source = GatedSource { gate: RefCell::new(Some(rx)) };
    let ing = ingestor(FakeUploader::default());
    block_on(async {
        let mut first = ing.paste(&source, None).boxed_local();
        assert!(matches!(poll!(&mut first), Poll::Pending));
        let other = ClipboardPayload::text("other");
        assert_eq!(ing.paste(&other, None).await, Ingested::Busy);
        tx.send(ClipboardPayload::text("from clipboard")).unwrap();
        assert!(matches!(first.await, Ingested::Node(_)));
    });
    let ed = ing.editor().borrow();
    assert_eq!(ed.graph().node_count(), 1);
    assert_eq!(ed.graph().nodes()[0].str_property("text"), Some("from clipboard"));
}

#[test]
fn upload_result_for_removed_node_is_dropped() {
    let (tx, rx) = oneshot::channel();
    let ing = ingestor(GatedUploader { gate: RefCell::new(Some(rx)) });
    block_on(async {
        let mut first = ing.ingest(ClipboardPayload::image("image/png", vec![1]), None).boxed_local();
        assert!(matches!(poll!(&mut first), Poll::Pending));
        let id = ing.editor().borrow().graph().nodes()[0].id;
        assert!(ing.editor().borrow_mut().remove_node(id));
        tx.send("https://cdn.test/late.png".to_string()).unwrap();
        assert_eq!(first.await, Ingested::Node(id));
    });
    assert_eq!(ing.editor().borrow().graph().node_count(), 0);
}

#[test]
fn upload_result_is_dropped_when_the_graph_is_replaced() {
    let (tx, rx) = oneshot::channel();
    let ing = ingestor(GatedUploader { gate: RefCell::new(Some(rx)) });
    block_on(async {
        let mut first = ing.ingest(ClipboardPayload::image("image/png", vec![1]), None).boxed_local();
        assert!(matches!(poll!(&mut first), Poll::Pending));
        let id = ing.editor().borrow().graph().nodes()[0].id;
        let loaded = json!({
            "nodes": [{"id": id, "type": "image_source", "pos": [0, 0], "properties": {"url": "https://mine.test/keep.png"}}],
            "links": []
        });
        ing.editor().borrow_mut().configure(&loaded).unwrap();
        tx.send("https://cdn.test/late.png".to_string()).unwrap();
        assert_eq!(first.await, Ingested::Node(id));
    });
    let ed = ing.editor().borrow();
    let node = &ed.graph().nodes()[0];
    assert_eq!(ImageSourceKind::url(node), Some("https://mine.test/keep.png"));
}

#[test]
fn failed_clipboard_read_releases_the_guard() {
    let (tx, rx) = oneshot::channel::<ClipboardPayload>();
    drop(tx);
    let source = GatedSource { gate: RefCell::new(Some(rx)) };
    let ing = ingestor(FakeUploader::default());
    assert_eq!(block_on(ing.paste(&source, None)), Ingested::Failed);
    assert!(!ing.is_busy());
    assert!(matches!(paste_text(&ing, "next"), Ingested::Node(_)));
}

#[test]
fn callback_may_borrow_the_editor() {
    let ing = ingestor(FakeUploader::default());
    let editor = ing.editor().clone();
    let seen = Rc::new(Cell::new(0usize));
    let s = seen.clone();
    ing.set_on_node_created(move |id| {
        assert!(editor.borrow().graph().node(id).is_some());
        s.set(s.get() + 1);
    });
    paste_text(&ing, "hello");
    assert_eq!(seen.get(), 1);
}
