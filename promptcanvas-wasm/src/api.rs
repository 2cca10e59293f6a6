use crate::error;
use crate::interop::{arr_u32, finite_pair, from_js, new_obj, set_kv, to_js};
use crate::paste::DataTransferSource;
use crate::render::{replay, CanvasMeasure};
use crate::Canvas;
use js_sys::{Function, Promise};
use promptcanvas::kinds::NodeHit;
use promptcanvas::{ClipboardPayload, EditorConfig, Ingested, KeyInput, PortRef, Surface, Vec2};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{CanvasRenderingContext2d, ClipboardEvent};

fn ingested_to_js(r: &Ingested) -> JsValue {
    let o = new_obj();
    let (kind, ids): (&str, &[u32]) = match r {
        Ingested::Busy => ("busy", &[]),
        Ingested::Nothing => ("nothing", &[]),
        Ingested::Node(id) => ("node", std::slice::from_ref(id)),
        Ingested::Nodes(ids) => ("nodes", ids.as_slice()),
        Ingested::Workflow => ("workflow", &[]),
        Ingested::Failed => ("failed", &[]),
    };
    set_kv(&o, "kind", &JsValue::from_str(kind));
    set_kv(&o, "ids", &arr_u32(ids).into());
    o.into()
}

fn hit_name(hit: NodeHit) -> (&'static str, Option<usize>) {
    match hit {
        NodeHit::Title => ("title", None),
        NodeHit::Content => ("content", None),
        NodeHit::Input(i) => ("input", Some(i)),
        NodeHit::Output(i) => ("output", Some(i)),
        NodeHit::Body => ("body", None),
    }
}

#[wasm_bindgen]
impl Canvas {
    /// `config` is a partial `EditorConfig` object or `undefined`; `upload`
    /// is `(bytes, mime, name) => Promise<{url}>`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, upload: Option<Function>) -> Result<Canvas, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            let cfg: EditorConfig = serde_wasm_bindgen::from_value(config)?;
            cfg.validate().map_err(|e| error::from_core(&e))?;
            cfg
        };
        Ok(Canvas::rs_new(config, upload))
    }

    pub fn version(&self) -> u64 {
        self.rs_version()
    }

    // Viewport and surface
    pub fn set_viewport_res(&mut self, scale: f32, ox: f32, oy: f32) -> JsValue {
        let Some(offset) = finite_pair(ox, oy) else {
            return error::non_finite("offset");
        };
        error::result(self.editor.borrow_mut().set_viewport(scale, offset), |_| JsValue::TRUE)
    }
    pub fn get_viewport(&self) -> JsValue {
        to_js(self.editor.borrow().viewport()).unwrap_or(JsValue::NULL)
    }
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.editor.borrow_mut().pan_by(Vec2::new(dx, dy));
    }
    pub fn zoom_at(&mut self, x: f32, y: f32, factor: f32) {
        self.editor.borrow_mut().zoom_at(Vec2::new(x, y), factor);
    }
    /// Bounding box of the canvas element on the page.
    pub fn set_surface_res(&mut self, x: f32, y: f32, w: f32, h: f32) -> JsValue {
        let (Some(origin), Some(size)) = (finite_pair(x, y), finite_pair(w, h)) else {
            return error::non_finite("surface");
        };
        self.editor.borrow_mut().set_surface(Surface::new(origin, size));
        error::ok(JsValue::TRUE)
    }

    // Nodes and links
    pub fn add_node_res(&mut self, kind: &str, x: f32, y: f32) -> JsValue {
        let Some(pos) = finite_pair(x, y) else {
            return error::non_finite("pos");
        };
        error::result(self.editor.borrow_mut().add_node(kind, pos), |id| JsValue::from_f64(id as f64))
    }
    pub fn remove_node(&mut self, id: u32) -> bool {
        self.editor.borrow_mut().remove_node(id)
    }
    pub fn remove_node_res(&mut self, id: u32) -> JsValue {
        if self.editor.borrow().graph().node(id).is_none() {
            return error::invalid_id("node", id);
        }
        error::ok(JsValue::from_bool(self.editor.borrow_mut().remove_node(id)))
    }
    pub fn node_count(&self) -> u32 {
        self.editor.borrow().graph().node_count() as u32
    }
    pub fn node_ids(&self) -> js_sys::Uint32Array {
        let ed = self.editor.borrow();
        let ids: Vec<u32> = ed.graph().nodes().iter().map(|n| n.id).collect();
        arr_u32(&ids)
    }
    /// Serialized node (live widget text included), or `null`.
    pub fn get_node(&self, id: u32) -> JsValue {
        self.editor
            .borrow()
            .serialized_node(id)
            .and_then(|v| to_js(&v).ok())
            .unwrap_or(JsValue::NULL)
    }
    pub fn get_node_res(&self, id: u32) -> JsValue {
        let Some(v) = self.editor.borrow().serialized_node(id) else {
            return error::invalid_id("node", id);
        };
        match to_js(&v) {
            Ok(js) => error::ok(js),
            Err(e) => error::bad_input(format!("{e:?}")),
        }
    }
    pub fn move_node_res(&mut self, id: u32, x: f32, y: f32) -> JsValue {
        let Some(pos) = finite_pair(x, y) else {
            return error::non_finite("pos");
        };
        let mut ed = self.editor.borrow_mut();
        if !ed.graph_mut().move_node(id, pos) {
            return error::invalid_id("node", id);
        }
        error::ok(JsValue::TRUE)
    }
    pub fn resize_node_res(&mut self, id: u32, w: f32, h: f32) -> JsValue {
        let Some(size) = finite_pair(w, h) else {
            return error::non_finite("size");
        };
        let mut ed = self.editor.borrow_mut();
        if !ed.graph_mut().resize_node(id, size) {
            return error::invalid_id("node", id);
        }
        error::ok(JsValue::TRUE)
    }
    pub fn set_property_res(&mut self, id: u32, key: &str, value: JsValue) -> JsValue {
        let value = match from_js(value) {
            Ok(v) => v,
            Err(e) => return error::bad_input(e),
        };
        let mut ed = self.editor.borrow_mut();
        if !ed.graph_mut().set_property(id, key, value) {
            return error::invalid_id("node", id);
        }
        error::ok(JsValue::TRUE)
    }
    pub fn set_text_res(&mut self, id: u32, text: &str) -> JsValue {
        error::result(self.editor.borrow_mut().graph_mut().set_text(id, text), |_| JsValue::TRUE)
    }
    pub fn add_link_res(&mut self, from_node: u32, from_slot: u32, to_node: u32, to_slot: u32) -> JsValue {
        let from = PortRef::new(from_node, from_slot as usize);
        let to = PortRef::new(to_node, to_slot as usize);
        error::result(self.editor.borrow_mut().add_link(from, to), |id| JsValue::from_f64(id as f64))
    }
    pub fn remove_link_res(&mut self, id: u32) -> JsValue {
        if !self.editor.borrow_mut().remove_link(id) {
            return error::invalid_id("link", id);
        }
        error::ok(JsValue::TRUE)
    }
    pub fn link_count(&self) -> u32 {
        self.editor.borrow().graph().link_count() as u32
    }

    // Persistence
    pub fn to_json(&self) -> JsValue {
        to_js(&self.editor.borrow().graph().to_json()).unwrap_or(JsValue::NULL)
    }
    /// Replace the graph; on error nothing changes.
    pub fn load_json_res(&mut self, v: JsValue) -> JsValue {
        let doc = match from_js(v) {
            Ok(doc) => doc,
            Err(e) => return error::bad_input(e),
        };
        error::result(self.editor.borrow_mut().configure(&doc), |_| JsValue::TRUE)
    }

    // Selection
    pub fn select(&mut self, id: u32, additive: bool) -> bool {
        self.editor.borrow_mut().select(id, additive)
    }
    pub fn select_in_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, additive: bool) -> u32 {
        let (Some(a), Some(b)) = (finite_pair(x0, y0), finite_pair(x1, y1)) else {
            return 0;
        };
        self.editor.borrow_mut().select_in_rect(a, b, additive) as u32
    }
    pub fn deselect(&mut self, id: u32) -> bool {
        self.editor.borrow_mut().deselect(id)
    }
    pub fn clear_selection(&mut self) {
        self.editor.borrow_mut().clear_selection();
    }
    pub fn selection(&self) -> js_sys::Uint32Array {
        arr_u32(&self.editor.borrow().selection().ids())
    }
    pub fn delete_selection(&mut self) -> u32 {
        self.editor.borrow_mut().delete_selection() as u32
    }
    /// Selection as portable JSON text, or `undefined` when nothing is selected.
    pub fn copy(&self) -> Result<Option<String>, JsValue> {
        let mut out = String::new();
        let wrote = self
            .editor
            .borrow()
            .copy_selection(&mut out)
            .map_err(|e| error::from_core(&e))?;
        Ok(wrote.then_some(out))
    }
    pub fn cut(&mut self) -> Result<Option<String>, JsValue> {
        let mut out = String::new();
        let wrote = self
            .editor
            .borrow_mut()
            .cut_selection(&mut out)
            .map_err(|e| error::from_core(&e))?;
        Ok(wrote.then_some(out))
    }

    // Input
    /// Pointer down at surface-relative pixels. Returns `{id, region, slot?}`
    /// or `null` on empty canvas.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> JsValue {
        let Some(p) = finite_pair(x, y) else {
            return JsValue::NULL;
        };
        let Some((id, hit)) = self.editor.borrow_mut().pointer_down(p) else {
            return JsValue::NULL;
        };
        let (region, slot) = hit_name(hit);
        let o = new_obj();
        set_kv(&o, "id", &JsValue::from_f64(id as f64));
        set_kv(&o, "region", &JsValue::from_str(region));
        if let Some(s) = slot {
            set_kv(&o, "slot", &JsValue::from_f64(s as f64));
        }
        o.into()
    }
    /// `true` when the key ended an edit (the host should stop propagation).
    pub fn key_down(&mut self, key: &str, ctrl: bool, meta: bool, shift: bool) -> bool {
        let input = KeyInput {
            key: key.to_string(),
            ctrl,
            meta,
            shift,
        };
        self.editor.borrow_mut().key_down(&input)
    }
    /// `{node, rect, font_size, value}` while editing, else `null`.
    pub fn widget(&self) -> JsValue {
        self.editor
            .borrow()
            .widget()
            .and_then(|w| to_js(w).ok())
            .unwrap_or(JsValue::NULL)
    }
    pub fn widget_input(&mut self, value: &str) -> bool {
        self.editor.borrow_mut().widget_input(value)
    }
    pub fn widget_blur(&mut self) -> Option<u32> {
        self.editor.borrow_mut().widget_blur()
    }

    // Clipboard
    #[wasm_bindgen(js_name = pasteText)]
    pub fn paste_text(&self, text: String) -> Promise {
        let ingestor = self.ingestor.clone();
        future_to_promise(async move {
            let r = ingestor.ingest(ClipboardPayload::text(&text), None).await;
            Ok(ingested_to_js(&r))
        })
    }
    /// Handle a DOM `paste` event. Image pastes are claimed (default
    /// prevented) before this returns.
    #[wasm_bindgen(js_name = pasteEvent)]
    pub fn paste_event(&self, ev: ClipboardEvent) -> Promise {
        let source = DataTransferSource::from_event(&ev);
        if source.has_image() {
            ev.prevent_default();
        }
        let ingestor = self.ingestor.clone();
        future_to_promise(async move {
            let r = ingestor.paste(&source, None).await;
            Ok(ingested_to_js(&r))
        })
    }
    pub fn is_pasting(&self) -> bool {
        self.ingestor.is_busy()
    }
    #[wasm_bindgen(js_name = onNodeCreated)]
    pub fn on_node_created(&self, f: Function) {
        self.ingestor.set_on_node_created(move |id| {
            if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_f64(id as f64)) {
                log::warn!("onNodeCreated threw: {e:?}");
            }
        });
    }
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, f: Function) {
        self.ingestor.set_on_error(move |e| {
            if let Err(thrown) = f.call1(&JsValue::NULL, &error::from_core(e)) {
                log::warn!("onError threw: {thrown:?}");
            }
        });
    }

    // Frame
    pub fn is_dirty(&self) -> bool {
        self.editor.borrow().is_dirty()
    }
    pub fn draw(&mut self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let mut ed = self.editor.borrow_mut();
        let list = ed.draw(&CanvasMeasure { ctx });
        replay(ctx, &list, ed.viewport(), ed.surface())
    }
    /// The frame's draw commands as JSON, for hosts that render themselves.
    pub fn draw_list(&mut self, char_advance_em: f32) -> JsValue {
        let measure = promptcanvas::render::MonospaceMeasure { advance_em: char_advance_em };
        let list = self.editor.borrow_mut().draw(&measure);
        to_js(&list).unwrap_or(JsValue::NULL)
    }
}
