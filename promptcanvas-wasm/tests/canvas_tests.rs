use js_sys::{Function, Promise, Reflect, Uint32Array};
use promptcanvas_wasm::Canvas;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn get(v: &JsValue, k: &str) -> JsValue {
    Reflect::get(v, &JsValue::from_str(k)).unwrap()
}

fn is_err(v: &JsValue, code: &str) -> bool {
    get(v, "ok").as_bool() == Some(false) && get(&get(v, "error"), "code").as_string().as_deref() == Some(code)
}

fn ok_value(v: &JsValue) -> JsValue {
    assert_eq!(get(v, "ok").as_bool(), Some(true), "expected ok envelope");
    get(v, "value")
}

fn canvas() -> Canvas {
    let mut c = Canvas::new(JsValue::UNDEFINED, None).unwrap();
    ok_value(&c.set_surface_res(0.0, 0.0, 800.0, 600.0));
    c
}

async fn settle(p: Promise) -> JsValue {
    JsFuture::from(p).await.unwrap()
}

#[wasm_bindgen_test]
fn envelopes_carry_core_error_codes() {
    let mut c = canvas();
    let ver = c.version();
    assert!(is_err(&c.add_node_res("mystery", 0.0, 0.0), "unknown_kind"));
    assert!(is_err(&c.add_node_res("prompt", f32::NAN, 0.0), "non_finite"));
    assert!(is_err(&c.move_node_res(42, 0.0, 0.0), "invalid_id"));
    assert!(is_err(&c.set_viewport_res(0.0, 0.0, 0.0), "invalid_viewport"));
    assert_eq!(c.version(), ver, "state mutated on error");

    let p = ok_value(&c.add_node_res("prompt", 0.0, 0.0)).as_f64().unwrap() as u32;
    let g = ok_value(&c.add_node_res("generator", 400.0, 0.0)).as_f64().unwrap() as u32;
    let bad = c.add_link_res(p, 0, g, 1);
    assert!(is_err(&bad, "invalid_link"));
    assert!(ok_value(&c.add_link_res(p, 0, g, 0)).as_f64().is_some());
    assert_eq!(c.link_count(), 1);
    assert!(is_err(&c.set_text_res(g, "x"), "not_editable"));
}

#[wasm_bindgen_test]
fn load_json_is_all_or_nothing() {
    let mut c = canvas();
    ok_value(&c.add_node_res("prompt", 0.0, 0.0));
    let bad = js_sys::JSON::parse(r#"{"nodes":[{"id":1,"type":"prompt","pos":[0,0]}],"links":[[1,1,0,9,0,"text"]]}"#).unwrap();
    assert!(is_err(&c.load_json_res(bad), "malformed_graph"));
    assert_eq!(c.node_count(), 1);

    let good = js_sys::JSON::parse(r#"{"nodes":[{"id":5,"type":"image_source","pos":[0,0]}],"links":[]}"#).unwrap();
    ok_value(&c.load_json_res(good));
    assert_eq!(c.node_ids().to_vec(), vec![5]);
    let doc = c.to_json();
    assert_eq!(get(&doc, "last_node_id").as_f64(), Some(5.0));
}

#[wasm_bindgen_test]
async fn paste_text_creates_prompt_and_notifies() {
    let c = canvas();
    let seen = js_sys::Array::new();
    let push = Function::new_with_args("id", "this.push(id)").bind(&seen);
    c.on_node_created(push);

    let r = settle(c.paste_text("  a red fox ".into())).await;
    assert_eq!(get(&r, "kind").as_string().as_deref(), Some("node"));
    let id = Uint32Array::new(&get(&r, "ids")).to_vec()[0];
    assert_eq!(seen.length(), 1);

    let node = c.get_node(id);
    assert_eq!(get(&node, "type").as_string().as_deref(), Some("prompt"));
    assert_eq!(get(&node, "text").as_string().as_deref(), Some("a red fox"));
}

#[wasm_bindgen_test]
async fn image_url_paste_sets_url() {
    let c = canvas();
    let r = settle(c.paste_text("https://example.com/pic.png".into())).await;
    let id = Uint32Array::new(&get(&r, "ids")).to_vec()[0];
    let props = get(&c.get_node(id), "properties");
    assert_eq!(get(&props, "url").as_string().as_deref(), Some("https://example.com/pic.png"));
    assert_eq!(get(&props, "source_mode").as_string().as_deref(), Some("url"));
}

#[wasm_bindgen_test]
async fn copy_then_paste_round_trips() {
    let mut c = canvas();
    let id = ok_value(&c.add_node_res("prompt", 10.0, 10.0)).as_f64().unwrap() as u32;
    ok_value(&c.set_text_res(id, "copied text"));
    assert!(c.copy().unwrap().is_none());
    c.select(id, false);
    let text = c.cut().unwrap().expect("selection text");
    assert_eq!(c.node_count(), 0);

    let r = settle(c.paste_text(text)).await;
    let new_id = Uint32Array::new(&get(&r, "ids")).to_vec()[0];
    assert_ne!(new_id, id);
    assert_eq!(get(&c.get_node(new_id), "text").as_string().as_deref(), Some("copied text"));
    assert_eq!(c.selection().to_vec(), vec![new_id]);
}

#[wasm_bindgen_test]
fn pointer_and_keys_drive_the_widget() {
    let mut c = canvas();
    let id = ok_value(&c.add_node_res("prompt", 100.0, 100.0)).as_f64().unwrap() as u32;
    let hit = c.pointer_down(150.0, 170.0);
    assert_eq!(get(&hit, "region").as_string().as_deref(), Some("content"));

    let w = c.widget();
    assert_eq!(get(&w, "node").as_f64(), Some(id as f64));
    assert!(c.widget_input("typed in place"));
    assert!(!c.key_down("Enter", false, false, false));
    assert!(c.key_down("Enter", true, false, false));
    assert!(c.widget().is_null());
    assert_eq!(get(&c.get_node(id), "text").as_string().as_deref(), Some("typed in place"));
}

#[wasm_bindgen_test]
fn draw_list_is_plain_json() {
    let mut c = canvas();
    ok_value(&c.add_node_res("prompt", 0.0, 0.0));
    let list = c.draw_list(0.6);
    let cmds = js_sys::Array::from(&get(&list, "commands"));
    assert!(cmds.length() > 0);
    assert!(get(&cmds.get(0), "op").is_string());
    assert!(!c.is_dirty());
}
