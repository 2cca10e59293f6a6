use js_sys::{Object, Reflect, Uint32Array};
use promptcanvas::Vec2;
use serde::Serialize;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object {
    Object::new()
}

pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

pub fn arr_u32(slice: &[u32]) -> Uint32Array {
    let arr = Uint32Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice);
    arr
}

/// Plain JS objects and arrays (never `Map`), so JSON documents survive the trip.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> Result<JsValue, JsValue> {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

pub fn from_js(v: JsValue) -> Result<serde_json::Value, String> {
    serde_wasm_bindgen::from_value(v).map_err(|e| e.to_string())
}

pub fn finite_pair(x: f32, y: f32) -> Option<Vec2> {
    let p = Vec2::new(x, y);
    p.is_finite().then_some(p)
}
