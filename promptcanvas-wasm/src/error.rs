use crate::interop::{new_obj, set_kv};
use promptcanvas::Error;
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data {
        set_kv(&e, "data", &d);
    }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn invalid_id(kind: &str, id: u32) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_f64(id as f64));
    err("invalid_id", format!("invalid {} id", kind), Some(d.into()))
}

pub fn bad_input(message: impl Into<String>) -> JsValue {
    err("bad_input", message, None)
}

/// Envelope for a core error, keeping its stable code.
pub fn from_core(e: &Error) -> JsValue {
    match e {
        Error::NodeNotFound(id) => invalid_id("node", *id),
        Error::NotEditable(id) => {
            let d = new_obj();
            set_kv(&d, "id", &JsValue::from_f64(*id as f64));
            err(e.code(), e.to_string(), Some(d.into()))
        }
        Error::InvalidLink { from, to, .. } => {
            let d = new_obj();
            set_kv(&d, "from", &endpoint(from.node, from.slot));
            set_kv(&d, "to", &endpoint(to.node, to.slot));
            err(e.code(), e.to_string(), Some(d.into()))
        }
        _ => err(e.code(), e.to_string(), None),
    }
}

fn endpoint(node: u32, slot: usize) -> JsValue {
    let o = new_obj();
    set_kv(&o, "node", &JsValue::from_f64(node as f64));
    set_kv(&o, "slot", &JsValue::from_f64(slot as f64));
    o.into()
}

pub fn result<T>(r: Result<T, Error>, f: impl FnOnce(T) -> JsValue) -> JsValue {
    match r {
        Ok(v) => ok(f(v)),
        Err(e) => from_core(&e),
    }
}
