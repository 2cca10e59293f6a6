use promptcanvas::{Editor, EditorConfig, Ingestor};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

mod api;
mod error;
mod interop;
mod paste;
mod render;
mod upload;

pub use upload::JsUploader;

/// Browser handle on one editing session.
#[wasm_bindgen]
pub struct Canvas {
    pub(crate) editor: Rc<RefCell<Editor>>,
    pub(crate) ingestor: Rc<Ingestor<JsUploader>>,
}

impl Canvas {
    pub fn rs_new(config: EditorConfig, upload: Option<js_sys::Function>) -> Canvas {
        let editor = Rc::new(RefCell::new(Editor::new(config)));
        let ingestor = Rc::new(Ingestor::new(editor.clone(), JsUploader::new(upload)));
        Canvas { editor, ingestor }
    }

    pub fn rs_version(&self) -> u64 {
        self.editor.borrow().graph().version()
    }
}

/// Route `log` to the browser console and install the panic hook.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    #[cfg(feature = "console")]
    {
        let level = level
            .as_deref()
            .and_then(|l| l.parse::<log::Level>().ok())
            .unwrap_or(log::Level::Info);
        let _ = console_log::init_with_level(level);
        console_error_panic_hook::set_once();
        log::info!("logging initialized at {level}");
    }
    #[cfg(not(feature = "console"))]
    let _ = level;
}
