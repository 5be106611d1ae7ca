//! JsAnnotator - the annotator handle exposed to JavaScript.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use marktint_browser::{AnnotateError, PageAnnotator};
use wasm_bindgen::prelude::*;

use crate::types::{parse_config, report_to_js, to_js_error};

/// Annotator bound to the current page.
///
/// ```js
/// const annotator = new Annotator({ watch: { debounceMs: 500 } });
/// annotator.start();
/// ```
#[wasm_bindgen(js_name = Annotator)]
pub struct JsAnnotator {
    inner: Rc<PageAnnotator>,
}

#[wasm_bindgen(js_class = Annotator)]
impl JsAnnotator {
    /// Create an annotator. `config` may be omitted for the stock setup.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsAnnotator, JsError> {
        let config = parse_config(config).map_err(to_js_error)?;
        let inner = PageAnnotator::new(config).map_err(to_js_error)?;
        Ok(Self {
            inner: Rc::new(inner),
        })
    }

    /// Start watching. The first pass runs after the initial delay.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Stop watching and cancel pending passes.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Run one pass now and return its counters.
    #[wasm_bindgen(js_name = runPass)]
    pub fn run_pass(&self) -> Result<JsValue, JsError> {
        report_to_js(&self.inner.run_pass())
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

struct Installed {
    annotator: Rc<PageAnnotator>,
    _on_load: Option<EventListener>,
}

impl Drop for Installed {
    fn drop(&mut self) {
        self.annotator.stop();
    }
}

thread_local! {
    static INSTALLED: RefCell<Option<Installed>> = const { RefCell::new(None) };
}

/// Install the page-wide annotator.
///
/// Starts as soon as the document has finished loading. Calling again
/// replaces the previous installation.
#[wasm_bindgen]
pub fn install(config: JsValue) -> Result<(), JsError> {
    if INSTALLED.with(|slot| slot.borrow_mut().take()).is_some() {
        tracing::info!("replacing previous annotator installation");
    }
    let config = parse_config(config).map_err(to_js_error)?;
    let annotator = Rc::new(PageAnnotator::new(config).map_err(to_js_error)?);
    let window = web_sys::window()
        .ok_or_else(|| to_js_error(AnnotateError::Dom("no window".into())))?;

    let on_load = if annotator.dom().document().ready_state() == "complete" {
        annotator.start();
        None
    } else {
        let pending = Rc::downgrade(&annotator);
        Some(EventListener::once(&window, "load", move |_| {
            if let Some(annotator) = pending.upgrade() {
                annotator.start();
            }
        }))
    };

    INSTALLED.with(|slot| {
        *slot.borrow_mut() = Some(Installed {
            annotator,
            _on_load: on_load,
        });
    });
    Ok(())
}

/// Stop and remove the page-wide annotator, if installed.
#[wasm_bindgen]
pub fn uninstall() {
    let previous = INSTALLED.with(|slot| slot.borrow_mut().take());
    drop(previous);
}
