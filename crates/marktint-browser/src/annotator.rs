//! The page-level annotator: one pass function shared by every trigger.

use std::rc::Rc;

use marktint_core::{AnnotateError, Annotator, AnnotatorConfig, PassReport, TagStyler};
use wasm_bindgen_futures::spawn_local;

use crate::dom::WebDom;
use crate::host::LogseqBlocks;
use crate::watcher::BrowserWatcher;

struct Inner {
    dom: WebDom,
    annotator: Annotator,
    tags: TagStyler,
    blocks: LogseqBlocks,
}

impl Inner {
    /// Annotate synchronously, then refresh tag styles in the background.
    fn pass(self: &Rc<Self>) -> PassReport {
        let report = self.annotator.run_pass(&self.dom);
        let inner = self.clone();
        spawn_local(async move {
            inner.tags.refresh(&inner.blocks, &inner.dom).await;
        });
        report
    }
}

/// Annotation engine bound to the current page.
pub struct PageAnnotator {
    inner: Rc<Inner>,
    watcher: BrowserWatcher,
}

impl PageAnnotator {
    pub fn new(config: AnnotatorConfig) -> Result<Self, AnnotateError> {
        let Some(dom) = WebDom::from_window() else {
            tracing::warn!("no window document, annotator not created");
            return Err(AnnotateError::Dom("no window document".into()));
        };
        Ok(Self::with_dom(dom, config))
    }

    pub fn with_dom(dom: WebDom, config: AnnotatorConfig) -> Self {
        let AnnotatorConfig { scan, watch, tags } = config;
        let root_id = scan.root_id.clone();
        let inner = Rc::new(Inner {
            dom: dom.clone(),
            annotator: Annotator::new(scan),
            tags: TagStyler::new(tags),
            blocks: LogseqBlocks::new(),
        });

        let weak = Rc::downgrade(&inner);
        let pass: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.pass();
            }
        });
        let watcher = BrowserWatcher::new(dom, &root_id, watch, pass);
        Self { inner, watcher }
    }

    /// Begin watching the page. The first pass runs after the initial delay.
    pub fn start(&self) {
        self.watcher.start();
    }

    pub fn stop(&self) {
        self.watcher.stop();
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    /// Run one pass immediately.
    pub fn run_pass(&self) -> PassReport {
        self.inner.pass()
    }

    pub fn dom(&self) -> &WebDom {
        &self.inner.dom
    }
}
