//! Mutation and navigation wiring.
//!
//! A `MutationObserver` on the host's root container and a listener for the
//! host navigation event feed the core `Watcher`, which owns the timers.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use js_sys::Array;
use marktint_core::{DomTree, Trigger, WatchConfig, Watcher};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord, Node};

use crate::dom::{WebDom, dom_error};
use crate::timers::GlooTimers;

/// Observer plus the closure it calls. Disconnects on drop.
struct Observer {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Keeps passes in step with a live, host-mutated document.
pub struct BrowserWatcher {
    dom: WebDom,
    root_id: String,
    watcher: Rc<Watcher<GlooTimers>>,
    observer: RefCell<Option<Observer>>,
    listener: RefCell<Option<EventListener>>,
}

impl BrowserWatcher {
    pub fn new(dom: WebDom, root_id: &str, config: WatchConfig, pass: Rc<dyn Fn()>) -> Self {
        Self {
            dom,
            root_id: root_id.to_string(),
            watcher: Rc::new(Watcher::new(Rc::new(GlooTimers), config, pass)),
            observer: RefCell::new(None),
            listener: RefCell::new(None),
        }
    }

    /// Schedule passes and start listening. Does nothing if already running.
    pub fn start(&self) {
        if self.watcher.is_running() {
            return;
        }
        self.watcher.start();

        match self.observe() {
            Ok(observer) => *self.observer.borrow_mut() = Some(observer),
            Err(e) => tracing::warn!(error = %e, "could not install mutation observer"),
        }
        *self.listener.borrow_mut() = Some(self.listen());
    }

    /// Disconnect the observer, drop the listener and cancel every timer.
    pub fn stop(&self) {
        let observer = self.observer.borrow_mut().take();
        let listener = self.listener.borrow_mut().take();
        drop(observer);
        drop(listener);
        self.watcher.stop();
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    /// Root to observe: the host container, or the body before it exists.
    fn observe_target(&self) -> Node {
        self.dom
            .element_by_id(&self.root_id)
            .unwrap_or_else(|| self.dom.document_root())
    }

    fn observe(&self) -> Result<Observer, marktint_core::AnnotateError> {
        let watcher = Rc::downgrade(&self.watcher);
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let added = records.iter().any(|record| {
                    record
                        .dyn_into::<MutationRecord>()
                        .is_ok_and(|r| r.added_nodes().length() > 0)
                });
                if added {
                    notify(&watcher, Trigger::Mutation);
                }
            },
        );

        let observer =
            MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(dom_error)?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);

        let target = self.observe_target();
        observer
            .observe_with_options(&target, &init)
            .map_err(dom_error)?;
        tracing::debug!(node = %target.node_name(), "mutation observer installed");

        Ok(Observer {
            observer,
            _callback: callback,
        })
    }

    fn listen(&self) -> EventListener {
        let watcher = Rc::downgrade(&self.watcher);
        let event = self.watcher.config().navigation_event.to_string();
        EventListener::new(self.dom.document(), event, move |_| {
            notify(&watcher, Trigger::Navigation);
        })
    }
}

fn notify(watcher: &Weak<Watcher<GlooTimers>>, trigger: Trigger) {
    if let Some(watcher) = watcher.upgrade() {
        watcher.notify(trigger);
    }
}

impl Drop for BrowserWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
