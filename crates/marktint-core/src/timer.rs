//! Timer abstraction and debouncing.
//!
//! Hosts provide one-shot and repeating timers through [`TimerHost`].
//! Handles cancel their timer when dropped, which is how both the browser
//! (gloo `Timeout`/`Interval`) and the virtual test clock behave.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Source of one-shot and repeating timers.
pub trait TimerHost {
    /// Owning handle. Dropping it cancels the timer.
    type Handle;

    /// Run `task` once after `delay`.
    fn after(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle;

    /// Run `task` every `period` until the handle is dropped.
    fn every(&self, period: Duration, task: Rc<dyn Fn()>) -> Self::Handle;
}

/// Coalesces bursts of triggers into a single run.
///
/// Each trigger restarts the quiet period; the task runs once the quiet
/// period elapses with no further triggers.
pub struct Debouncer<H: TimerHost> {
    host: Rc<H>,
    quiet: Duration,
    task: Rc<dyn Fn()>,
    pending: RefCell<Option<H::Handle>>,
    armed: Rc<Cell<bool>>,
}

impl<H: TimerHost> Debouncer<H> {
    pub fn new(host: Rc<H>, quiet: Duration, task: Rc<dyn Fn()>) -> Self {
        Self {
            host,
            quiet,
            task,
            pending: RefCell::new(None),
            armed: Rc::new(Cell::new(false)),
        }
    }

    /// Restart the quiet period.
    pub fn trigger(&self) {
        let task = self.task.clone();
        let armed = self.armed.clone();
        let handle = self.host.after(
            self.quiet,
            Box::new(move || {
                armed.set(false);
                task();
            }),
        );
        self.armed.set(true);
        // Replacing the handle cancels the previous timer.
        let previous = self.pending.replace(Some(handle));
        drop(previous);
    }

    /// Drop any pending run.
    pub fn cancel(&self) {
        self.armed.set(false);
        let previous = self.pending.take();
        drop(previous);
    }

    /// Whether a run is scheduled.
    pub fn is_pending(&self) -> bool {
        self.armed.get()
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }
}
