//! Pass scheduling lifecycle.
//!
//! A [`Watcher`] owns every timer that can start a pass: the one-shot
//! initial pass, the periodic fallback, and the debouncer fed by host
//! notifications. Stopping drops all of them; starting again reschedules.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::WatchConfig;
use crate::timer::{Debouncer, TimerHost};

/// Why the host asked for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Nodes were added somewhere under the observed root.
    Mutation,
    /// The host finished rendering a new route.
    Navigation,
}

struct RunningTimers<Handle> {
    _initial: Handle,
    _fallback: Handle,
}

pub struct Watcher<H: TimerHost> {
    host: Rc<H>,
    config: WatchConfig,
    pass: Rc<dyn Fn()>,
    debouncer: Debouncer<H>,
    timers: RefCell<Option<RunningTimers<H::Handle>>>,
}

impl<H: TimerHost> Watcher<H> {
    pub fn new(host: Rc<H>, config: WatchConfig, pass: Rc<dyn Fn()>) -> Self {
        let debouncer = Debouncer::new(host.clone(), config.debounce(), pass.clone());
        Self {
            host,
            config,
            pass,
            debouncer,
            timers: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Schedule the initial pass and the fallback interval.
    ///
    /// Does nothing if already running.
    pub fn start(&self) {
        if self.is_running() {
            return;
        }
        let pass = self.pass.clone();
        let initial = self
            .host
            .after(self.config.initial_delay(), Box::new(move || pass()));
        let fallback = self
            .host
            .every(self.config.fallback_interval(), self.pass.clone());
        *self.timers.borrow_mut() = Some(RunningTimers {
            _initial: initial,
            _fallback: fallback,
        });
        tracing::info!(
            debounce_ms = self.config.debounce_ms,
            fallback_interval_ms = self.config.fallback_interval_ms,
            initial_delay_ms = self.config.initial_delay_ms,
            "watcher started"
        );
    }

    /// Cancel every scheduled pass.
    pub fn stop(&self) {
        let timers = self.timers.borrow_mut().take();
        self.debouncer.cancel();
        if timers.is_some() {
            drop(timers);
            tracing::info!("watcher stopped");
        }
    }

    /// Request a debounced pass.
    pub fn notify(&self, trigger: Trigger) {
        if !self.is_running() {
            tracing::trace!(?trigger, "watcher stopped, ignoring notification");
            return;
        }
        tracing::debug!(?trigger, "pass requested");
        self.debouncer.trigger();
    }

    pub fn is_running(&self) -> bool {
        self.timers.borrow().is_some()
    }

    /// Whether a debounced pass is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl<H: TimerHost> Drop for Watcher<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use crate::timer::manual::ManualTimers;

    struct Fixture {
        timers: Rc<ManualTimers>,
        passes: Rc<Cell<usize>>,
        watcher: Watcher<ManualTimers>,
    }

    fn fixture() -> Fixture {
        let timers = Rc::new(ManualTimers::new());
        let passes = Rc::new(Cell::new(0));
        let pass: Rc<dyn Fn()> = {
            let passes = passes.clone();
            Rc::new(move || passes.set(passes.get() + 1))
        };
        let watcher = Watcher::new(timers.clone(), WatchConfig::default(), pass);
        Fixture {
            timers,
            passes,
            watcher,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_initial_pass_after_delay_only() {
        let f = fixture();
        f.watcher.start();
        f.timers.advance(ms(1_999));
        assert_eq!(f.passes.get(), 0);
        f.timers.advance(ms(1));
        assert_eq!(f.passes.get(), 1);
        f.timers.advance(ms(10_000));
        assert_eq!(f.passes.get(), 1);
    }

    #[test]
    fn test_fallback_interval() {
        let f = fixture();
        f.watcher.start();
        // Initial pass at 2s, fallback at 20s and 40s.
        f.timers.advance(ms(40_000));
        assert_eq!(f.passes.get(), 3);
    }

    #[test]
    fn test_mutation_burst_coalesces() {
        let f = fixture();
        f.watcher.start();
        f.timers.advance(ms(2_000));
        assert_eq!(f.passes.get(), 1);

        for _ in 0..20 {
            f.watcher.notify(Trigger::Mutation);
            f.timers.advance(ms(50));
        }
        f.watcher.notify(Trigger::Navigation);
        assert!(f.watcher.is_pending());
        f.timers.advance(ms(800));
        assert_eq!(f.passes.get(), 2);
        assert!(!f.watcher.is_pending());
    }

    #[test]
    fn test_spaced_notifications_each_pass() {
        let f = fixture();
        f.watcher.start();
        f.timers.advance(ms(2_000));
        for _ in 0..3 {
            f.watcher.notify(Trigger::Mutation);
            f.timers.advance(ms(1_000));
        }
        assert_eq!(f.passes.get(), 4);
    }

    #[test]
    fn test_stopped_watcher_ignores_notifications() {
        let f = fixture();
        f.watcher.notify(Trigger::Mutation);
        f.timers.advance(ms(60_000));
        assert_eq!(f.passes.get(), 0);
        assert!(!f.watcher.is_running());
    }

    #[test]
    fn test_stop_cancels_everything() {
        let f = fixture();
        f.watcher.start();
        f.watcher.notify(Trigger::Mutation);
        f.watcher.stop();
        assert!(!f.watcher.is_running());
        assert_eq!(f.timers.scheduled(), 0);
        f.timers.advance(ms(60_000));
        assert_eq!(f.passes.get(), 0);
    }

    #[test]
    fn test_restart() {
        let f = fixture();
        f.watcher.start();
        f.watcher.stop();
        f.watcher.start();
        // A second start while running does not double the timers.
        f.watcher.start();
        assert_eq!(f.timers.scheduled(), 2);
        f.timers.advance(ms(2_000));
        assert_eq!(f.passes.get(), 1);
    }

    #[test]
    fn test_drop_cancels_timers() {
        let f = fixture();
        f.watcher.start();
        let Fixture {
            timers,
            passes,
            watcher,
        } = f;
        drop(watcher);
        assert_eq!(timers.scheduled(), 0);
        timers.advance(ms(60_000));
        assert_eq!(passes.get(), 0);
    }
}
