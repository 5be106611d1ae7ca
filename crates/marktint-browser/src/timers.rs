//! Browser timers via `gloo-timers`.

use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use marktint_core::TimerHost;

/// `TimerHost` backed by `setTimeout`/`setInterval`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooTimers;

/// A live gloo timer. Dropping it clears the timer.
#[derive(Debug)]
pub enum TimerHandle {
    Once(Timeout),
    Repeat(Interval),
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

impl TimerHost for GlooTimers {
    type Handle = TimerHandle;

    fn after(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        TimerHandle::Once(Timeout::new(millis(delay), task))
    }

    fn every(&self, period: Duration, task: Rc<dyn Fn()>) -> TimerHandle {
        TimerHandle::Repeat(Interval::new(millis(period), move || task()))
    }
}
