//! Browser layer for marktint.
//!
//! This crate binds the DOM-agnostic engine in `marktint-core` to a live
//! page. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `DomTree` and `StyleSink` over `web_sys::Document`
//! - `timers`: `TimerHost` over gloo timeouts and intervals
//! - `host`: `BlockSource` calling the host's Datalog query API
//! - `watcher`: `MutationObserver` and navigation-event wiring
//! - `annotator`: `PageAnnotator`, tying the above to one pass function
//!
//! # Re-exports
//!
//! This crate re-exports `marktint-core` for convenience, so consumers
//! only need to depend on `marktint-browser`.

pub use marktint_core;
pub use marktint_core::*;

pub mod annotator;
pub mod dom;
pub mod host;
pub mod timers;
pub mod watcher;

pub use annotator::PageAnnotator;
pub use dom::{WebDom, dom_error, js_message};
pub use host::{BLOCKS_QUERY, LogseqBlocks, parse_rows};
pub use timers::{GlooTimers, TimerHandle};
pub use watcher::BrowserWatcher;
