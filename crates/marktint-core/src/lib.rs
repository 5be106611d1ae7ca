//! marktint-core: inline color-markup annotation without framework dependencies.
//!
//! This crate provides:
//! - `markup` - the `??t/color:text??` grammar as a pure parser
//! - `color` - palette lookup and raw-color fallback
//! - `DomTree` trait plus `MemoryDom`, an arena-backed implementation
//! - Node classification, replacement, and the full annotation pass, all
//!   generic over `DomTree`
//! - Tag stylesheet generation from host block queries
//! - `Debouncer` and `Watcher`, generic over a `TimerHost`

pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod markup;
pub mod memory;
pub mod replace;
pub mod scan;
pub mod tags;
pub mod timer;
pub mod tree;
pub mod watch;

pub use classify::{ExclusionFilter, ExclusionRules, TextNodes, text_nodes, within_excluded};
pub use color::{
    ColorDirective, ColorMode, SpanStyle, StyleDeclaration, resolve_color, span_style,
    strip_markup,
};
pub use config::{AnnotatorConfig, ScanConfig, TagConfig, WatchConfig};
pub use error::AnnotateError;
pub use markup::{AnnotationKind, AnnotationToken, has_annotations, parse_annotations};
pub use memory::{MemoryDom, NodeId};
pub use replace::{FragmentPart, ReplaceOutcome, build_fragment, replace_text_node};
pub use scan::{Annotator, PassReport};
pub use smol_str::SmolStr;
pub use tags::{BlockRow, BlockSource, QueryResult, TagOutcome, TagStyler};
pub use timer::{Debouncer, TimerHost};
pub use tree::{DomTree, StyleSink, find_element};
pub use watch::{Trigger, Watcher};
