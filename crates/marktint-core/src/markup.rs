//! Inline color-markup grammar.
//!
//! Annotations look like `??t/r:some text??` (foreground) or
//! `??b/ff0000:some text??` (background). The color token and payload are
//! matched non-greedily, so `??t/r:a?? ??b/g:b??` yields two annotations.
//! Matching never crosses a line break.

use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::Regex;
use smol_str::SmolStr;

/// Captures: 1=kind discriminator, 2=color token, 3=payload
static ANNOTATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?\?([tb])/(.+?):(.+?)\?\?").unwrap());

/// Whether an annotation colors the text itself or highlights behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// `t`: foreground text color
    Text,
    /// `b`: background highlight
    Background,
}

impl AnnotationKind {
    /// Parse the single-character discriminator.
    pub fn from_discriminator(c: &str) -> Option<Self> {
        match c {
            "t" => Some(AnnotationKind::Text),
            "b" => Some(AnnotationKind::Background),
            _ => None,
        }
    }

    pub fn discriminator(self) -> char {
        match self {
            AnnotationKind::Text => 't',
            AnnotationKind::Background => 'b',
        }
    }
}

/// One matched annotation within a scanned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationToken {
    pub kind: AnnotationKind,
    /// Color token as written, before any markup stripping.
    pub color: SmolStr,
    /// Literal text to style.
    pub payload: String,
    /// Byte range of the full `??...??` match in the source string.
    pub span: Range<usize>,
}

/// Parse every annotation in `text`, left to right, without overlap.
///
/// Malformed or unterminated sequences are left alone; an empty result is
/// the only way "no annotation" is reported.
pub fn parse_annotations(text: &str) -> Vec<AnnotationToken> {
    ANNOTATION_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = AnnotationKind::from_discriminator(caps.get(1)?.as_str())?;
            Some(AnnotationToken {
                kind,
                color: SmolStr::new(caps.get(2)?.as_str()),
                payload: caps.get(3)?.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Cheap check for at least one annotation.
pub fn has_annotations(text: &str) -> bool {
    ANNOTATION_REGEX.is_match(text)
}
