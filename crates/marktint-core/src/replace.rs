//! Replacement of annotated text nodes.
//!
//! A text node with annotations becomes a fragment: literal runs for the
//! unmatched text, one styled span per annotation. The swap happens in one
//! parent-level operation so host reactivity sees a single change.

use crate::color::{SpanStyle, resolve_color, span_style};
use crate::error::AnnotateError;
use crate::markup::AnnotationToken;
use crate::tree::DomTree;

/// One piece of a replacement fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentPart {
    /// Literal text, inserted as a text node.
    Text(String),
    /// Styled span whose only content is `text`.
    Span { text: String, style: SpanStyle },
}

/// Result of replacing one text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The node was swapped for a fragment containing `spans` spans.
    Replaced { spans: usize },
    /// The host removed the node first. Nothing was changed.
    Detached,
}

/// Build the fragment for `text` given its parsed annotations.
///
/// `tokens` must come from `parse_annotations(text)`: ordered and
/// non-overlapping, with spans inside `text`. Empty literal runs are omitted.
pub fn build_fragment(text: &str, tokens: &[AnnotationToken]) -> Vec<FragmentPart> {
    let mut parts = Vec::with_capacity(tokens.len() * 2 + 1);
    let mut last = 0;

    for token in tokens {
        if token.span.start < last || token.span.end > text.len() {
            tracing::warn!(
                start = token.span.start,
                end = token.span.end,
                "build_fragment: token span out of order, skipping"
            );
            continue;
        }
        if token.span.start > last {
            parts.push(FragmentPart::Text(text[last..token.span.start].to_string()));
        }
        let directive = resolve_color(&token.color, token.kind);
        parts.push(FragmentPart::Span {
            text: token.payload.clone(),
            style: span_style(token.kind, &directive),
        });
        last = token.span.end;
    }

    if last < text.len() {
        parts.push(FragmentPart::Text(text[last..].to_string()));
    }
    parts
}

/// Swap `node` for `parts`.
///
/// A node that lost its parent is an expected race with the host and
/// reports `ReplaceOutcome::Detached` instead of an error.
pub fn replace_text_node<D: DomTree + ?Sized>(
    dom: &D,
    node: &D::Node,
    parts: &[FragmentPart],
) -> Result<ReplaceOutcome, AnnotateError> {
    match dom.replace_with_fragment(node, parts) {
        Ok(spans) => Ok(ReplaceOutcome::Replaced { spans }),
        Err(AnnotateError::Detached) => {
            tracing::trace!("replace_text_node: node detached before swap");
            Ok(ReplaceOutcome::Detached)
        }
        Err(e) => Err(e),
    }
}
