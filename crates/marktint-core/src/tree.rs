//! Document tree abstraction.
//!
//! The annotation pass only needs a handful of read operations plus one
//! write: swapping a text node for a fragment. `DomTree` captures exactly
//! that, so the same pass runs against the browser DOM and against
//! `MemoryDom` in tests.
//!
//! All methods take `&self`. Implementations are single-threaded and use
//! interior mutability (the browser DOM already behaves this way).

use smol_str::SmolStr;

use crate::error::AnnotateError;
use crate::replace::FragmentPart;

/// Read-broadly, write-narrowly view of a document.
pub trait DomTree {
    /// Handle to a node. Cheap to clone; equality is node identity.
    type Node: Clone + PartialEq;

    // === Required: navigation ===

    /// Root to scan from (the body, or the document itself).
    fn document_root(&self) -> Self::Node;

    /// Element with the given `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Parent node, or `None` if detached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Child nodes in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    // === Required: inspection ===

    fn is_text(&self, node: &Self::Node) -> bool;

    fn is_element(&self, node: &Self::Node) -> bool;

    /// Text of a text node. `None` for elements.
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Lowercase tag name of an element.
    fn tag_name(&self, node: &Self::Node) -> Option<SmolStr>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    // === Required: mutation ===

    /// Replace `node` with `parts` in a single parent-level swap.
    ///
    /// Returns the number of span elements inserted, or
    /// `AnnotateError::Detached` if the node has no parent.
    fn replace_with_fragment(
        &self,
        node: &Self::Node,
        parts: &[FragmentPart],
    ) -> Result<usize, AnnotateError>;

    // === Provided: queries ===

    /// All elements under `root` (inclusive) carrying `class`, in document order.
    fn elements_with_class(&self, root: &Self::Node, class: &str) -> Vec<Self::Node> {
        let mut found = Vec::new();
        walk_elements(self, root, &mut |node| {
            if self.has_class(node, class) {
                found.push(node.clone());
            }
        });
        found
    }

    /// Whether any element strictly below `node` has the given tag.
    fn has_descendant_tag(&self, node: &Self::Node, tag: &str) -> bool {
        self.children(node).iter().any(|child| {
            find_element(self, child, |n| {
                self.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag))
            })
            .is_some()
        })
    }
}

/// Owner of generated stylesheet elements.
pub trait StyleSink {
    /// Remove any stylesheet element with `id`, then insert a fresh one
    /// containing `css`. Never appends to an existing sheet.
    fn replace_stylesheet(&self, id: &str, css: &str) -> Result<(), AnnotateError>;
}

/// First element under `root` (inclusive), in pre-order, matching `pred`.
///
/// Stops walking as soon as a match is found.
pub fn find_element<D, P>(dom: &D, root: &D::Node, mut pred: P) -> Option<D::Node>
where
    D: DomTree + ?Sized,
    P: FnMut(&D::Node) -> bool,
{
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if !dom.is_element(&node) {
            continue;
        }
        if pred(&node) {
            return Some(node);
        }
        let children = dom.children(&node);
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Depth-first pre-order walk over the elements under `root` (inclusive).
pub fn walk_elements<D, F>(dom: &D, root: &D::Node, visit: &mut F)
where
    D: DomTree + ?Sized,
    F: FnMut(&D::Node),
{
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if !dom.is_element(&node) {
            continue;
        }
        visit(&node);
        let children = dom.children(&node);
        stack.extend(children.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn test_find_element_stops_at_first_match() {
        let dom = MemoryDom::new();
        let block = dom.append_element(dom.body(), "div", &["block-content"]);
        let editor = dom.append_element(block, "textarea", &[]);
        for _ in 0..50 {
            let filler = dom.append_element(block, "div", &[]);
            dom.append_element(filler, "span", &[]);
        }

        let mut visited = 0;
        let found = find_element(&dom, &block, |n| {
            visited += 1;
            dom.tag_name(n).as_deref() == Some("textarea")
        });
        assert_eq!(found, Some(editor));
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_find_element_misses() {
        let dom = MemoryDom::new();
        let block = dom.append_element(dom.body(), "div", &[]);
        dom.append_text(block, "text only");
        assert_eq!(find_element(&dom, &block, |n| dom.has_class(n, "x")), None);
    }

    #[test]
    fn test_has_descendant_tag_excludes_self() {
        let dom = MemoryDom::new();
        let outer = dom.append_element(dom.body(), "textarea", &[]);
        assert!(!dom.has_descendant_tag(&outer, "textarea"));

        let block = dom.append_element(dom.body(), "div", &[]);
        let nested = dom.append_element(block, "p", &[]);
        dom.append_element(nested, "TEXTAREA", &[]);
        assert!(dom.has_descendant_tag(&block, "textarea"));
        assert!(!dom.has_descendant_tag(&block, "pre"));
    }
}
