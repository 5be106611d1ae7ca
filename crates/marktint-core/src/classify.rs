//! Node classification: which text nodes may be annotated.
//!
//! Code, preformatted blocks, live editors, input widgets and style/script
//! elements must keep their literal text. Exclusion is a predicate over
//! elements (`ExclusionFilter`), injected into a generic depth-first
//! text-node iterator (`TextNodes`) that prunes excluded subtrees.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::tree::DomTree;

/// Decides whether an element's subtree is off-limits.
pub trait ExclusionFilter<D: DomTree + ?Sized> {
    fn is_excluded(&self, dom: &D, element: &D::Node) -> bool;
}

impl<D, F> ExclusionFilter<D> for F
where
    D: DomTree + ?Sized,
    F: Fn(&D, &D::Node) -> bool,
{
    fn is_excluded(&self, dom: &D, element: &D::Node) -> bool {
        self(dom, element)
    }
}

/// Tag and class based exclusion set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExclusionRules {
    /// Lowercase tag names (`code`, `pre`, ...).
    pub tags: Vec<SmolStr>,
    /// Class names (`cm-content` for CodeMirror).
    pub classes: Vec<SmolStr>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            tags: ["code", "pre", "textarea", "style", "script"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            classes: vec![SmolStr::new_static("cm-content")],
        }
    }
}

impl ExclusionRules {
    /// Equivalent CSS selector list, e.g. for `Element.closest()`.
    pub fn selector(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.to_string())
            .chain(self.classes.iter().map(|c| format!(".{}", c)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<D: DomTree + ?Sized> ExclusionFilter<D> for ExclusionRules {
    fn is_excluded(&self, dom: &D, element: &D::Node) -> bool {
        if let Some(tag) = dom.tag_name(element) {
            if self.tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                return true;
            }
        }
        self.classes.iter().any(|c| dom.has_class(element, c))
    }
}

/// Whether `node` or any of its ancestors is excluded.
pub fn within_excluded<D, F>(dom: &D, node: &D::Node, filter: &F) -> bool
where
    D: DomTree + ?Sized,
    F: ExclusionFilter<D> + ?Sized,
{
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if dom.is_element(&n) && filter.is_excluded(dom, &n) {
            return true;
        }
        current = dom.parent(&n);
    }
    false
}

/// Depth-first iterator over eligible text nodes under a container.
///
/// Excluded elements are pruned with their whole subtree. The container
/// itself is subject to the filter too. Children are read lazily as the
/// walk reaches them, so nodes removed mid-walk are simply not visited.
pub struct TextNodes<'a, D: DomTree + ?Sized, F: ?Sized> {
    dom: &'a D,
    filter: &'a F,
    stack: Vec<D::Node>,
}

impl<'a, D, F> TextNodes<'a, D, F>
where
    D: DomTree + ?Sized,
    F: ExclusionFilter<D> + ?Sized,
{
    pub fn new(dom: &'a D, container: &D::Node, filter: &'a F) -> Self {
        Self {
            dom,
            filter,
            stack: vec![container.clone()],
        }
    }
}

impl<D, F> Iterator for TextNodes<'_, D, F>
where
    D: DomTree + ?Sized,
    F: ExclusionFilter<D> + ?Sized,
{
    type Item = D::Node;

    fn next(&mut self) -> Option<D::Node> {
        while let Some(node) = self.stack.pop() {
            if self.dom.is_text(&node) {
                return Some(node);
            }
            if !self.dom.is_element(&node) {
                continue;
            }
            if self.filter.is_excluded(self.dom, &node) {
                tracing::trace!(tag = ?self.dom.tag_name(&node), "pruning excluded subtree");
                continue;
            }
            let children = self.dom.children(&node);
            self.stack.extend(children.into_iter().rev());
        }
        None
    }
}

/// Collect the eligible text nodes under `container` in document order.
pub fn text_nodes<D, F>(dom: &D, container: &D::Node, filter: &F) -> Vec<D::Node>
where
    D: DomTree + ?Sized,
    F: ExclusionFilter<D> + ?Sized,
{
    TextNodes::new(dom, container, filter).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDom, NodeId};

    fn texts(dom: &MemoryDom, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().filter_map(|n| dom.text(n)).collect()
    }

    #[test]
    fn test_walk_is_document_order() {
        let dom = MemoryDom::new();
        let div = dom.append_element(dom.body(), "div", &[]);
        dom.append_text(div, "one");
        let p = dom.append_element(div, "p", &[]);
        dom.append_text(p, "two");
        dom.append_text(div, "three");

        let nodes = text_nodes(&dom, &div, &ExclusionRules::default());
        assert_eq!(texts(&dom, &nodes), ["one", "two", "three"]);
    }

    #[test]
    fn test_default_rules_prune_code_regions() {
        let dom = MemoryDom::new();
        let div = dom.append_element(dom.body(), "div", &[]);
        dom.append_text(div, "keep");
        for tag in ["code", "pre", "textarea", "style", "script"] {
            let el = dom.append_element(div, tag, &[]);
            let inner = dom.append_element(el, "span", &[]);
            dom.append_text(inner, tag);
        }
        let cm = dom.append_element(div, "div", &["cm-content"]);
        dom.append_text(cm, "editor");

        let rules = ExclusionRules::default();
        let nodes: Vec<_> = TextNodes::new(&dom, &div, &rules).collect();
        assert_eq!(texts(&dom, &nodes), ["keep"]);
    }

    #[test]
    fn test_closure_filter() {
        let dom = MemoryDom::new();
        let div = dom.append_element(dom.body(), "div", &[]);
        let skip = dom.append_element(div, "aside", &[]);
        dom.append_text(skip, "hidden");
        dom.append_text(div, "shown");

        let filter = |dom: &MemoryDom, node: &NodeId| dom.tag_name(node).as_deref() == Some("aside");
        let nodes: Vec<_> = TextNodes::new(&dom, &div, &filter).collect();
        assert_eq!(texts(&dom, &nodes), ["shown"]);
    }

    #[test]
    fn test_within_excluded_checks_ancestors() {
        let dom = MemoryDom::new();
        let pre = dom.append_element(dom.body(), "pre", &[]);
        let inner = dom.append_element(pre, "div", &["block-content"]);
        let outside = dom.append_element(dom.body(), "div", &["block-content"]);

        let rules = ExclusionRules::default();
        assert!(within_excluded(&dom, &inner, &rules));
        assert!(!within_excluded(&dom, &outside, &rules));
    }

    #[test]
    fn test_selector() {
        assert_eq!(
            ExclusionRules::default().selector(),
            "code, pre, textarea, style, script, .cm-content"
        );
    }

    #[test]
    fn test_tag_match_ignores_case() {
        let dom = MemoryDom::new();
        let code = dom.append_element(dom.body(), "CODE", &[]);
        assert!(ExclusionRules::default().is_excluded(&dom, &code));
    }
}
