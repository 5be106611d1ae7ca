//! Arena-backed in-memory document.
//!
//! `MemoryDom` implements `DomTree` and `StyleSink` without a browser. It is
//! what the native test suite runs the annotation pass against, and it can
//! serialize subtrees to HTML for structural comparisons.

use std::cell::RefCell;

use smol_str::SmolStr;

use crate::error::AnnotateError;
use crate::replace::FragmentPart;
use crate::tree::{DomTree, StyleSink};

/// Handle into a `MemoryDom` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: SmolStr,
        id: Option<SmolStr>,
        classes: Vec<SmolStr>,
        style: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A generated `<style>` element living in the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub id: SmolStr,
    pub css: String,
}

/// In-memory document with a `<body>` root and a stylesheet head.
#[derive(Debug)]
pub struct MemoryDom {
    nodes: RefCell<Vec<NodeData>>,
    head: RefCell<Vec<Stylesheet>>,
    body: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let body = NodeData {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: SmolStr::new_static("body"),
                id: None,
                classes: Vec::new(),
                style: None,
            },
        };
        Self {
            nodes: RefCell::new(vec![body]),
            head: RefCell::new(Vec::new()),
            body: NodeId(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn push(&self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(NodeData {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        id
    }

    /// Append an element with the given tag and classes under `parent`.
    pub fn append_element(&self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        self.push(
            Some(parent),
            NodeKind::Element {
                tag: SmolStr::new(tag),
                id: None,
                classes: classes.iter().map(SmolStr::new).collect(),
                style: None,
            },
        )
    }

    /// Append a text node under `parent`.
    pub fn append_text(&self, parent: NodeId, text: &str) -> NodeId {
        self.push(Some(parent), NodeKind::Text(text.to_string()))
    }

    /// Set the `id` attribute of an element.
    pub fn set_id(&self, node: NodeId, value: &str) {
        if let NodeKind::Element { id, .. } = &mut self.nodes.borrow_mut()[node.0].kind {
            *id = Some(SmolStr::new(value));
        }
    }

    /// Remove a node from its parent, as a host re-render would.
    pub fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Inline `style` attribute of an element.
    pub fn style_of(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            NodeKind::Element { style, .. } => style.clone(),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        write_html(&nodes, node, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        for child in &nodes[node.0].children {
            write_html(&nodes, *child, &mut out);
        }
        out
    }

    /// Elements under `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        crate::tree::walk_elements(self, &root, &mut |node: &NodeId| {
            if self.tag_name(node).is_some_and(|t| t == tag) {
                found.push(*node);
            }
        });
        found
    }

    /// CSS of the generated stylesheet with `id`, if present.
    pub fn stylesheet(&self, id: &str) -> Option<String> {
        self.head
            .borrow()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.css.clone())
    }

    /// All generated stylesheets, in insertion order.
    pub fn stylesheets(&self) -> Vec<Stylesheet> {
        self.head.borrow().clone()
    }
}

fn collect_text(nodes: &[NodeData], node: NodeId, out: &mut String) {
    match &nodes[node.0].kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element { .. } => {
            for child in &nodes[node.0].children {
                collect_text(nodes, *child, out);
            }
        }
    }
}

fn write_html(nodes: &[NodeData], node: NodeId, out: &mut String) {
    match &nodes[node.0].kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Element {
            tag,
            id,
            classes,
            style,
        } => {
            out.push('<');
            out.push_str(tag);
            if let Some(id) = id {
                out.push_str(&format!(" id=\"{}\"", escape_attr(id)));
            }
            if !classes.is_empty() {
                out.push_str(&format!(" class=\"{}\"", escape_attr(&classes.join(" "))));
            }
            if let Some(style) = style {
                out.push_str(&format!(" style=\"{}\"", escape_attr(style)));
            }
            out.push('>');
            for child in &nodes[node.0].children {
                write_html(nodes, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

impl DomTree for MemoryDom {
    type Node = NodeId;

    fn document_root(&self) -> NodeId {
        self.body
    }

    fn element_by_id(&self, wanted: &str) -> Option<NodeId> {
        crate::tree::find_element(self, &self.body, |node: &NodeId| {
            matches!(
                &self.nodes.borrow()[node.0].kind,
                NodeKind::Element { id: Some(id), .. } if id == wanted
            )
        })
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(
            self.nodes.borrow().get(node.0).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(
            self.nodes.borrow().get(node.0).map(|n| &n.kind),
            Some(NodeKind::Element { .. })
        )
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<SmolStr> {
        match &self.nodes.borrow().get(node.0)?.kind {
            NodeKind::Element { tag, .. } => Some(SmolStr::new(tag.to_ascii_lowercase())),
            NodeKind::Text(_) => None,
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        match self.nodes.borrow().get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn replace_with_fragment(
        &self,
        node: &NodeId,
        parts: &[FragmentPart],
    ) -> Result<usize, AnnotateError> {
        let parent = self.parent(node).ok_or(AnnotateError::Detached)?;

        let mut created = Vec::with_capacity(parts.len());
        let mut spans = 0;
        for part in parts {
            match part {
                FragmentPart::Text(text) => {
                    created.push(self.push(None, NodeKind::Text(text.clone())));
                }
                FragmentPart::Span { text, style } => {
                    let span = self.push(
                        None,
                        NodeKind::Element {
                            tag: SmolStr::new_static("span"),
                            id: None,
                            classes: style.classes.clone(),
                            style: style.style_attr(),
                        },
                    );
                    let inner = self.push(Some(span), NodeKind::Text(text.clone()));
                    debug_assert_eq!(self.parent(&inner), Some(span));
                    created.push(span);
                    spans += 1;
                }
            }
        }

        let mut nodes = self.nodes.borrow_mut();
        let index = nodes[parent.0]
            .children
            .iter()
            .position(|c| c == node)
            .ok_or(AnnotateError::Detached)?;
        for id in &created {
            nodes[id.0].parent = Some(parent);
        }
        nodes[parent.0].children.splice(index..=index, created);
        nodes[node.0].parent = None;
        Ok(spans)
    }
}

impl StyleSink for MemoryDom {
    fn replace_stylesheet(&self, id: &str, css: &str) -> Result<(), AnnotateError> {
        let mut head = self.head.borrow_mut();
        head.retain(|s| s.id != id);
        head.push(Stylesheet {
            id: SmolStr::new(id),
            css: css.to_string(),
        });
        Ok(())
    }
}
