//! `DomTree` over the live browser DOM.

use marktint_core::{AnnotateError, DomTree, FragmentPart, SpanStyle, StyleSink};
use smol_str::SmolStr;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

/// Best-effort message from a thrown JS value.
pub fn js_message(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Convert a rejected DOM call into an `AnnotateError`.
pub fn dom_error(err: JsValue) -> AnnotateError {
    AnnotateError::Dom(js_message(&err))
}

/// The page document, viewed as a `DomTree`.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The current window's document, if there is one.
    pub fn from_window() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn build_span(&self, text: &str, style: &SpanStyle) -> Result<Element, JsValue> {
        let span = self.document.create_element("span")?;
        span.set_class_name(&style.class_attr());
        if let Some(html) = span.dyn_ref::<HtmlElement>() {
            let css = html.style();
            for decl in &style.declarations {
                let priority = if decl.important { "important" } else { "" };
                css.set_property_with_priority(&decl.property, &decl.value, priority)?;
            }
        }
        span.set_text_content(Some(text));
        Ok(span)
    }
}

impl DomTree for WebDom {
    type Node = Node;

    fn document_root(&self) -> Node {
        match self.document.body() {
            Some(body) => body.into(),
            None => self.document.clone().into(),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<Node> {
        self.document.get_element_by_id(id).map(Node::from)
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn is_text(&self, node: &Node) -> bool {
        node.node_type() == Node::TEXT_NODE
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn text(&self, node: &Node) -> Option<String> {
        if self.is_text(node) {
            node.node_value()
        } else {
            None
        }
    }

    fn tag_name(&self, node: &Node) -> Option<SmolStr> {
        node.dyn_ref::<Element>()
            .map(|el| SmolStr::new(el.tag_name().to_ascii_lowercase()))
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn replace_with_fragment(
        &self,
        node: &Node,
        parts: &[FragmentPart],
    ) -> Result<usize, AnnotateError> {
        let parent = node.parent_node().ok_or(AnnotateError::Detached)?;

        let fragment = self.document.create_document_fragment();
        let mut spans = 0;
        for part in parts {
            match part {
                FragmentPart::Text(text) => {
                    let text = self.document.create_text_node(text);
                    fragment.append_child(&text).map_err(dom_error)?;
                }
                FragmentPart::Span { text, style } => {
                    let span = self.build_span(text, style).map_err(dom_error)?;
                    fragment.append_child(&span).map_err(dom_error)?;
                    spans += 1;
                }
            }
        }

        // The host may have moved the node while the fragment was built.
        if node.parent_node().as_ref() != Some(&parent) {
            return Err(AnnotateError::Detached);
        }
        parent.replace_child(&fragment, node).map_err(dom_error)?;
        Ok(spans)
    }

    fn elements_with_class(&self, root: &Node, class: &str) -> Vec<Node> {
        let selector = format!(".{class}");
        let list = if let Some(el) = root.dyn_ref::<Element>() {
            el.query_selector_all(&selector)
        } else if let Some(doc) = root.dyn_ref::<Document>() {
            doc.query_selector_all(&selector)
        } else {
            return Vec::new();
        };
        let list = match list {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %dom_error(e), %selector, "class query rejected");
                return Vec::new();
            }
        };

        let mut found = Vec::with_capacity(list.length() as usize + 1);
        if self.has_class(root, class) {
            found.push(root.clone());
        }
        found.extend((0..list.length()).filter_map(|i| list.get(i)));
        found
    }

    fn has_descendant_tag(&self, node: &Node, tag: &str) -> bool {
        node.dyn_ref::<Element>()
            .and_then(|el| el.query_selector(tag).ok().flatten())
            .is_some()
    }
}

impl StyleSink for WebDom {
    fn replace_stylesheet(&self, id: &str, css: &str) -> Result<(), AnnotateError> {
        if let Some(old) = self.document.get_element_by_id(id) {
            old.remove();
        }
        let head = self
            .document
            .head()
            .ok_or_else(|| AnnotateError::Dom("document has no head".into()))?;
        let style = self.document.create_element("style").map_err(dom_error)?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style).map_err(dom_error)?;
        Ok(())
    }
}
