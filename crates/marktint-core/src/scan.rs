//! The annotation pass.
//!
//! One pass visits every eligible container in the document, collects its
//! candidate text nodes, and replaces those carrying annotations. Collection
//! finishes before any replacement so the walk never sees its own edits.
//!
//! Passes are idempotent: generated spans hold only literal payload text, so
//! a second pass over unchanged content finds nothing to replace.

use std::cell::Cell;

use serde::Serialize;

use crate::classify::{ExclusionFilter, ExclusionRules, TextNodes, within_excluded};
use crate::config::ScanConfig;
use crate::markup::{has_annotations, parse_annotations};
use crate::replace::{ReplaceOutcome, build_fragment, replace_text_node};
use crate::tree::DomTree;

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Containers walked.
    pub containers: usize,
    /// Containers skipped because they host a live editor.
    pub skipped_editing: usize,
    /// Containers skipped because they sit inside an excluded region.
    pub skipped_excluded: usize,
    /// Text nodes swapped for fragments.
    pub replaced: usize,
    /// Spans inserted across all fragments.
    pub spans: usize,
    /// Text nodes the host removed before they could be replaced.
    pub detached: usize,
    /// Replacements the DOM rejected.
    pub failed: usize,
}

impl PassReport {
    /// Whether the pass changed the document.
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

/// Runs annotation passes with a fixed configuration and exclusion filter.
pub struct Annotator<F = ExclusionRules> {
    config: ScanConfig,
    filter: F,
    in_pass: Cell<bool>,
}

impl Annotator<ExclusionRules> {
    /// Annotator excluding the regions listed in `config.exclusions`.
    pub fn new(config: ScanConfig) -> Self {
        let filter = config.exclusions.clone();
        Self::with_filter(config, filter)
    }
}

impl<F> Annotator<F> {
    /// Annotator with a custom exclusion predicate.
    pub fn with_filter(config: ScanConfig, filter: F) -> Self {
        Self {
            config,
            filter,
            in_pass: Cell::new(false),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one full pass over `dom`.
    ///
    /// A call made while a pass is already running (for instance from a
    /// synchronous host callback) returns an empty report without touching
    /// the document.
    pub fn run_pass<D>(&self, dom: &D) -> PassReport
    where
        D: DomTree + ?Sized,
        F: ExclusionFilter<D>,
    {
        let mut report = PassReport::default();
        if self.in_pass.replace(true) {
            tracing::trace!("run_pass: pass already in progress, skipping");
            return report;
        }
        let _guard = PassGuard(&self.in_pass);

        let root = dom.document_root();
        for container in dom.elements_with_class(&root, &self.config.container_class) {
            if dom.has_descendant_tag(&container, &self.config.editor_tag) {
                report.skipped_editing += 1;
                continue;
            }
            if within_excluded(dom, &container, &self.filter) {
                report.skipped_excluded += 1;
                continue;
            }
            report.containers += 1;
            self.annotate_container(dom, &container, &mut report);
        }

        if report.changed() {
            tracing::debug!(
                containers = report.containers,
                replaced = report.replaced,
                spans = report.spans,
                detached = report.detached,
                "annotation pass"
            );
        } else {
            tracing::trace!(containers = report.containers, "annotation pass: no changes");
        }
        report
    }

    fn annotate_container<D>(&self, dom: &D, container: &D::Node, report: &mut PassReport)
    where
        D: DomTree + ?Sized,
        F: ExclusionFilter<D>,
    {
        let candidates: Vec<D::Node> = TextNodes::new(dom, container, &self.filter)
            .filter(|node| dom.text(node).is_some_and(|t| has_annotations(&t)))
            .collect();

        for node in candidates {
            // Re-read: the host may have rewritten the node since collection.
            let Some(text) = dom.text(&node) else {
                report.detached += 1;
                continue;
            };
            let tokens = parse_annotations(&text);
            if tokens.is_empty() {
                continue;
            }
            let parts = build_fragment(&text, &tokens);
            match replace_text_node(dom, &node, &parts) {
                Ok(ReplaceOutcome::Replaced { spans }) => {
                    report.replaced += 1;
                    report.spans += spans;
                }
                Ok(ReplaceOutcome::Detached) => report.detached += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "annotation replacement failed");
                    report.failed += 1;
                }
            }
        }
    }
}

struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::memory::{MemoryDom, NodeId};

    fn block(dom: &MemoryDom, text: &str) -> NodeId {
        let container = dom.append_element(dom.body(), "div", &["block-content"]);
        dom.append_text(container, text);
        container
    }

    fn annotator() -> Annotator {
        Annotator::new(ScanConfig::default())
    }

    #[test]
    fn test_plain_content_is_untouched() {
        let dom = MemoryDom::new();
        let container = block(&dom, "nothing to see ?? here t/r: no");
        let before = dom.outer_html(dom.body());

        let report = annotator().run_pass(&dom);
        assert_eq!(report.containers, 1);
        assert!(!report.changed());
        assert_eq!(dom.outer_html(dom.body()), before);
        assert!(dom.find_by_tag(container, "span").is_empty());
    }

    #[test]
    fn test_annotation_becomes_span() {
        let dom = MemoryDom::new();
        let container = block(&dom, "say ??t/r:Hello?? world");

        let report = annotator().run_pass(&dom);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.spans, 1);

        let spans = dom.find_by_tag(container, "span");
        assert_eq!(spans.len(), 1);
        assert_eq!(dom.text_content(spans[0]), "Hello");
        assert!(dom.has_class(&spans[0], "ls-text-r"));
        assert_eq!(dom.text_content(container), "say Hello world");
        assert!(!dom.text_content(container).contains("??"));
    }

    #[test]
    fn test_raw_background_span() {
        let dom = MemoryDom::new();
        let container = block(&dom, "??b/ff0000:alert??");
        annotator().run_pass(&dom);

        let spans = dom.find_by_tag(container, "span");
        assert_eq!(spans.len(), 1);
        assert_eq!(
            dom.style_of(spans[0]).as_deref(),
            Some("background-color: #ff0000 !important; color: white !important")
        );
    }

    #[test]
    fn test_pass_is_idempotent() {
        let dom = MemoryDom::new();
        block(&dom, "a ??t/r:one?? b ??b/y:two??");
        let nested = dom.append_element(dom.body(), "div", &["block-content"]);
        let em = dom.append_element(nested, "em", &[]);
        dom.append_text(em, "??t/00f:deep??");

        let annotator = annotator();
        let first = annotator.run_pass(&dom);
        assert_eq!(first.replaced, 2);
        let after_first = dom.outer_html(dom.body());

        let second = annotator.run_pass(&dom);
        assert!(!second.changed());
        assert_eq!(dom.outer_html(dom.body()), after_first);
    }

    #[test]
    fn test_excluded_regions_survive_every_pass() {
        let dom = MemoryDom::new();
        let container = dom.append_element(dom.body(), "div", &["block-content"]);
        let code = dom.append_element(container, "code", &[]);
        dom.append_text(code, "??t/r:literal??");
        let pre = dom.append_element(container, "pre", &[]);
        dom.append_text(pre, "??b/g:literal??");
        let cm = dom.append_element(container, "div", &["cm-content"]);
        dom.append_text(cm, "??b/g:editor??");
        dom.append_text(container, "??t/g:styled??");

        let annotator = annotator();
        for _ in 0..3 {
            annotator.run_pass(&dom);
        }
        assert_eq!(dom.text_content(code), "??t/r:literal??");
        assert_eq!(dom.text_content(pre), "??b/g:literal??");
        assert_eq!(dom.text_content(cm), "??b/g:editor??");
        assert_eq!(dom.find_by_tag(container, "span").len(), 1);
    }

    #[test]
    fn test_editing_container_is_skipped_entirely() {
        let dom = MemoryDom::new();
        let editing = dom.append_element(dom.body(), "div", &["block-content"]);
        dom.append_text(editing, "??t/r:not yet??");
        dom.append_element(editing, "textarea", &[]);
        let done = block(&dom, "??t/r:done??");

        let report = annotator().run_pass(&dom);
        assert_eq!(report.skipped_editing, 1);
        assert_eq!(report.replaced, 1);
        assert!(dom.find_by_tag(editing, "span").is_empty());
        assert_eq!(dom.find_by_tag(done, "span").len(), 1);
    }

    #[test]
    fn test_container_inside_excluded_region_is_skipped() {
        let dom = MemoryDom::new();
        let pre = dom.append_element(dom.body(), "pre", &[]);
        let container = dom.append_element(pre, "div", &["block-content"]);
        dom.append_text(container, "??t/r:x??");

        let report = annotator().run_pass(&dom);
        assert_eq!(report.skipped_excluded, 1);
        assert_eq!(dom.text_content(container), "??t/r:x??");
    }

    #[test]
    fn test_content_outside_containers_is_ignored() {
        let dom = MemoryDom::new();
        let loose = dom.append_element(dom.body(), "p", &[]);
        dom.append_text(loose, "??t/r:loose??");
        annotator().run_pass(&dom);
        assert_eq!(dom.text_content(loose), "??t/r:loose??");
    }

    #[test]
    fn test_reentrant_pass_is_a_no_op() {
        type Hook = Rc<RefCell<Option<Box<dyn Fn() -> PassReport>>>>;

        let dom = Rc::new(MemoryDom::new());
        block(&dom, "??t/r:x??");

        // The filter calls back into the running annotator, as a synchronous
        // host callback would.
        let hook: Hook = Rc::new(RefCell::new(None));
        let nested = Rc::new(Cell::new(None));
        let filter = {
            let hook = hook.clone();
            let nested = nested.clone();
            move |d: &MemoryDom, node: &NodeId| {
                if nested.get().is_none() {
                    if let Some(run) = hook.borrow().as_ref() {
                        nested.set(Some(run()));
                    }
                }
                ExclusionRules::default().is_excluded(d, node)
            }
        };
        let annotator = Rc::new(Annotator::with_filter(ScanConfig::default(), filter));
        {
            let weak = Rc::downgrade(&annotator);
            let dom = dom.clone();
            *hook.borrow_mut() = Some(Box::new(move || {
                weak.upgrade()
                    .map(|a| a.run_pass(&*dom))
                    .unwrap_or_default()
            }));
        }

        let report = annotator.run_pass(&*dom);
        assert_eq!(nested.get(), Some(PassReport::default()));
        assert_eq!(report.replaced, 1);
    }

    #[test]
    fn test_guard_resets_after_pass() {
        let dom = MemoryDom::new();
        let annotator = annotator();
        annotator.run_pass(&dom);
        assert!(!annotator.in_pass.get());
        block(&dom, "??t/r:later??");
        assert_eq!(annotator.run_pass(&dom).replaced, 1);
    }
}
