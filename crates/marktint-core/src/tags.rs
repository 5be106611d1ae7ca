//! Block-tag styling.
//!
//! Blocks whose content starts with the tag prefix (`++/` by default) are
//! rendered as pills wherever they are referenced inline. The host is asked
//! for every block's id and content, and a single stylesheet with one rule
//! per tag block is regenerated from scratch.
//!
//! The host query is best-effort. When the host API is missing or the query
//! fails, the previous stylesheet is left in place and the next pass retries.

use std::fmt::Write;
use std::future::Future;

use smol_str::SmolStr;

use crate::config::TagConfig;
use crate::tree::StyleSink;

/// One `(uuid, content)` row from the host content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRow {
    pub uuid: SmolStr,
    pub content: String,
}

impl BlockRow {
    pub fn new(uuid: impl Into<SmolStr>, content: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            content: content.into(),
        }
    }
}

/// Outcome of a host block query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Rows(Vec<BlockRow>),
    /// The host API is not present (yet).
    Unavailable,
    Failed(String),
}

/// Capability to query the host's content store.
pub trait BlockSource {
    fn query_blocks(&self) -> impl Future<Output = QueryResult>;
}

/// What a tag sub-pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The stylesheet was regenerated with this many rules.
    Applied { rules: usize },
    /// The query produced nothing usable; the stylesheet was not touched.
    Skipped,
}

/// Generates the tag stylesheet.
#[derive(Debug, Clone, Default)]
pub struct TagStyler {
    config: TagConfig,
}

impl TagStyler {
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// Rows whose trimmed content starts with the tag prefix.
    pub fn tagged_blocks<'a>(&self, rows: &'a [BlockRow]) -> Vec<&'a BlockRow> {
        rows.iter()
            .filter(|row| row.content.trim().starts_with(self.config.prefix.as_str()))
            .collect()
    }

    /// Full stylesheet text for the given rows.
    pub fn stylesheet(&self, rows: &[BlockRow]) -> String {
        let mut css = String::new();
        for row in self.tagged_blocks(rows) {
            self.write_rule(&mut css, &row.uuid);
        }
        css
    }

    fn write_rule(&self, css: &mut String, uuid: &str) {
        let _ = write!(
            css,
            r#".block-ref-wrap.inline:has([blockid="{uuid}"]):not(:has(.block-ref-wrap)) {{
    background-color: {bg} !important;
    color: {fg} !important;
    padding: 2px 12px !important;
    border-radius: 20px !important;
    display: inline-block !important;
    font-size: 0.75em !important;
    vertical-align: middle !important;
    line-height: 1.4 !important;
}}
"#,
            uuid = escape_attr_value(uuid),
            bg = self.config.background,
            fg = self.config.foreground,
        );
    }

    /// Apply a query result to `sink`.
    pub fn apply<S: StyleSink + ?Sized>(&self, result: QueryResult, sink: &S) -> TagOutcome {
        let rows = match result {
            QueryResult::Rows(rows) => rows,
            QueryResult::Unavailable => {
                tracing::debug!("tag styling: host API unavailable");
                return TagOutcome::Skipped;
            }
            QueryResult::Failed(reason) => {
                tracing::debug!(%reason, "tag styling: host query failed");
                return TagOutcome::Skipped;
            }
        };

        let rules = self.tagged_blocks(&rows).len();
        let css = self.stylesheet(&rows);
        match sink.replace_stylesheet(&self.config.style_id, &css) {
            Ok(()) => {
                tracing::debug!(rules, "tag styling: stylesheet regenerated");
                TagOutcome::Applied { rules }
            }
            Err(e) => {
                tracing::debug!(error = %e, "tag styling: could not install stylesheet");
                TagOutcome::Skipped
            }
        }
    }

    /// Query `source` and apply the result to `sink`.
    pub async fn refresh<B, S>(&self, source: &B, sink: &S) -> TagOutcome
    where
        B: BlockSource + ?Sized,
        S: StyleSink + ?Sized,
    {
        let result = source.query_blocks().await;
        self.apply(result, sink)
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::memory::MemoryDom;

    fn rows() -> Vec<BlockRow> {
        vec![
            BlockRow::new("u1", "++/alpha"),
            BlockRow::new("u2", "not tagged"),
            BlockRow::new("u3", "  ++/beta"),
        ]
    }

    struct FixedSource(QueryResult);

    impl BlockSource for FixedSource {
        async fn query_blocks(&self) -> QueryResult {
            self.0.clone()
        }
    }

    #[test]
    fn test_only_tagged_blocks_get_rules() {
        let styler = TagStyler::default();
        let css = styler.stylesheet(&rows());
        assert_eq!(css.matches("{\n").count(), 2);
        assert!(css.contains(r#"[blockid="u1"]"#));
        assert!(!css.contains(r#"[blockid="u2"]"#));
        assert!(css.contains(r#"[blockid="u3"]"#));
    }

    #[test]
    fn test_rule_shape() {
        let styler = TagStyler::default();
        let css = styler.stylesheet(&[BlockRow::new("u1", "++/alpha")]);
        insta::assert_snapshot!(css, @r#"
.block-ref-wrap.inline:has([blockid="u1"]):not(:has(.block-ref-wrap)) {
    background-color: #ff9800 !important;
    color: white !important;
    padding: 2px 12px !important;
    border-radius: 20px !important;
    display: inline-block !important;
    font-size: 0.75em !important;
    vertical-align: middle !important;
    line-height: 1.4 !important;
}
"#);
    }

    #[test]
    fn test_apply_replaces_previous_sheet() {
        let dom = MemoryDom::new();
        let styler = TagStyler::default();
        dom.replace_stylesheet("auto-block-tags", ".stale {}").unwrap();

        let outcome = styler.apply(QueryResult::Rows(rows()), &dom);
        assert_eq!(outcome, TagOutcome::Applied { rules: 2 });

        let sheets = dom.stylesheets();
        assert_eq!(sheets.len(), 1);
        let css = &sheets[0].css;
        assert!(!css.contains(".stale"));
        assert!(css.contains(r#"[blockid="u1"]"#));
        assert!(css.contains(r#"[blockid="u3"]"#));

        // A second run regenerates rather than appends.
        styler.apply(QueryResult::Rows(rows()), &dom);
        assert_eq!(dom.stylesheets().len(), 1);
        assert_eq!(dom.stylesheet("auto-block-tags").as_deref(), Some(css.as_str()));
    }

    #[test]
    fn test_no_tagged_blocks_clears_rules() {
        let dom = MemoryDom::new();
        let styler = TagStyler::default();
        styler.apply(QueryResult::Rows(rows()), &dom);
        let outcome = styler.apply(QueryResult::Rows(vec![BlockRow::new("u2", "plain")]), &dom);
        assert_eq!(outcome, TagOutcome::Applied { rules: 0 });
        assert_eq!(dom.stylesheet("auto-block-tags").as_deref(), Some(""));
    }

    #[test]
    fn test_failures_leave_sheet_alone() {
        let dom = MemoryDom::new();
        let styler = TagStyler::default();
        styler.apply(QueryResult::Rows(rows()), &dom);
        let before = dom.stylesheet("auto-block-tags");

        for result in [QueryResult::Unavailable, QueryResult::Failed("boom".into())] {
            assert_eq!(styler.apply(result, &dom), TagOutcome::Skipped);
        }
        assert_eq!(dom.stylesheet("auto-block-tags"), before);
    }

    #[test]
    fn test_refresh_queries_source() {
        let dom = MemoryDom::new();
        let styler = TagStyler::default();

        let outcome = block_on(styler.refresh(&FixedSource(QueryResult::Rows(rows())), &dom));
        assert_eq!(outcome, TagOutcome::Applied { rules: 2 });

        let outcome = block_on(styler.refresh(&FixedSource(QueryResult::Unavailable), &dom));
        assert_eq!(outcome, TagOutcome::Skipped);
        assert!(dom.stylesheet("auto-block-tags").is_some());
    }

    #[test]
    fn test_custom_prefix_and_colors() {
        let styler = TagStyler::new(TagConfig {
            prefix: "#tag/".into(),
            background: "teal".into(),
            ..TagConfig::default()
        });
        let css = styler.stylesheet(&[
            BlockRow::new("a", "#tag/x"),
            BlockRow::new("b", "++/y"),
        ]);
        assert!(css.contains(r#"[blockid="a"]"#));
        assert!(!css.contains(r#"[blockid="b"]"#));
        assert!(css.contains("background-color: teal !important;"));
    }

    #[test]
    fn test_uuid_quotes_are_escaped() {
        let styler = TagStyler::default();
        let css = styler.stylesheet(&[BlockRow::new(r#"x"]"#, "++/evil")]);
        assert!(css.contains(r#"[blockid="x\"]"]"#));
    }
}
