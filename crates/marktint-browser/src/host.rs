//! Bridge to the host application's content store.
//!
//! The host exposes a Datalog query entry point at
//! `window.logseq.api.datascript_query`. It may be absent while the app is
//! still booting, in which case the query reports `Unavailable`.

use js_sys::{Array, Function, Promise, Reflect};
use marktint_core::{AnnotateError, BlockRow, BlockSource, QueryResult};
use smol_str::SmolStr;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::dom::js_message;

/// Every block's uuid and raw content.
pub const BLOCKS_QUERY: &str =
    "[:find ?uuid ?content :where [?b :block/uuid ?uuid] [?b :block/content ?content]]";

/// `BlockSource` calling into the page's host API.
#[derive(Debug, Default, Clone)]
pub struct LogseqBlocks {
    query: Option<String>,
}

impl LogseqBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom query. It must still return `[uuid, content]` pairs.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }

    fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or(BLOCKS_QUERY)
    }

    /// `(api object, query function)`, if the host has installed them.
    fn query_fn() -> Option<(JsValue, Function)> {
        let window = web_sys::window()?;
        let logseq = get(&window, "logseq")?;
        let api = get(&logseq, "api")?;
        let func = get(&api, "datascript_query")?.dyn_into::<Function>().ok()?;
        Some((api, func))
    }
}

fn query_failed(err: &JsValue) -> QueryResult {
    QueryResult::Failed(AnnotateError::Query(js_message(err)).to_string())
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

impl BlockSource for LogseqBlocks {
    async fn query_blocks(&self) -> QueryResult {
        let Some((api, func)) = Self::query_fn() else {
            return QueryResult::Unavailable;
        };

        let returned = match func.call1(&api, &JsValue::from_str(self.query_text())) {
            Ok(value) => value,
            Err(e) => return query_failed(&e),
        };
        let resolved = match returned.dyn_into::<Promise>() {
            Ok(promise) => match JsFuture::from(promise).await {
                Ok(value) => value,
                Err(e) => return query_failed(&e),
            },
            // Older hosts answer synchronously.
            Err(value) => value,
        };

        if resolved.is_null() || resolved.is_undefined() {
            return QueryResult::Unavailable;
        }
        parse_rows(&resolved)
    }
}

/// Decode `[[uuid, content], ...]`.
///
/// Rows whose content is not a string (pages, properties-only blocks) are
/// skipped; a result that is not an array at all is a failure.
pub fn parse_rows(value: &JsValue) -> QueryResult {
    if !Array::is_array(value) {
        return QueryResult::Failed("query result is not an array".into());
    }
    let rows = Array::from(value);
    let mut out = Vec::with_capacity(rows.length() as usize);
    for row in rows.iter() {
        if !Array::is_array(&row) {
            tracing::trace!("skipping malformed query row");
            continue;
        }
        let row = Array::from(&row);
        let Some(uuid) = uuid_string(&row.get(0)) else {
            tracing::trace!("skipping query row without uuid");
            continue;
        };
        let Some(content) = row.get(1).as_string() else {
            continue;
        };
        out.push(BlockRow { uuid, content });
    }
    QueryResult::Rows(out)
}

/// Uuids arrive either as strings or as ClojureScript UUID objects, whose
/// `toString()` yields the canonical form.
fn uuid_string(value: &JsValue) -> Option<SmolStr> {
    if let Some(s) = value.as_string() {
        return Some(SmolStr::new(s));
    }
    if value.is_object() {
        let s: String = value.unchecked_ref::<js_sys::Object>().to_string().into();
        if !s.is_empty() && s != "[object Object]" {
            return Some(SmolStr::new(s));
        }
    }
    None
}
