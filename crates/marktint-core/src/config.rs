//! Engine configuration.
//!
//! Every field has a default reproducing the stock host integration, so a
//! partial (or empty) object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::classify::ExclusionRules;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotatorConfig {
    pub scan: ScanConfig,
    pub watch: WatchConfig,
    pub tags: TagConfig,
}

/// Where the pass looks and what it leaves alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Id of the host's root content container (observer target).
    pub root_id: SmolStr,
    /// Class identifying rendered content blocks.
    pub container_class: SmolStr,
    /// Tag of the raw-input widget marking a block as mid-edit.
    pub editor_tag: SmolStr,
    pub exclusions: ExclusionRules,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_id: SmolStr::new_static("app-container"),
            container_class: SmolStr::new_static("block-content"),
            editor_tag: SmolStr::new_static("textarea"),
            exclusions: ExclusionRules::default(),
        }
    }
}

/// Pass scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchConfig {
    /// Quiet period before a debounced pass runs.
    pub debounce_ms: u32,
    /// Cadence of the fallback pass.
    pub fallback_interval_ms: u32,
    /// Delay before the first pass after start.
    pub initial_delay_ms: u32,
    /// Host event fired after each navigation/render.
    pub navigation_event: SmolStr,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 800,
            fallback_interval_ms: 20_000,
            initial_delay_ms: 2_000,
            navigation_event: SmolStr::new_static("nav"),
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.into())
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_interval_ms.into())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms.into())
    }
}

/// Block-tag stylesheet generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagConfig {
    /// Content prefix marking a block as a tag.
    pub prefix: SmolStr,
    /// Id of the generated `<style>` element.
    pub style_id: SmolStr,
    pub background: SmolStr,
    pub foreground: SmolStr,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            prefix: SmolStr::new_static("++/"),
            style_id: SmolStr::new_static("auto-block-tags"),
            background: SmolStr::new_static("#ff9800"),
            foreground: SmolStr::new_static("white"),
        }
    }
}
