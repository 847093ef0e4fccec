//! Dispatcher settings.

use serde::{Deserialize, Serialize};

fn default_probe_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Identifier announced on `give-me-the-frame-id`; generated when absent
    #[serde(default)]
    pub frame_id: Option<String>,
    /// Bound on a visibility observation; `0` waits indefinitely
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Honor `executedBlockOnWeb` by marking the document element
    #[serde(default = "default_true")]
    pub show_executed_block: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            frame_id: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            show_executed_block: true,
        }
    }
}
