//! Core data types for page primitives

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default bound on a single intersection observation.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Execution context for one probe
///
/// Carries a cancellation token so a shutting-down host can abandon
/// pending observations, and an id for log correlation.
#[derive(Debug, Clone)]
pub struct ExecCtx {
    /// Cancellation token for cooperative cancellation
    pub cancel_token: CancellationToken,

    /// Unique identifier for this action
    pub action_id: String,
}

impl ExecCtx {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            action_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if this context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Default for ExecCtx {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

/// Visibility probe settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Bound on the intersection wait; `None` waits indefinitely
    pub probe_timeout: Option<Duration>,
}

impl ProbeConfig {
    /// Build from a millisecond setting where `0` means unbounded.
    pub fn from_millis(timeout_ms: u64) -> Self {
        Self {
            probe_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            probe_timeout: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Some(DEFAULT_PROBE_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_config_from_millis() {
        assert_eq!(ProbeConfig::from_millis(0), ProbeConfig::unbounded());
        assert_eq!(
            ProbeConfig::from_millis(250).probe_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(ProbeConfig::default().probe_timeout, Some(DEFAULT_PROBE_TIMEOUT));
    }

    #[test]
    fn test_exec_ctx_ids_are_unique() {
        let a = ExecCtx::default();
        let b = ExecCtx::default();
        assert_ne!(a.action_id, b.action_id);
        assert!(!a.is_cancelled());
    }
}
