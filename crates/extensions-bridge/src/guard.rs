use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::BridgeError;

/// One-shot installation state for a document context.
///
/// The host owns one guard per document; the first claim wins and every
/// later claim fails. It is never reset.
#[derive(Debug, Default)]
pub struct InjectionGuard {
    injected: AtomicBool,
}

impl InjectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self) -> Result<(), BridgeError> {
        if self.injected.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyInjected);
        }
        Ok(())
    }

    pub fn is_injected(&self) -> bool {
        self.injected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails() {
        let guard = InjectionGuard::new();
        assert!(!guard.is_injected());
        guard.claim().unwrap();
        assert_eq!(guard.claim(), Err(BridgeError::AlreadyInjected));
        assert!(guard.is_injected());
    }
}
