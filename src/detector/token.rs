//! Cooperative cancellation flag for the inference loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "keep looping" flag.
///
/// The detector arms it when the loop starts. Any stop path (user stop,
/// visibility change, teardown) disarms it immediately, even before the
/// detector gets to process the matching command; the loop observes it at
/// iteration boundaries.
#[derive(Debug, Clone, Default)]
pub struct LoopToken(Arc<AtomicBool>);

impl LoopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Disarm the token. Returns `true` only for the call that actually
    /// flipped it, so racing stop paths can tell who won.
    pub fn disarm(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disarmed() {
        assert!(!LoopToken::new().is_armed());
    }

    #[test]
    fn test_only_first_disarm_wins() {
        let token = LoopToken::new();
        let other = token.clone();
        token.arm();
        assert!(other.is_armed());
        assert!(other.disarm());
        assert!(!token.disarm());
        assert!(!token.is_armed());
    }
}
