//! Cancellation tokens for superseded renders
//!
//! Provides cancellation tokens that let an in-flight render learn that its
//! result is no longer wanted. A [`SupersessionRegistry`] keeps one live
//! token per key (for the viewer, per page slot): issuing a new token for a
//! key cancels the one it replaces.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

/// Cancellation token for cooperative cancellation
///
/// Multiple tokens can share the same underlying cancellation state via Arc.
///
/// # Example
///
/// ```
/// use flipbook_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Cancel this token
    ///
    /// All clones of this token observe the cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if this token or any clone has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True when both tokens share the same cancellation state
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the live token for each key
///
/// # Example
///
/// ```
/// use flipbook_scheduler::SupersessionRegistry;
///
/// let registry = SupersessionRegistry::new();
///
/// let first = registry.issue("right");
/// let second = registry.issue("right");
///
/// assert!(first.is_cancelled());
/// assert!(!second.is_cancelled());
/// ```
pub struct SupersessionRegistry<K> {
    tokens: Mutex<HashMap<K, CancellationToken>>,
}

impl<K> SupersessionRegistry<K>
where
    K: Eq + Hash + Copy,
{
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { tokens: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CancellationToken>> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issue a fresh token for `key`, cancelling the token it supersedes
    pub fn issue(&self, key: K) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.lock().insert(key, token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancel every live token
    ///
    /// Returns the number of tokens cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut tokens = self.lock();
        let count = tokens.len();
        for (_, token) in tokens.drain() {
            token.cancel();
        }
        count
    }

    /// Mark the work behind `token` as finished
    ///
    /// Only unregisters when `token` is still the live token for `key`, so a
    /// late completion cannot evict its successor. Returns `true` when the
    /// token was live and not cancelled, i.e. its result may be presented.
    pub fn complete(&self, key: K, token: &CancellationToken) -> bool {
        let mut tokens = self.lock();
        let live = tokens.get(&key).is_some_and(|current| current.same_as(token));
        if live {
            tokens.remove(&key);
        }
        live && !token.is_cancelled()
    }

    /// Number of keys with a live token
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K> Default for SupersessionRegistry<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for SupersessionRegistry<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupersessionRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_basic() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_clone() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token1.cancel();
        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
        assert!(token1.same_as(&token2));
        assert!(!token1.same_as(&CancellationToken::new()));
    }

    #[test]
    fn test_cancellation_token_idempotent() {
        let token = CancellationToken::default();

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_issue_supersedes_previous() {
        let registry = SupersessionRegistry::new();

        let first = registry.issue(1_u8);
        let second = registry.issue(1_u8);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let registry = SupersessionRegistry::new();

        let left = registry.issue('l');
        let right = registry.issue('r');
        let _right_again = registry.issue('r');

        assert!(!left.is_cancelled());
        assert!(right.is_cancelled());
    }

    #[test]
    fn test_complete_live_token() {
        let registry = SupersessionRegistry::new();

        let token = registry.issue(1_u8);
        assert_eq!(registry.len(), 1);
        assert!(registry.complete(1, &token));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_complete_superseded_token_keeps_successor() {
        let registry = SupersessionRegistry::new();

        let stale = registry.issue(1_u8);
        let fresh = registry.issue(1_u8);

        assert!(!registry.complete(1, &stale));
        assert_eq!(registry.len(), 1);
        assert!(registry.complete(1, &fresh));
    }

    #[test]
    fn test_cancel_all() {
        let registry = SupersessionRegistry::new();

        let a = registry.issue(1_u8);
        let b = registry.issue(2_u8);

        assert_eq!(registry.cancel_all(), 2);
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(registry.is_empty());
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn test_complete_after_cancel_is_rejected() {
        let registry = SupersessionRegistry::new();

        let token = registry.issue(1_u8);
        token.cancel();

        assert!(!registry.complete(1, &token));
    }
}
