use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed critical sections for lifecycle transitions.
///
/// Activation validates quota and overlap against concurrently-mutable
/// siblings; two activations for the same counted set must not interleave
/// between the check and the commit. Callers hold the guard for the whole
/// validate-and-commit window: assignment activation keys on
/// (role, territory), profile transitions key on the role.
#[derive(Debug, Default)]
pub struct TransitionSerializer {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TransitionSerializer {
    /// Creates a serializer with no held sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the critical section for a key, waiting for any current
    /// holder to finish.
    pub async fn acquire(&self, key: impl Into<String>) -> OwnedMutexGuard<()> {
        let section = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.into()).or_default())
        };

        section.lock_owned().await
    }
}
