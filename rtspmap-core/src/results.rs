use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rtspmap_types::StreamHit;

/// Append-only hit collection shared by every worker of one scan.
///
/// Clones share the same storage. Created by the coordinator at scan start
/// and frozen into a plain `Vec` once every worker has joined.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    hits: Arc<Mutex<Vec<StreamHit>>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, hit: StreamHit) {
        self.lock().push(hit);
    }

    /// Append a batch under one lock, so a host's hits stay contiguous and
    /// in the order given.
    pub fn extend(&self, hits: impl IntoIterator<Item = StreamHit>) {
        self.lock().extend(hits);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<StreamHit> {
        self.lock().clone()
    }

    /// Consume this handle and return the hits. Avoids a copy when this is
    /// the last handle.
    pub fn freeze(self) -> Vec<StreamHit> {
        match Arc::try_unwrap(self.hits) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => Self { hits: shared }.snapshot(),
        }
    }

    // Poisoning is ignored: a push that panicked still leaves the Vec valid.
    fn lock(&self) -> MutexGuard<'_, Vec<StreamHit>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
