use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ResolvedPackage;

/// Memoized registry metadata, keyed by `name@normalized-requirement`.
/// Owned by whoever constructs the resolver, so tests get a fresh one per
/// resolver instead of sharing process state.
#[derive(Clone, Default)]
pub struct MetadataCache {
    entries: Arc<Mutex<HashMap<String, ResolvedPackage>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn lookup(&self, key: &str) -> Option<ResolvedPackage> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, package: ResolvedPackage) {
        self.entries.lock().await.insert(key, package);
    }
}
