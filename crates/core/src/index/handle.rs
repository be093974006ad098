use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::info;

use super::IndexArtifacts;

/// Shared reference to the bundle currently being served.
///
/// Readers take an `Arc` snapshot and query it without holding the lock, so
/// an in-flight query keeps seeing the bundle it started with while
/// `replace` installs a new one. There is a single writer (the loader) and
/// any number of readers.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<IndexArtifacts>>,
}

impl IndexHandle {
    pub fn new(artifacts: IndexArtifacts) -> Self {
        Self { current: RwLock::new(Arc::new(artifacts)) }
    }

    pub fn snapshot(&self) -> Arc<IndexArtifacts> {
        // The guarded value is a plain Arc swap; a poisoned lock still holds
        // a complete bundle.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in a new bundle and returns the one it replaced.
    pub fn replace(&self, artifacts: IndexArtifacts) -> Arc<IndexArtifacts> {
        let next = Arc::new(artifacts);
        let product_count = next.products.len();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        drop(guard);

        info!(
            event_name = "index.swapped",
            product_count,
            previous_product_count = previous.products.len(),
            "index bundle replaced"
        );
        previous
    }
}

static GLOBAL_INDEX: OnceLock<IndexHandle> = OnceLock::new();

/// Installs `artifacts` as the process-wide index. The first call creates the
/// handle; later calls replace the bundle it serves.
pub fn install_global(artifacts: IndexArtifacts) -> &'static IndexHandle {
    let mut pending = Some(artifacts);
    let handle = GLOBAL_INDEX.get_or_init(|| {
        info!(event_name = "index.installed", "process-wide index initialized");
        IndexHandle::new(pending.take().unwrap_or_else(empty_bundle))
    });
    if let Some(artifacts) = pending {
        handle.replace(artifacts);
    }
    handle
}

/// The process-wide index, if `install_global` has been called.
pub fn global() -> Option<&'static IndexHandle> {
    GLOBAL_INDEX.get()
}

fn empty_bundle() -> IndexArtifacts {
    IndexArtifacts {
        products: Vec::new(),
        similarity: crate::similarity::similarity(&[]),
        names: super::NameIndex::default(),
        vocabulary_size: 0,
    }
}
