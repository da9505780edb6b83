use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::direction::Direction;
use crate::errors::ModelLoadError;
use crate::subword::SubwordModel;
use crate::translator::BatchTranslator;

/// Loaded models for one direction: the batch translator plus the source and
/// target subword models. Read-only after load and shared across translate
/// calls for the lifetime of the process.
pub struct ModelBundle {
    pub translator: Box<dyn BatchTranslator>,
    pub sp_source: Box<dyn SubwordModel>,
    pub sp_target: Box<dyn SubwordModel>,
}

/// Loads the models for one direction. Fails with `ModelLoadError` when
/// required files are missing or corrupt; loading is idempotent per direction.
pub trait BundleLoader: Send + Sync {
    fn load(&self, direction: Direction) -> Result<ModelBundle, ModelLoadError>;
}

/// Per-direction bundle cache with single-flight initialization: only one
/// load proceeds per direction key, concurrent first-use callers block on the
/// in-flight load and share its result. A failed load is not cached; the next
/// caller retries.
pub struct BundleCache {
    loader: Box<dyn BundleLoader>,
    slots: [OnceCell<Arc<ModelBundle>>; 2],
}

impl BundleCache {
    pub fn new(loader: Box<dyn BundleLoader>) -> Self {
        Self {
            loader,
            slots: [OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn get(&self, direction: Direction) -> Result<Arc<ModelBundle>, ModelLoadError> {
        self.slots[direction.index()]
            .get_or_try_init(|| self.loader.load(direction).map(Arc::new))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::subword::testing::WhitespaceModel;
    use crate::translator::testing::IdentityTranslator;

    fn stub_bundle() -> ModelBundle {
        ModelBundle {
            translator: Box::new(IdentityTranslator),
            sp_source: Box::new(WhitespaceModel),
            sp_target: Box::new(WhitespaceModel),
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl BundleLoader for CountingLoader {
        fn load(&self, _direction: Direction) -> Result<ModelBundle, ModelLoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(stub_bundle())
        }
    }

    struct FailingLoader;

    impl BundleLoader for FailingLoader {
        fn load(&self, direction: Direction) -> Result<ModelBundle, ModelLoadError> {
            Err(ModelLoadError::Engine(format!("no engine for {direction}")))
        }
    }

    #[test]
    fn repeated_gets_share_one_bundle() {
        let cache = BundleCache::new(Box::new(CountingLoader {
            loads: AtomicUsize::new(0),
        }));
        let a = cache.get(Direction::EnJa).unwrap();
        let b = cache.get(Direction::EnJa).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = cache.get(Direction::JaEn).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn counts_one_load_across_threads() {
        let loader = Box::leak(Box::new(CountingLoader {
            loads: AtomicUsize::new(0),
        }));
        let cache = BundleCache::new(Box::new(CountingLoaderRef(loader)));
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache.get(Direction::EnJa).unwrap();
                });
            }
        });
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    struct CountingLoaderRef(&'static CountingLoader);

    impl BundleLoader for CountingLoaderRef {
        fn load(&self, direction: Direction) -> Result<ModelBundle, ModelLoadError> {
            self.0.load(direction)
        }
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache = BundleCache::new(Box::new(FailingLoader));
        assert!(cache.get(Direction::EnJa).is_err());
        // Still errors (no poisoned slot), and a later success path would retry.
        assert!(cache.get(Direction::EnJa).is_err());
    }
}
