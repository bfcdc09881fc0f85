//! Process-wide reuse of transform setups.
//!
//! Planning is the expensive step of a transform, so setups are cached by
//! `(element type, size)` and shared. The cache stores its entries type
//! erased; the element type is part of the key, which makes the downcast on
//! the way out infallible.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::kernel::{FftElement, FftError};
use crate::setup::Setup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    n: usize,
    element: TypeId,
}

/// `None` records a rejected size, so repeated requests for it fail without
/// hitting the planner again.
type CacheEntry = Option<Arc<dyn Any + Send + Sync>>;

/// Concurrent cache of [`Setup`]s keyed by element type and size.
///
/// Engines built through [`crate::Fft::new`] share one process-wide cache;
/// independent caches can be created for tests or for bounded lifetimes.
#[derive(Default)]
pub struct SetupCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

static SHARED: OnceLock<SetupCache> = OnceLock::new();

impl SetupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance used by [`crate::Fft::new`].
    pub fn shared() -> &'static SetupCache {
        SHARED.get_or_init(SetupCache::new)
    }

    /// Returns the setup for `(E, n)`, planning it on first request.
    ///
    /// Concurrent first requests for one key plan exactly once; the requests
    /// that lose the race block until the winner has stored the result and
    /// then share it. Rejected sizes are remembered as well.
    pub fn get<E: FftElement>(&self, n: usize) -> Result<Arc<Setup<E>>, FftError> {
        let key = CacheKey {
            n,
            element: TypeId::of::<E>(),
        };

        if let Some(entry) = self.read_lock().get(&key) {
            return resolve::<E>(n, entry);
        }

        let mut entries = self.write_lock();
        // double check: another thread may have filled the slot while we
        // waited for the write lock
        if let Some(entry) = entries.get(&key) {
            return resolve::<E>(n, entry);
        }
        let entry: CacheEntry = match Setup::<E>::new(n) {
            Ok(setup) => Some(Arc::new(setup)),
            Err(_) => None,
        };
        entries.insert(key, entry.clone());
        resolve::<E>(n, &entry)
    }

    /// Drops every cached setup. Setups still referenced by engines stay
    /// alive; later requests plan afresh.
    pub fn clear(&self) {
        self.write_lock().clear();
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve<E: FftElement>(n: usize, entry: &CacheEntry) -> Result<Arc<Setup<E>>, FftError> {
    match entry {
        Some(setup) => Ok(Arc::clone(setup)
            .downcast::<Setup<E>>()
            .unwrap_or_else(|_| unreachable!("cache key and entry type always agree"))),
        None => Err(FftError::InvalidSize(n)),
    }
}
