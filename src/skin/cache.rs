use super::fetch::{FetchCoordinator, RetryPolicy};
use super::notify::{NotificationHub, Notifier};
use super::store::AssetStore;
use crate::assets::{TextureHandle, TextureRegistry};
use crate::core::network::SkinFetcher;
use log::{info, trace};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    InFlight,
    Resolved(TextureHandle),
    Failed,
}

impl EntryState {
    #[inline(always)]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Failed)
    }
}

enum Poll {
    Hit(TextureHandle),
    Pending,
    Failed,
    Miss,
}

/// Key -> state map shared by the lookup path and fetch workers.
///
/// A missing key is `Absent`. Every transition happens under the one lock,
/// so `claim` is the single gate that admits a fetch. The resolution notice
/// is queued inside `resolve` before the lock is released, which makes it
/// exactly one per resolution no matter how often the key is polled.
pub(crate) struct EntryTable {
    entries: Mutex<FxHashMap<String, EntryState>>,
    notifier: Notifier,
}

impl EntryTable {
    pub(crate) fn new(notifier: Notifier) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, EntryState>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self, key: &str) -> EntryState {
        self.lock().get(key).cloned().unwrap_or(EntryState::Absent)
    }

    /// Absent -> InFlight. Any other state refuses the claim.
    pub(crate) fn claim(&self, key: &str) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), EntryState::InFlight);
        true
    }

    /// InFlight -> Resolved, queuing the key's notice under the lock.
    pub(crate) fn resolve(&self, key: &str, handle: TextureHandle) {
        let mut entries = self.lock();
        entries.insert(key.to_string(), EntryState::Resolved(handle));
        self.notifier.notify(key);
    }

    pub(crate) fn fail(&self, key: &str) {
        self.lock().insert(key.to_string(), EntryState::Failed);
    }

    fn poll(&self, key: &str) -> Poll {
        match self.lock().get(key) {
            Some(EntryState::Resolved(handle)) => Poll::Hit(handle.clone()),
            Some(EntryState::InFlight) => Poll::Pending,
            Some(EntryState::Failed) => Poll::Failed,
            Some(EntryState::Absent) | None => Poll::Miss,
        }
    }
}

/// Skin texture cache polled by the renderer every frame.
pub struct ResourceCache {
    entries: Arc<EntryTable>,
    coordinator: FetchCoordinator,
}

impl ResourceCache {
    pub fn new(
        store: AssetStore,
        fetcher: Arc<dyn SkinFetcher>,
        textures: Arc<dyn TextureRegistry>,
        policy: RetryPolicy,
    ) -> (Self, NotificationHub) {
        let (notifier, hub) = NotificationHub::channel();
        let entries = Arc::new(EntryTable::new(notifier));
        let coordinator =
            FetchCoordinator::new(Arc::clone(&entries), store, fetcher, textures, policy);
        (
            Self {
                entries,
                coordinator,
            },
            hub,
        )
    }

    /// Returns the texture for `key` if it is ready. Never blocks on I/O; a
    /// first miss starts a background fetch.
    pub fn lookup(&self, key: &str) -> Option<TextureHandle> {
        match self.entries.poll(key) {
            Poll::Hit(handle) => {
                trace!("Cache hit: {key} -> {}", handle.name());
                Some(handle)
            }
            Poll::Pending => None,
            Poll::Failed => {
                trace!("Previous skin download failed, skip retry: {key}");
                None
            }
            Poll::Miss => {
                info!("Cache miss, preparing to fetch skin: {key}");
                self.coordinator.begin(key);
                None
            }
        }
    }

    pub fn state(&self, key: &str) -> EntryState {
        self.entries.state(key)
    }

    pub const fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }
}
