//! Cached read views and their invalidation
//!
//! Read paths that render whole screens (dashboard listing, task detail, user
//! list, user detail) cache their result under a [`ViewKey`]. Every successful
//! mutation invalidates the keys it affects; invalidation removes the entries and
//! broadcasts the keys so connected sessions can refetch.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::{Task, UserSummary};

/// Capacity of the invalidation broadcast channel, in batches
const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

/// Address of a cached view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// The full task listing
    Dashboard,

    /// A single task's detail view
    Task(Uuid),

    /// The user listing
    Users,

    /// A single user's detail view
    User(Uuid),
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKey::Dashboard => f.write_str("/dashboard"),
            ViewKey::Task(id) => write!(f, "/dashboard/tasks/{id}"),
            ViewKey::Users => f.write_str("/dashboard/users"),
            ViewKey::User(id) => write!(f, "/dashboard/users/{id}"),
        }
    }
}

/// Cached view payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedView {
    Tasks(Vec<Task>),
    Task(Task),
    Users(Vec<UserSummary>),
    User(UserSummary),
}

#[derive(Debug, Default)]
struct Entries {
    views: HashMap<ViewKey, CachedView>,
    generations: HashMap<ViewKey, u64>,
}

/// Keyed view cache with invalidation broadcast
///
/// Each key carries a generation that every invalidation bumps. A reader
/// takes the generation before going to the store and stores its result with
/// [`ViewCache::put_if_current`], so a snapshot read before a concurrent
/// write never replaces the invalidation that write made.
#[derive(Debug)]
pub struct ViewCache {
    entries: RwLock<Entries>,
    invalidations: broadcast::Sender<Vec<ViewKey>>,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(Entries::default()),
            invalidations,
        }
    }

    pub async fn get(&self, key: &ViewKey) -> Option<CachedView> {
        self.entries.read().await.views.get(key).cloned()
    }

    /// Current generation of `key`, taken before reading the store
    pub async fn generation(&self, key: &ViewKey) -> u64 {
        self.entries
            .read()
            .await
            .generations
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Caches `view` unless `key` was invalidated since `generation`
    ///
    /// Returns whether the view was stored.
    pub async fn put_if_current(&self, key: ViewKey, generation: u64, view: CachedView) -> bool {
        let mut entries = self.entries.write().await;
        let current = entries.generations.get(&key).copied().unwrap_or(0);
        if current != generation {
            tracing::debug!(view = %key, "Discarded view read before invalidation");
            return false;
        }
        entries.views.insert(key, view);
        true
    }

    pub async fn contains(&self, key: &ViewKey) -> bool {
        self.entries.read().await.views.contains_key(key)
    }

    /// Drops the cached view and notifies subscribers
    pub async fn invalidate(&self, key: ViewKey) {
        self.invalidate_all([key]).await;
    }

    /// Drops several views and notifies subscribers with one batch
    pub async fn invalidate_all(&self, keys: impl IntoIterator<Item = ViewKey>) {
        let keys: Vec<ViewKey> = keys.into_iter().collect();
        if keys.is_empty() {
            return;
        }

        {
            let mut entries = self.entries.write().await;
            for key in &keys {
                entries.views.remove(key);
                *entries.generations.entry(*key).or_insert(0) += 1;
            }
        }
        tracing::debug!(views = keys.len(), first = %keys[0], "Invalidated views");

        // no subscribers is fine
        let _ = self.invalidations.send(keys);
    }

    /// Receives every batch of keys invalidated after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<ViewKey>> {
        self.invalidations.subscribe()
    }
}
