//! Bounded trace recorder
//!
//! Entries live in an arena keyed by [`EntryId`]. Ids are allocated from a
//! monotonic counter, so the first key of the arena is always the oldest
//! insertion and capacity eviction is a `pop_first`.
//!
//! # Thread Safety
//!
//! - The arena is guarded by a single `RwLock`. Inserts and removals take the
//!   write lock for one map operation. Ids are allocated under that lock, so
//!   key order is insertion order even with concurrent writers.
//! - Snapshots and sweeper scans take the read lock for one pass over the
//!   arena, cloning an `Arc` per entry. With capacity capped at 1000 this is
//!   a short copy, but it is a full pass: an insert waits for at most one
//!   scan of the live entries, not a single removal.
//! - Each entry sits behind its own `RwLock`, written by exactly one
//!   interceptor. Readers clone the entry under the read lock, so a snapshot
//!   never observes a half-written record.
//! - The size counter is only modified while the arena write lock is held,
//!   and only when the map actually gained or lost an element. Removing an
//!   id that is already gone is a no-op, so capacity and timeout eviction
//!   racing on the same entry cannot double-decrement.

use calltrace_core::time::now_millis;
use calltrace_core::{EntryId, TraceConfig, TraceEntry, TraceSettings};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

pub(crate) type EntryCell = Arc<RwLock<TraceEntry>>;

/// Handle to an entry owned by the recorder
///
/// The interceptor keeps the handle while the call runs and writes the
/// outcome through it. The recorder may evict the entry at any time; writes
/// through a handle to an evicted entry are harmless.
#[derive(Debug, Clone)]
pub struct EntryHandle {
    id: EntryId,
    pub(crate) cell: EntryCell,
}

impl EntryHandle {
    /// Recorder-assigned id
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Consistent copy of the entry
    pub fn entry(&self) -> TraceEntry {
        self.cell.read().clone()
    }
}

/// Bounded concurrent store of trace entries
pub struct TraceRecorder {
    /// Live entries, oldest first
    arena: RwLock<BTreeMap<EntryId, EntryCell>>,
    /// Mirror of `arena.len()`
    size: AtomicUsize,
    /// Last allocated id
    next_id: AtomicU64,
    /// Settings used until `init` runs
    defaults: TraceSettings,
    /// Settings fixed by the first `init`
    configured: OnceCell<TraceSettings>,
}

impl TraceRecorder {
    /// Create a recorder with default settings
    pub fn new() -> Self {
        Self::with_defaults(TraceSettings::default())
    }

    /// Create a recorder whose pre-`init` settings are `defaults`
    pub fn with_defaults(defaults: TraceSettings) -> Self {
        Self {
            arena: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
            next_id: AtomicU64::new(0),
            defaults,
            configured: OnceCell::new(),
        }
    }

    /// Apply `config` once
    ///
    /// Returns `true` if this call fixed the settings; every later call is a
    /// no-op and returns `false`.
    pub fn init(&self, config: TraceConfig) -> bool {
        let mut applied = false;
        self.configured.get_or_init(|| {
            applied = true;
            config.resolve(&self.defaults)
        });
        if applied {
            debug!(settings = ?self.settings(), "trace recorder initialized");
        } else {
            debug!("trace recorder already initialized, ignoring config");
        }
        applied
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.configured.get().is_some()
    }

    /// Current settings
    pub fn settings(&self) -> &TraceSettings {
        self.configured.get().unwrap_or(&self.defaults)
    }

    /// Maximum number of live entries
    pub fn capacity(&self) -> usize {
        self.settings().max_entries
    }

    /// Insert an entry stamped with the current time
    pub fn insert(&self, entry: TraceEntry) -> EntryHandle {
        self.insert_stamped(entry, now_millis).0
    }

    /// Insert an entry with `trace_start_time = now_ms`
    ///
    /// If the store then exceeds its capacity, the oldest entries are
    /// evicted until it fits. The entry just inserted is never the one
    /// evicted.
    pub fn insert_at(&self, entry: TraceEntry, now_ms: i64) -> EntryHandle {
        self.insert_stamped(entry, || now_ms).0
    }

    /// Insert under the arena write lock, returning the newest evicted id
    ///
    /// The id and start time are assigned while the lock is held, so the new
    /// entry always has the largest key and `pop_first` cannot reach it.
    fn insert_stamped(
        &self,
        mut entry: TraceEntry,
        clock: impl FnOnce() -> i64,
    ) -> (EntryHandle, Option<EntryId>) {
        let capacity = self.capacity();

        let mut arena = self.arena.write();
        let id = EntryId::new(self.next_id.fetch_add(1, Ordering::AcqRel) + 1);
        entry.id = id;
        entry.trace_start_time = clock();
        let cell = Arc::new(RwLock::new(entry));
        arena.insert(id, Arc::clone(&cell));
        let mut size = self.size.fetch_add(1, Ordering::AcqRel) + 1;
        let mut last_evicted = None;
        while size > capacity {
            match arena.pop_first() {
                Some((evicted, _)) => {
                    size = self.size.fetch_sub(1, Ordering::AcqRel) - 1;
                    last_evicted = Some(evicted);
                    debug!(id = %evicted, capacity, "capacity eviction");
                }
                None => break,
            }
        }
        drop(arena);

        (EntryHandle { id, cell }, last_evicted)
    }

    /// Remove an entry by id
    ///
    /// Returns `false` if the entry was already gone; the counter is only
    /// decremented when something was actually removed.
    pub fn remove(&self, id: EntryId) -> bool {
        let mut arena = self.arena.write();
        if arena.remove(&id).is_some() {
            self.size.fetch_sub(1, Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// Copy of a live entry
    pub fn get(&self, id: EntryId) -> Option<TraceEntry> {
        let cell = self.arena.read().get(&id).cloned()?;
        let entry = cell.read().clone();
        Some(entry)
    }

    /// Whether an entry is still live
    pub fn contains(&self, id: EntryId) -> bool {
        self.arena.read().contains_key(&id)
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Whether the recorder holds no entries
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// All live entries, ascending by `(trace_start_time, id)`
    ///
    /// Entries inserted after the arena lock is released are not included.
    pub fn snapshot(&self) -> Vec<TraceEntry> {
        let mut entries: Vec<TraceEntry> = self
            .scan()
            .into_iter()
            .map(|(_, cell)| cell.read().clone())
            .collect();
        entries.sort_by_key(TraceEntry::order_key);
        entries
    }

    /// Handles of all live entries, oldest insertion first
    pub(crate) fn scan(&self) -> Vec<(EntryId, EntryCell)> {
        self.arena
            .read()
            .iter()
            .map(|(id, cell)| (*id, Arc::clone(cell)))
            .collect()
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TraceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceRecorder")
            .field("size", &self.size())
            .field("settings", self.settings())
            .finish()
    }
}
