//! Bounded, time-expiring cache of ranked results.
//!
//! Caches the final ranked result list keyed by the normalised query. Entries
//! expire a fixed time after they are stored; when the cache grows past its
//! capacity the oldest entries (by creation time, not by access) are evicted.
//! A periodic sweeper removes expired entries in the background.
//!
//! The cache can persist a snapshot into a caller-supplied
//! [`KeyValueStore`]. Persistence is best-effort: a corrupt snapshot starts
//! the cache empty, and a failing store switches the cache to memory-only
//! operation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::CacheConfig;
use crate::error::{RankError, Result};
use crate::store::KeyValueStore;
use crate::types::{CacheStats, SearchResult};

/// Normalised cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a deterministic cache key from a query.
    ///
    /// The query is lowercased and trimmed, internal whitespace runs become a
    /// single `_`, and anything other than letters, digits, `_` and `-` is
    /// dropped. `"  The Matrix: Reloaded "` becomes `"the_matrix_reloaded"`.
    pub fn new(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let joined = lowered.split_whitespace().collect::<Vec<_>>().join("_");
        Self(
            joined
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cached result list.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Ranked results as they were stored.
    pub results: Vec<SearchResult>,
    /// Length of the JSON encoding of `results`.
    pub size_bytes: usize,
    /// Monotonic creation time, used for expiry and eviction.
    created_at: Instant,
    /// Wall-clock creation time in Unix milliseconds, used for persistence.
    created_at_ms: i64,
    /// Insertion sequence; breaks ties between equal creation times.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }

    fn age_rank(&self) -> (Instant, u64) {
        (self.created_at, self.seq)
    }
}

/// Persisted form of one entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntry {
    results: Vec<SearchResult>,
    created_at: i64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
    /// Set once the backing store has failed; no further writes are tried.
    memory_only: bool,
}

/// Bounded TTL cache mapping normalised queries to ranked results.
///
/// All operations take one internal mutex, so the cache can be shared across
/// threads behind an [`Arc`]. Lookups never fail. With a backing store,
/// mutations write the snapshot while holding that mutex, so a slow store
/// also delays concurrent `get` calls.
pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ResultCache {
    /// Create an in-memory cache.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] if `config` is invalid.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(CacheState::default()),
            store: None,
        })
    }

    /// Create a cache that persists into `store`, restoring any snapshot
    /// already saved there.
    ///
    /// A snapshot that cannot be decoded is discarded and the cache starts
    /// empty. If the store cannot be read at all the cache runs memory-only.
    /// A snapshot holding more live entries than `max_entries` keeps only the
    /// newest ones.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] if `config` is invalid. Storage and
    /// snapshot problems never fail construction.
    pub fn with_store(config: CacheConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;
        let mut state = CacheState::default();

        match store.read(&config.storage_key) {
            Ok(Some(payload)) => match decode_snapshot(&payload) {
                Ok(persisted) => {
                    restore(&mut state, persisted, config.ttl());
                    evict_over_capacity(&mut state, config.max_entries);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable cache snapshot");
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "cache store unavailable; running memory-only");
                state.memory_only = true;
            }
        }

        tracing::debug!(restored = state.entries.len(), "result cache initialised");
        Ok(Self {
            config,
            state: Mutex::new(state),
            store: Some(store),
        })
    }

    /// Look up cached results for `query`.
    ///
    /// Returns `None` on a miss, for an expired entry, or for a query that
    /// normalises to nothing. Expired entries stay in place until the next
    /// sweep.
    pub fn get(&self, query: &str) -> Option<Vec<SearchResult>> {
        let key = CacheKey::new(query);
        if key.is_empty() {
            return None;
        }

        let state = self.lock();
        let entry = state.entries.get(&key)?;
        if entry.is_expired(self.config.ttl(), Instant::now()) {
            tracing::trace!(%key, "cache entry expired");
            return None;
        }
        tracing::trace!(%key, "cache hit");
        Some(entry.results.clone())
    }

    /// Store `results` for `query`, replacing any previous entry.
    ///
    /// Evicts the oldest entries if the cache is over capacity afterwards.
    /// Queries that normalise to nothing are not cached.
    pub fn set(&self, query: &str, results: Vec<SearchResult>) {
        let key = CacheKey::new(query);
        if key.is_empty() {
            tracing::trace!("not caching query with empty key");
            return;
        }

        let size_bytes = serde_json::to_vec(&results).map_or(0, |bytes| bytes.len());
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                results,
                size_bytes,
                created_at: Instant::now(),
                created_at_ms: chrono::Utc::now().timestamp_millis(),
                seq,
            },
        );
        evict_over_capacity(&mut state, self.config.max_entries);
        self.persist(&mut state);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        self.persist(&mut state);
    }

    /// Remove expired entries and enforce capacity.
    ///
    /// Returns how many entries were removed. Safe to call at any time and
    /// from any thread; a second call with nothing to do removes nothing.
    pub fn sweep(&self) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        let ttl = self.config.ttl();
        let now = Instant::now();
        state.entries.retain(|_, entry| !entry.is_expired(ttl, now));
        evict_over_capacity(&mut state, self.config.max_entries);

        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = state.entries.len(), "cache sweep");
            self.persist(&mut state);
        }
        removed
    }

    /// Entry count, total size, and keys (oldest first).
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut ordered: Vec<(&CacheKey, &CacheEntry)> = state.entries.iter().collect();
        ordered.sort_by_key(|(_, entry)| entry.age_rank());

        CacheStats {
            count: ordered.len(),
            total_size_bytes: ordered.iter().map(|(_, entry)| entry.size_bytes).sum(),
            keys: ordered.iter().map(|(key, _)| key.to_string()).collect(),
        }
    }

    /// Whether mutations are still being written to a backing store.
    pub fn is_persistent(&self) -> bool {
        self.store.is_some() && !self.lock().memory_only
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Start the background sweeper on the current tokio runtime.
    ///
    /// The task runs [`ResultCache::sweep`] every `sweep_interval_seconds`
    /// and stops on its own once the last strong reference to the cache is
    /// dropped. Abort the returned handle to stop it earlier.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::trace!("result cache dropped; sweeper exiting");
                    break;
                };
                cache.sweep();
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write the current contents to the backing store, if any.
    ///
    /// Called with the state lock held so snapshots land in mutation order.
    /// Every other cache operation, `get` included, waits for the write.
    fn persist(&self, state: &mut CacheState) {
        let Some(store) = &self.store else {
            return;
        };
        if state.memory_only {
            return;
        }

        let write = encode_snapshot(&state.entries)
            .and_then(|payload| store.write(&self.config.storage_key, &payload));
        if let Err(err) = write {
            tracing::warn!(error = %err, "cache persistence failed; continuing memory-only");
            state.memory_only = true;
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            state: Mutex::new(CacheState::default()),
            store: None,
        }
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("config", &self.config)
            .field("entries", &self.lock().entries.len())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl CacheConfig {
    fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

/// Evict oldest-created entries until at most `max_entries` remain.
fn evict_over_capacity(state: &mut CacheState, max_entries: usize) {
    while state.entries.len() > max_entries {
        let Some(oldest) = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.age_rank())
            .map(|(key, _)| key.clone())
        else {
            break;
        };
        tracing::trace!(key = %oldest, "evicting oldest cache entry");
        state.entries.remove(&oldest);
    }
}

fn encode_snapshot(entries: &HashMap<CacheKey, CacheEntry>) -> Result<String> {
    let persisted: HashMap<&CacheKey, PersistedEntry> = entries
        .iter()
        .map(|(key, entry)| {
            (
                key,
                PersistedEntry {
                    results: entry.results.clone(),
                    created_at: entry.created_at_ms,
                },
            )
        })
        .collect();
    serde_json::to_string(&persisted).map_err(|e| RankError::Storage(e.to_string()))
}

fn decode_snapshot(payload: &str) -> Result<HashMap<CacheKey, PersistedEntry>> {
    serde_json::from_str(payload).map_err(|e| RankError::CacheCorrupted(e.to_string()))
}

/// Load persisted entries into `state`, skipping those already expired.
///
/// Wall-clock age is carried over onto the monotonic clock so that expiry
/// and eviction order survive a restart.
fn restore(state: &mut CacheState, persisted: HashMap<CacheKey, PersistedEntry>, ttl: Duration) {
    let now = Instant::now();
    let now_ms = chrono::Utc::now().timestamp_millis();

    let mut live: Vec<(CacheKey, PersistedEntry, Duration)> = persisted
        .into_iter()
        .filter(|(key, _)| !key.is_empty())
        .filter_map(|(key, entry)| {
            let age_ms = u64::try_from(now_ms.saturating_sub(entry.created_at)).unwrap_or(0);
            let age = Duration::from_millis(age_ms);
            (age <= ttl).then_some((key, entry, age))
        })
        .collect();
    // Oldest first, so insertion sequence matches creation order.
    live.sort_by(|a, b| b.2.cmp(&a.2));

    for (key, entry, age) in live {
        let size_bytes = serde_json::to_vec(&entry.results).map_or(0, |bytes| bytes.len());
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                results: entry.results,
                size_bytes,
                created_at: now.checked_sub(age).unwrap_or(now),
                created_at_ms: entry.created_at,
                seq,
            },
        );
    }
}
