//! In-memory TTL cache with a cached logical clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};

/// Default refresh period of the logical clock.
pub const DEFAULT_CLOCK_TICK: Duration = Duration::from_secs(1);

/// Smallest period accepted for either background loop.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Cache entry with an absolute expiry on the logical clock.
struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

/// Everything guarded by the single lock: entries and the logical clock.
struct Store<V> {
    entries: HashMap<String, CacheEntry<V>>,
    now: u64,
}

/// State shared between the cache handle and its background loops.
struct Shared<V> {
    store: RwLock<Store<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> Shared<V> {
    fn refresh_clock(&self) {
        // read the time source before taking the lock
        let now = self.clock.now_nanos();
        self.store.write().now = now;
    }

    fn sweep(&self) -> usize {
        let mut store = self.store.write();
        let now = store.now;
        let before = store.entries.len();
        store.entries.retain(|_, entry| entry.expires_at > now);
        before - store.entries.len()
    }
}

/// Cache configuration.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How often expired entries are physically removed
    pub sweep_interval: Duration,
    /// How often the logical clock is refreshed
    pub clock_tick: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(2 * 24 * 60 * 60),
            clock_tick: DEFAULT_CLOCK_TICK,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given sweep interval.
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            sweep_interval,
            ..Default::default()
        }
    }

    /// Overrides the clock refresh period.
    pub fn with_clock_tick(mut self, clock_tick: Duration) -> Self {
        self.clock_tick = clock_tick;
        self
    }
}

/// Concurrent string-keyed cache with per-entry TTL.
///
/// # Expiry
///
/// Every entry carries `expires_at = now + ttl`, where `now` is a logical
/// clock refreshed every [`CacheConfig::clock_tick`] rather than read on
/// each call. An entry is returned by [`get`](Self::get) only while
/// `now <= expires_at`, so expiry decisions may lag real time by up to one
/// tick. Expired entries stay in memory until the sweeper, running every
/// [`CacheConfig::sweep_interval`], removes them.
///
/// # Locking
///
/// One reader/writer lock guards the map and the clock. `get` takes the
/// shared lock; `set`, the sweeper and the clock refresher take the
/// exclusive lock.
///
/// # Lifecycle
///
/// Construction spawns two tokio tasks and must happen inside a runtime.
/// They stop on [`shutdown`](Self::shutdown) or when the cache is dropped.
pub struct TtlCache<V> {
    shared: Arc<Shared<V>>,
    config: CacheConfig,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<V: Send + Sync + 'static> TtlCache<V> {
    /// Creates a cache sweeping every `sweep_interval`, using the wall clock.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(sweep_interval: Duration) -> Self {
        Self::with_config(CacheConfig::new(sweep_interval))
    }

    /// Creates a cache with custom configuration, using the wall clock.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache driven by the given time source.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared {
            store: RwLock::new(Store {
                entries: HashMap::new(),
                now: clock.now_nanos(),
            }),
            clock,
        });
        let cancel = CancellationToken::new();

        let clock_tick = clamp_period("clock_tick", config.clock_tick);
        let sweep_interval = clamp_period("sweep_interval", config.sweep_interval);

        let refresher = {
            let shared = shared.clone();
            tokio::spawn(run_every(clock_tick, cancel.clone(), move || {
                shared.refresh_clock();
            }))
        };

        let sweeper = {
            let shared = shared.clone();
            tokio::spawn(run_every(sweep_interval, cancel.clone(), move || {
                let removed = shared.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }))
        };

        Self {
            shared,
            config,
            cancel,
            tasks: Mutex::new(vec![refresher, sweeper]),
        }
    }
}

impl<V> TtlCache<V> {
    /// Gets a value by key.
    ///
    /// Returns `None` if the key was never set or its entry has expired.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let store = self.shared.store.read();
        store
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(store.now))
            .map(|entry| entry.value.clone())
    }

    /// Inserts or replaces the value for `key`, expiring after `ttl`.
    ///
    /// A later `set` on the same key replaces both value and expiry.
    /// A zero `ttl` is rejected and leaves the cache untouched.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Arc<V>>, ttl: Duration) {
        let key = key.into();
        if ttl.is_zero() {
            warn!(key = %key, "Ignoring cache set with zero TTL");
            return;
        }

        let ttl_nanos = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
        let mut store = self.shared.store.write();
        let expires_at = store.now.saturating_add(ttl_nanos);
        trace!(key = %key, expires_at, "Caching entry");
        store.entries.insert(
            key,
            CacheEntry {
                value: value.into(),
                expires_at,
            },
        );
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.store.read().entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.store.read().entries.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let store = self.shared.store.read();
        let expired = store
            .entries
            .values()
            .filter(|e| e.is_expired(store.now))
            .count();

        CacheStats {
            total_entries: store.entries.len(),
            expired_entries: expired,
            valid_entries: store.entries.len() - expired,
        }
    }

    /// Returns the configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stops both background loops and waits for them to finish.
    ///
    /// The cache stays usable afterwards, but its clock no longer advances
    /// and nothing is swept.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Cache background task ended abnormally");
            }
        }
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries awaiting the sweeper
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
}

fn clamp_period(name: &str, period: Duration) -> Duration {
    if period < MIN_PERIOD {
        warn!(setting = name, ?period, "Cache period too small, using {:?}", MIN_PERIOD);
        MIN_PERIOD
    } else {
        period
    }
}

/// Runs `f` every `period` until `cancel` fires. The first run is one
/// period after start.
async fn run_every<F>(period: Duration, cancel: CancellationToken, f: F)
where
    F: Fn() + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => f(),
        }
    }
}
