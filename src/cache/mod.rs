//! Cache manager for momentum results.
//!
//! Entries live in memory keyed by `(entity, window_days)` and are optionally
//! mirrored to disk. A stale or missing key is refreshed by exactly one
//! leader task; every concurrent caller for that key awaits the leader's
//! outcome through a watch channel. Bookkeeping is sharded per key, and no
//! lock is held while the pipeline runs.
//!
//! The leader runs in its own task, so a caller that gives up (timeout or
//! cancellation) never aborts a refresh other callers are waiting on.

mod file_store;

pub use file_store::{FileCacheStore, StoredEntry};

use crate::momentum::{
    rank_results, validate_window_days, MomentumError, MomentumPipeline, MomentumResult,
};
use crate::server::metrics;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_FALLBACK_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_MULTIPLIER: u32 = 4;

/// Identity of a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity: String,
    window_days: usize,
}

impl CacheKey {
    pub fn new(entity: &str, window_days: usize) -> Self {
        Self {
            entity: normalize_entity(entity),
            window_days,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn window_days(&self) -> usize {
        self.window_days
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'/{}d", self.entity, self.window_days)
    }
}

/// Artist names are matched case-insensitively, ignoring surrounding blanks.
pub fn normalize_entity(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A cached result. Entries are replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    payload: Arc<MomentumResult>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    pub fn payload(&self) -> &Arc<MomentumResult> {
        &self.payload
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Lifetime of a result computed from real catalog data.
    pub ttl: Duration,
    /// Lifetime of a synthetic fallback result, normally shorter than `ttl`.
    pub fallback_ttl: Duration,
    /// Entries older than `sweep_multiplier * ttl` are dropped by the sweep.
    /// 0 disables sweeping.
    pub sweep_multiplier: u32,
    /// How long a caller waits for a refresh before settling for an
    /// uncached synthetic result. `None` waits for the refresh to finish.
    pub wait_timeout: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            fallback_ttl: DEFAULT_FALLBACK_TTL,
            sweep_multiplier: DEFAULT_SWEEP_MULTIPLIER,
            wait_timeout: None,
        }
    }
}

type FlightOutcome = Option<Result<Arc<MomentumResult>, MomentumError>>;

struct Flight {
    id: u64,
    rx: watch::Receiver<FlightOutcome>,
}

enum Lookup {
    Hit(Arc<MomentumResult>),
    Wait(watch::Receiver<FlightOutcome>),
}

struct CacheInner {
    pipeline: MomentumPipeline,
    settings: CacheSettings,
    store: Option<FileCacheStore>,
    entries: DashMap<CacheKey, CacheEntry>,
    in_flight: DashMap<CacheKey, Flight>,
    /// Bumped by every invalidation of an entity. A leader only installs its
    /// result if the generation it started with is still current.
    generations: DashMap<String, u64>,
    next_flight_id: AtomicU64,
}

/// Removes the flight it was created for once the leader is done, even if
/// the leader panicked.
struct FlightGuard {
    inner: Arc<CacheInner>,
    key: CacheKey,
    id: u64,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.inner
            .in_flight
            .remove_if(&self.key, |_, flight| flight.id == id);
    }
}

#[derive(Clone)]
pub struct MomentumCache {
    inner: Arc<CacheInner>,
}

impl MomentumCache {
    pub fn new(pipeline: MomentumPipeline, settings: CacheSettings) -> Self {
        Self::build(pipeline, settings, None)
    }

    /// A cache that also persists entries through `store`, and reads them
    /// back when a key is missing from memory.
    pub fn with_store(
        pipeline: MomentumPipeline,
        settings: CacheSettings,
        store: FileCacheStore,
    ) -> Self {
        Self::build(pipeline, settings, Some(store))
    }

    fn build(
        pipeline: MomentumPipeline,
        settings: CacheSettings,
        store: Option<FileCacheStore>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                pipeline,
                settings,
                store,
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                generations: DashMap::new(),
                next_flight_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    /// Momentum of `artist` over `window_days`, from cache when fresh.
    ///
    /// Only `NotFound` and `InvalidInput` are returned as errors. An
    /// unreachable catalog yields a synthetic result instead.
    pub async fn get_momentum(
        &self,
        artist: &str,
        window_days: usize,
    ) -> Result<Arc<MomentumResult>, MomentumError> {
        if let Some(wait_timeout) = self.inner.settings.wait_timeout {
            return self
                .get_momentum_with_timeout(artist, window_days, wait_timeout)
                .await;
        }
        match self.lookup(artist, window_days)? {
            Lookup::Hit(payload) => Ok(payload),
            Lookup::Wait(rx) => self.inner.await_flight(rx, artist, window_days).await,
        }
    }

    /// Like [`get_momentum`](Self::get_momentum), but stops waiting for an
    /// in-flight refresh after `wait_timeout` and returns an uncached
    /// synthetic result. The refresh itself keeps running.
    pub async fn get_momentum_with_timeout(
        &self,
        artist: &str,
        window_days: usize,
        wait_timeout: Duration,
    ) -> Result<Arc<MomentumResult>, MomentumError> {
        let rx = match self.lookup(artist, window_days)? {
            Lookup::Hit(payload) => return Ok(payload),
            Lookup::Wait(rx) => rx,
        };
        match tokio::time::timeout(
            wait_timeout,
            self.inner.await_flight(rx, artist, window_days),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Gave up waiting {:?} for '{}', serving synthetic data",
                    wait_timeout,
                    artist.trim()
                );
                Ok(Arc::new(
                    self.inner.pipeline.synthetic(artist.trim(), window_days),
                ))
            }
        }
    }

    /// Drops every cached window of `artist`, in memory and on disk. A
    /// refresh already in flight still answers its waiters, but its result
    /// is not cached. Returns the number of in-memory entries removed.
    pub async fn invalidate(&self, artist: &str) -> usize {
        let entity = normalize_entity(artist);
        *self.inner.generations.entry(entity.clone()).or_insert(0) += 1;

        let mut removed = 0;
        self.inner.entries.retain(|key, _| {
            let keep = key.entity() != entity;
            if !keep {
                removed += 1;
            }
            keep
        });
        self.inner.in_flight.retain(|key, _| key.entity() != entity);
        metrics::set_cache_entries(self.inner.entries.len());

        if let Some(store) = &self.inner.store {
            match store.remove_entity(&entity).await {
                Ok(files) => debug!("Removed {} cache file(s) for '{}'", files, entity),
                Err(e) => warn!("Failed to remove cache files for '{}': {:#}", entity, e),
            }
        }

        info!("Invalidated {} cached result(s) for '{}'", removed, entity);
        removed
    }

    /// Resolves every artist through the cache and returns the top `limit`
    /// by momentum score. Artists the catalog doesn't know are skipped.
    pub async fn rank(
        &self,
        artists: &[String],
        window_days: usize,
        limit: usize,
    ) -> Result<Vec<Arc<MomentumResult>>, MomentumError> {
        validate_window_days(window_days)?;

        let outcomes = join_all(
            artists
                .iter()
                .map(|artist| self.get_momentum(artist, window_days)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (artist, outcome) in artists.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(MomentumError::NotFound(_)) => {
                    info!("Skipping '{}' in ranking: not in catalog", artist)
                }
                Err(e) => return Err(e),
            }
        }

        rank_results(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    /// Current entry for a key, fresh or not. Never triggers a refresh.
    pub fn peek(&self, artist: &str, window_days: usize) -> Option<CacheEntry> {
        self.inner
            .entries
            .get(&CacheKey::new(artist, window_days))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Number of keys with a refresh in progress.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Drops entries older than `sweep_multiplier * ttl`. Returns how many.
    pub fn sweep_now(&self) -> usize {
        let multiplier = self.inner.settings.sweep_multiplier;
        if multiplier == 0 {
            return 0;
        }
        let max_age = self.inner.settings.ttl.saturating_mul(multiplier);
        let now = Instant::now();

        let mut removed = 0;
        self.inner.entries.retain(|_, entry| {
            let keep = now.saturating_duration_since(entry.created_at) < max_age;
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!("Swept {} expired cache entries", removed);
            metrics::set_cache_entries(self.inner.entries.len());
        }
        removed
    }

    /// Runs [`sweep_now`](Self::sweep_now) once per TTL until the cache is
    /// dropped. Returns `None` when sweeping is disabled.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        let period = self.inner.settings.ttl;
        if self.inner.settings.sweep_multiplier == 0 || period.is_zero() {
            return None;
        }
        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                MomentumCache { inner }.sweep_now();
            }
        }))
    }

    fn lookup(&self, artist: &str, window_days: usize) -> Result<Lookup, MomentumError> {
        validate_window_days(window_days)?;
        let name = artist.trim();
        if name.is_empty() {
            return Err(MomentumError::InvalidInput(
                "Artist name must not be empty".to_string(),
            ));
        }

        let key = CacheKey::new(name, window_days);
        if let Some(payload) = self.inner.fresh_payload(&key) {
            metrics::record_cache_lookup("hit");
            debug!("Cache hit for {}", key);
            return Ok(Lookup::Hit(payload));
        }

        let rx = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(flight) => {
                metrics::record_cache_lookup("coalesced");
                debug!("Joining in-flight refresh of {}", key);
                flight.get().rx.clone()
            }
            Entry::Vacant(slot) => {
                // A leader may have finished between the first check and
                // taking the slot.
                if let Some(payload) = self.inner.fresh_payload(&key) {
                    metrics::record_cache_lookup("hit");
                    return Ok(Lookup::Hit(payload));
                }

                metrics::record_cache_lookup("miss");
                let id = self.inner.next_flight_id.fetch_add(1, Ordering::Relaxed);
                let generation = self.inner.generation(key.entity());
                let (tx, rx) = watch::channel(None);
                slot.insert(Flight { id, rx: rx.clone() });

                debug!("Refreshing {} (flight {})", key, id);
                let inner = Arc::clone(&self.inner);
                let name = name.to_string();
                tokio::spawn(async move {
                    inner.lead(key, name, id, generation, tx).await;
                });
                rx
            }
        };
        Ok(Lookup::Wait(rx))
    }
}

impl CacheInner {
    fn fresh_payload(&self, key: &CacheKey) -> Option<Arc<MomentumResult>> {
        let entry = self.entries.get(key)?;
        entry
            .is_fresh(Instant::now())
            .then(|| Arc::clone(&entry.payload))
    }

    fn generation(&self, entity: &str) -> u64 {
        self.generations.get(entity).map_or(0, |g| *g.value())
    }

    async fn await_flight(
        &self,
        mut rx: watch::Receiver<FlightOutcome>,
        artist: &str,
        window_days: usize,
    ) -> Result<Arc<MomentumResult>, MomentumError> {
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(result) => result,
            None => {
                warn!(
                    "Refresh of '{}' ended without a result, serving synthetic data",
                    artist.trim()
                );
                Ok(Arc::new(self.pipeline.synthetic(artist.trim(), window_days)))
            }
        }
    }

    async fn lead(
        self: Arc<Self>,
        key: CacheKey,
        name: String,
        flight_id: u64,
        generation: u64,
        tx: watch::Sender<FlightOutcome>,
    ) {
        let _guard = FlightGuard {
            inner: Arc::clone(&self),
            key: key.clone(),
            id: flight_id,
        };
        let outcome = self.resolve(&key, &name, generation).await;
        tx.send_replace(Some(outcome));
    }

    async fn resolve(
        &self,
        key: &CacheKey,
        name: &str,
        generation: u64,
    ) -> Result<Arc<MomentumResult>, MomentumError> {
        if let Some(payload) = self.load_stored(key, generation).await {
            return Ok(payload);
        }

        match self.pipeline.compute(name, key.window_days()).await {
            Ok(result) => {
                metrics::record_computation("real");
                let payload = Arc::new(result);
                self.install(key, Arc::clone(&payload), self.settings.ttl, generation)
                    .await;
                Ok(payload)
            }
            Err(MomentumError::UpstreamUnavailable(reason))
            | Err(MomentumError::CacheCorruption(reason)) => {
                warn!("Falling back to synthetic data for {}: {}", key, reason);
                metrics::record_computation("synthetic");
                let payload = Arc::new(self.pipeline.synthetic(name, key.window_days()));
                self.install(
                    key,
                    Arc::clone(&payload),
                    self.settings.fallback_ttl,
                    generation,
                )
                .await;
                Ok(payload)
            }
            Err(e) => {
                metrics::record_computation(e.kind());
                Err(e)
            }
        }
    }

    /// Serves a still-fresh entry persisted by an earlier run, if any.
    async fn load_stored(&self, key: &CacheKey, generation: u64) -> Option<Arc<MomentumResult>> {
        let store = self.store.as_ref()?;
        match store.load(key).await {
            Ok(Some(stored)) => {
                let remaining = stored.remaining(Utc::now())?;
                debug!("Loaded {} from disk, {:?} left", key, remaining);
                metrics::record_computation("stored");
                let payload = Arc::new(stored.payload);
                self.install_in_memory(key, Arc::clone(&payload), remaining, generation);
                Some(payload)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Treating cache file for {} as a miss: {}", key, e);
                if let Err(e) = store.remove(key).await {
                    warn!("Failed to remove corrupted cache file: {:#}", e);
                }
                None
            }
        }
    }

    async fn install(
        &self,
        key: &CacheKey,
        payload: Arc<MomentumResult>,
        ttl: Duration,
        generation: u64,
    ) {
        if !self.install_in_memory(key, Arc::clone(&payload), ttl, generation) {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(key, &payload, ttl).await {
            warn!("Failed to persist {}: {:#}", key, e);
        } else if self.generation(key.entity()) != generation {
            // Invalidated while the file was being written.
            if let Err(e) = store.remove(key).await {
                warn!("Failed to remove invalidated cache file: {:#}", e);
            }
        }
    }

    fn install_in_memory(
        &self,
        key: &CacheKey,
        payload: Arc<MomentumResult>,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        // Holding the generation entry keeps invalidate() from interleaving
        // between the check and the insert.
        let current = self.generations.get(key.entity());
        if current.as_ref().map_or(0, |g| *g.value()) != generation {
            debug!("Discarding refresh of {}: invalidated meanwhile", key);
            return false;
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                payload,
                created_at: Instant::now(),
                ttl,
            },
        );
        drop(current);
        metrics::set_cache_entries(self.entries.len());
        true
    }
}
