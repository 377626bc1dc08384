//! Background refresh of observed fingerprints
//!
//! Each observed fingerprint owns one entry: a generation number, an observer count, an
//! in-flight flag, a watch channel carrying its `RouteSnapshot`, and an interval task. At most
//! one cycle per entry is in flight; interval ticks and triggers that arrive during a cycle are
//! skipped. A cycle whose entry was replaced or removed while it ran is discarded on arrival.
//!
//! An entry lives while it has observers. It is also released once nobody holds a receiver
//! and nobody has read it for the idle timeout.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use swapquote_types::constants::limits::{DEFAULT_WATCH_IDLE_TIMEOUT_MS, MIN_REFRESH_INTERVAL_MS};
use swapquote_types::{CycleState, EngineError, RequestFingerprint, RouteSnapshot};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::pipeline::QuotePipeline;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

struct ObservedEntry {
	fingerprint: RequestFingerprint,
	key: String,
	generation: u64,
	observers: AtomicUsize,
	in_flight: AtomicBool,
	sender: watch::Sender<RouteSnapshot>,
	period_ms: AtomicU64,
	ticker: Mutex<Option<AbortHandle>>,
	created_at: Instant,
	/// Milliseconds after `created_at`
	last_access_ms: AtomicU64,
}

impl ObservedEntry {
	fn period(&self) -> Duration {
		Duration::from_millis(self.period_ms.load(Ordering::Acquire))
	}

	fn touch(&self) {
		let now = self.created_at.elapsed().as_millis() as u64;
		self.last_access_ms.fetch_max(now, Ordering::Relaxed);
	}

	fn idle_for(&self) -> Duration {
		let last = Duration::from_millis(self.last_access_ms.load(Ordering::Relaxed));
		self.created_at.elapsed().saturating_sub(last)
	}

	fn stop_ticker(&self) {
		let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(ticker) = ticker.take() {
			ticker.abort();
		}
	}
}

impl Drop for ObservedEntry {
	fn drop(&mut self) {
		let ticker = self.ticker.get_mut().unwrap_or_else(PoisonError::into_inner);
		if let Some(ticker) = ticker.take() {
			ticker.abort();
		}
	}
}

/// Clears the in-flight flag when a cycle ends, including when it is aborted
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

fn clamp_interval(requested: Duration) -> Duration {
	let minimum = Duration::from_millis(MIN_REFRESH_INTERVAL_MS);
	if requested < minimum {
		warn!(
			"Refresh interval {:?} below minimum, using {:?}",
			requested, minimum
		);
		return minimum;
	}
	requested
}

struct SchedulerInner {
	pipeline: Arc<QuotePipeline>,
	entries: DashMap<String, Arc<ObservedEntry>>,
	default_interval: Duration,
	max_observed: usize,
	idle_timeout: Duration,
}

impl SchedulerInner {
	fn is_current(&self, entry: &ObservedEntry) -> bool {
		self.entries
			.get(&entry.key)
			.map(|current| current.generation == entry.generation)
			.unwrap_or(false)
	}

	fn is_abandoned(&self, entry: &ObservedEntry) -> bool {
		entry.sender.receiver_count() == 0 && entry.idle_for() >= self.idle_timeout
	}

	/// Drop an abandoned entry unless it was already replaced
	fn release(&self, entry: &ObservedEntry) {
		let removed = self
			.entries
			.remove_if(&entry.key, |_, current| current.generation == entry.generation);
		if removed.is_some() {
			info!(
				"Released {}: no receivers and idle for {:?}",
				entry.key,
				entry.idle_for()
			);
		}
	}

	/// Claim the entry for one cycle; false if a cycle is already running
	fn try_claim(entry: &ObservedEntry) -> bool {
		entry
			.in_flight
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
	}

	/// Run one cycle for an entry already claimed with `try_claim`
	async fn run_claimed(&self, entry: &ObservedEntry) {
		let _guard = InFlightGuard(&entry.in_flight);
		let fingerprint = &entry.fingerprint;
		let pending = self.pipeline.fetcher().eligible_names(fingerprint);
		debug!(
			"Starting cycle for {} with {} adapters",
			entry.key,
			pending.len()
		);

		entry.sender.send_modify(|snapshot| {
			snapshot.state = CycleState::Fetching;
			snapshot.pending_adapters = pending;
		});

		let cycle = self.pipeline.cycle(fingerprint);
		let mut settled = cycle.settled();
		let outcome = cycle.outcome();
		tokio::pin!(outcome);

		let mut progress_open = true;
		let outcome = loop {
			{
				let names = settled.borrow_and_update();
				entry.sender.send_if_modified(|snapshot| {
					let before = snapshot.pending_adapters.len();
					snapshot.pending_adapters.retain(|p| !names.contains(p));
					snapshot.pending_adapters.len() != before
				});
			}
			tokio::select! {
				outcome = &mut outcome => break outcome,
				changed = settled.changed(), if progress_open => progress_open = changed.is_ok(),
			}
		};

		if !self.is_current(entry) {
			debug!(
				"Discarding cycle for {}: observation superseded (generation {})",
				entry.key, entry.generation
			);
			return;
		}

		entry.sender.send_modify(|snapshot| {
			snapshot.routes = outcome.routes.clone();
			snapshot.failures = outcome.failures.clone();
			snapshot.state = outcome.state;
			snapshot.is_loading = false;
			snapshot.pending_adapters.clear();
			snapshot.last_fetched_at = Some(Utc::now());
			snapshot.cycles_completed += 1;
		});
	}
}

/// Claimed cycles run on their own task and outlive a stopped ticker
fn spawn_cycle(inner: Arc<SchedulerInner>, entry: Arc<ObservedEntry>) {
	tokio::spawn(async move { inner.run_claimed(&entry).await });
}

async fn tick_loop(
	inner: Weak<SchedulerInner>,
	entry: Weak<ObservedEntry>,
	first_tick: Instant,
	period: Duration,
) {
	let mut ticker = tokio::time::interval_at(first_tick, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		ticker.tick().await;
		let (Some(inner), Some(entry)) = (inner.upgrade(), entry.upgrade()) else {
			break;
		};
		if !inner.is_current(&entry) {
			break;
		}
		if inner.is_abandoned(&entry) {
			inner.release(&entry);
			break;
		}
		if SchedulerInner::try_claim(&entry) {
			spawn_cycle(inner, entry);
		} else {
			debug!("Skipping refresh tick for {}: cycle in flight", entry.key);
		}
	}
}

/// Owns every observed fingerprint and its refresh cycle
#[derive(Clone)]
pub struct RefreshScheduler {
	inner: Arc<SchedulerInner>,
}

impl RefreshScheduler {
	pub fn new(pipeline: Arc<QuotePipeline>, default_interval: Duration, max_observed: usize) -> Self {
		Self::with_idle_timeout(
			pipeline,
			default_interval,
			max_observed,
			Duration::from_millis(DEFAULT_WATCH_IDLE_TIMEOUT_MS),
		)
	}

	/// `idle_timeout` bounds how long an entry without receivers survives unread
	pub fn with_idle_timeout(
		pipeline: Arc<QuotePipeline>,
		default_interval: Duration,
		max_observed: usize,
		idle_timeout: Duration,
	) -> Self {
		Self {
			inner: Arc::new(SchedulerInner {
				pipeline,
				entries: DashMap::new(),
				default_interval,
				max_observed,
				idle_timeout,
			}),
		}
	}

	pub fn pipeline(&self) -> &Arc<QuotePipeline> {
		&self.inner.pipeline
	}

	/// Start observing `fingerprint`, or join an existing observation
	///
	/// Every call counts as one observer and is released by one `stop_observing`. The first
	/// cycle starts immediately; later cycles follow the refresh interval. Joining with a
	/// shorter interval than the entry's current one shortens it for every observer.
	pub fn observe(
		&self,
		fingerprint: RequestFingerprint,
		interval: Option<Duration>,
	) -> Result<watch::Receiver<RouteSnapshot>, EngineError> {
		fingerprint.validate()?;
		let key = fingerprint.cache_key();

		if let Some(existing) = self.inner.entries.get(&key) {
			return Ok(self.join(existing.value(), interval));
		}
		if self.inner.entries.len() >= self.inner.max_observed {
			return Err(EngineError::CapacityExceeded {
				limit: self.inner.max_observed,
			});
		}

		let period = clamp_interval(interval.unwrap_or(self.inner.default_interval));
		let (sender, receiver) = watch::channel(RouteSnapshot::idle(fingerprint.clone()));
		let entry = Arc::new(ObservedEntry {
			fingerprint,
			key: key.clone(),
			generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
			observers: AtomicUsize::new(1),
			in_flight: AtomicBool::new(false),
			sender,
			period_ms: AtomicU64::new(period.as_millis() as u64),
			ticker: Mutex::new(None),
			created_at: Instant::now(),
			last_access_ms: AtomicU64::new(0),
		});

		match self.inner.entries.entry(key.clone()) {
			// Lost a race with a concurrent observe of the same fingerprint
			Entry::Occupied(existing) => return Ok(self.join(existing.get(), interval)),
			Entry::Vacant(slot) => {
				slot.insert(Arc::clone(&entry));
			},
		}

		self.schedule_ticks(&entry, period, Instant::now());
		info!(
			"Observing {} every {:?} (generation {})",
			key, period, entry.generation
		);
		Ok(receiver)
	}

	fn join(
		&self,
		entry: &Arc<ObservedEntry>,
		interval: Option<Duration>,
	) -> watch::Receiver<RouteSnapshot> {
		let observers = entry.observers.fetch_add(1, Ordering::AcqRel) + 1;
		entry.touch();
		debug!("Joined {} ({} observers)", entry.key, observers);

		if let Some(period) = interval.map(clamp_interval) {
			if self.schedule_ticks(entry, period, Instant::now() + period) {
				info!("Refresh interval for {} shortened to {:?}", entry.key, period);
			}
		}
		entry.sender.subscribe()
	}

	/// Start the entry's ticker, or restart it when `period` is shorter than the current one
	fn schedule_ticks(&self, entry: &Arc<ObservedEntry>, period: Duration, first_tick: Instant) -> bool {
		let mut ticker = entry.ticker.lock().unwrap_or_else(PoisonError::into_inner);
		if ticker.is_some() && period >= entry.period() {
			return false;
		}
		entry
			.period_ms
			.store(period.as_millis() as u64, Ordering::Release);
		if let Some(previous) = ticker.take() {
			previous.abort();
		}
		let handle = tokio::spawn(tick_loop(
			Arc::downgrade(&self.inner),
			Arc::downgrade(entry),
			first_tick,
			period,
		));
		*ticker = Some(handle.abort_handle());
		true
	}

	/// Subscribe to an already observed cache key without adding an observer
	pub fn subscribe_by_key(&self, key: &str) -> Result<watch::Receiver<RouteSnapshot>, EngineError> {
		self.inner
			.entries
			.get(key)
			.map(|entry| {
				entry.touch();
				entry.sender.subscribe()
			})
			.ok_or_else(|| EngineError::NotObserved {
				key: key.to_string(),
			})
	}

	pub fn snapshot(&self, fingerprint: &RequestFingerprint) -> Option<RouteSnapshot> {
		self.find_by_key(&fingerprint.cache_key())
	}

	pub fn find_by_key(&self, key: &str) -> Option<RouteSnapshot> {
		self.inner.entries.get(key).map(|entry| {
			entry.touch();
			entry.sender.borrow().clone()
		})
	}

	/// Effective refresh interval of an observed cache key
	pub fn refresh_interval_by_key(&self, key: &str) -> Option<Duration> {
		self.inner.entries.get(key).map(|entry| entry.period())
	}

	/// Number of outstanding observations of a cache key
	pub fn observers_by_key(&self, key: &str) -> usize {
		self.inner
			.entries
			.get(key)
			.map_or(0, |entry| entry.observers.load(Ordering::Acquire))
	}

	/// Release one observation of `fingerprint`
	///
	/// Refreshing stops when the last observer leaves. A cycle in flight at that point runs to
	/// completion on its own task and its result is discarded. False when the fingerprint was
	/// not observed.
	pub fn stop_observing(&self, fingerprint: &RequestFingerprint) -> bool {
		self.stop_by_key(&fingerprint.cache_key())
	}

	pub fn stop_by_key(&self, key: &str) -> bool {
		let mut remaining = None;
		let removed = self.inner.entries.remove_if(key, |_, entry| {
			let left = entry.observers.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
			remaining = Some(left);
			left == 0
		});

		match (removed, remaining) {
			(Some((_, entry)), _) => {
				entry.stop_ticker();
				info!("Stopped observing {}", key);
				true
			},
			(None, Some(left)) => {
				debug!("Released one observer of {} ({} remaining)", key, left);
				true
			},
			(None, None) => false,
		}
	}

	/// Start a cycle now; false when the fingerprint is not observed or a cycle is in flight
	pub fn trigger(&self, fingerprint: &RequestFingerprint) -> bool {
		let Some(entry) = self
			.inner
			.entries
			.get(&fingerprint.cache_key())
			.map(|e| Arc::clone(e.value()))
		else {
			return false;
		};
		entry.touch();

		if !SchedulerInner::try_claim(&entry) {
			debug!("Refresh for {} ignored: cycle in flight", entry.key);
			return false;
		}

		spawn_cycle(Arc::clone(&self.inner), entry);
		true
	}

	pub fn observed_count(&self) -> usize {
		self.inner.entries.len()
	}

	/// Stop every observation regardless of its observers
	pub fn shutdown(&self) {
		let keys: Vec<String> = self.inner.entries.iter().map(|e| e.key().clone()).collect();
		for key in keys {
			if let Some((_, entry)) = self.inner.entries.remove(&key) {
				entry.stop_ticker();
			}
		}
		info!("Scheduler shut down");
	}
}
