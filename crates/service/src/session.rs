//! Debounced, single-request view over the scheduler
//!
//! A session follows one request at a time. Request changes arriving within the debounce
//! window coalesce into the last one. Every change bumps an epoch; work started under an older
//! epoch never reaches the session's output. A session holds one scheduler observation at a
//! time and gives it back when cleared or dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use swapquote_types::{EngineError, RequestFingerprint, RouteSnapshot};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::scheduler::RefreshScheduler;

#[derive(Default)]
struct SessionState {
	current: Option<RequestFingerprint>,
	worker: Option<JoinHandle<()>>,
}

struct SessionInner {
	scheduler: RefreshScheduler,
	debounce: Duration,
	epoch: AtomicU64,
	state: Mutex<SessionState>,
	output: watch::Sender<Option<RouteSnapshot>>,
}

impl SessionInner {
	fn is_current(&self, epoch: u64) -> bool {
		self.epoch.load(Ordering::Acquire) == epoch
	}

	/// Swap the observed fingerprint, keeping one observation per session
	fn switch_to(
		&self,
		state: &mut SessionState,
		fingerprint: &RequestFingerprint,
	) -> Result<watch::Receiver<RouteSnapshot>, EngineError> {
		match state.current.take() {
			Some(previous) if &previous == fingerprint => {
				if let Ok(receiver) = self.scheduler.subscribe_by_key(&previous.cache_key()) {
					state.current = Some(previous);
					return Ok(receiver);
				}
			},
			Some(previous) => {
				self.scheduler.stop_observing(&previous);
			},
			None => {},
		}
		let receiver = self.scheduler.observe(fingerprint.clone(), None)?;
		state.current = Some(fingerprint.clone());
		Ok(receiver)
	}

	/// Worker body; holds the session only weakly so dropping every handle ends it
	async fn activate(inner: Weak<Self>, fingerprint: RequestFingerprint, epoch: u64) {
		let Some(debounce) = inner.upgrade().map(|inner| inner.debounce) else {
			return;
		};
		tokio::time::sleep(debounce).await;

		let mut receiver = {
			let Some(session) = inner.upgrade() else {
				return;
			};
			if !session.is_current(epoch) {
				return;
			}
			let mut state = session.state.lock().await;
			if !session.is_current(epoch) {
				return;
			}
			match session.switch_to(&mut state, &fingerprint) {
				Ok(receiver) => receiver,
				Err(e) => {
					warn!("Session could not observe request: {}", e);
					return;
				},
			}
		};

		loop {
			let Some(session) = inner.upgrade() else {
				break;
			};
			if !session.is_current(epoch) {
				break;
			}
			let snapshot = receiver.borrow_and_update().clone();
			// Epoch is checked under the channel lock
			session.output.send_if_modified(|output| {
				if session.is_current(epoch) {
					*output = Some(snapshot);
					true
				} else {
					false
				}
			});
			drop(session);
			if receiver.changed().await.is_err() {
				break;
			}
		}
	}
}

impl Drop for SessionInner {
	fn drop(&mut self) {
		let state = self.state.get_mut();
		if let Some(worker) = state.worker.take() {
			worker.abort();
		}
		if let Some(current) = state.current.take() {
			self.scheduler.stop_observing(&current);
		}
	}
}

/// Follows the latest request and publishes its snapshots
#[derive(Clone)]
pub struct QuoteSession {
	inner: Arc<SessionInner>,
}

impl QuoteSession {
	pub fn new(scheduler: RefreshScheduler, debounce: Duration) -> Self {
		let (output, _) = watch::channel(None);
		Self {
			inner: Arc::new(SessionInner {
				scheduler,
				debounce,
				epoch: AtomicU64::new(0),
				state: Mutex::new(SessionState::default()),
				output,
			}),
		}
	}

	/// Replace the followed request
	///
	/// The output switches to an idle snapshot of the new request right away, so routes of the
	/// previous request are never shown for the new one.
	pub async fn set_request(&self, fingerprint: RequestFingerprint) -> Result<(), EngineError> {
		fingerprint.validate()?;
		let epoch = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
		debug!("Session request changed (epoch {})", epoch);

		let mut state = self.inner.state.lock().await;
		if let Some(worker) = state.worker.take() {
			worker.abort();
		}
		self.inner
			.output
			.send_replace(Some(RouteSnapshot::idle(fingerprint.clone())));
		state.worker = Some(tokio::spawn(SessionInner::activate(
			Arc::downgrade(&self.inner),
			fingerprint,
			epoch,
		)));
		Ok(())
	}

	pub fn subscribe(&self) -> watch::Receiver<Option<RouteSnapshot>> {
		self.inner.output.subscribe()
	}

	pub fn current(&self) -> Option<RouteSnapshot> {
		self.inner.output.borrow().clone()
	}

	/// Refresh the followed request now; false when nothing is followed or a cycle is running
	pub async fn refresh(&self) -> bool {
		let state = self.inner.state.lock().await;
		match &state.current {
			Some(fingerprint) => self.inner.scheduler.trigger(fingerprint),
			None => false,
		}
	}

	/// Stop following any request
	pub async fn clear(&self) {
		self.inner.epoch.fetch_add(1, Ordering::AcqRel);
		let mut state = self.inner.state.lock().await;
		if let Some(worker) = state.worker.take() {
			worker.abort();
		}
		if let Some(previous) = state.current.take() {
			self.inner.scheduler.stop_observing(&previous);
		}
		self.inner.output.send_replace(None);
	}
}
