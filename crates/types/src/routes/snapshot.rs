//! Live view of one observed fingerprint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RankedRoute, RouteFailure};
use crate::requests::RequestFingerprint;

/// Lifecycle of an observed fingerprint
///
/// `Idle → Fetching → {Settled, PartiallyFailed} → Fetching → ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
	Idle,
	Fetching,
	/// Every eligible adapter produced an available route
	Settled,
	/// At least one adapter was unavailable (possibly all of them)
	PartiallyFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterFailure {
	pub adapter: String,
	pub failure: RouteFailure,
}

/// What a caller sees when observing a fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot {
	pub fingerprint: RequestFingerprint,
	/// Ranked routes from the most recent completed cycle
	pub routes: Vec<RankedRoute>,
	pub state: CycleState,
	/// No cycle has completed yet
	pub is_loading: bool,
	/// Adapters still in flight in the current cycle
	pub pending_adapters: Vec<String>,
	pub last_fetched_at: Option<DateTime<Utc>>,
	pub failures: Vec<AdapterFailure>,
	pub cycles_completed: u64,
}

impl RouteSnapshot {
	pub fn idle(fingerprint: RequestFingerprint) -> Self {
		Self {
			fingerprint,
			routes: Vec::new(),
			state: CycleState::Idle,
			is_loading: true,
			pending_adapters: Vec::new(),
			last_fetched_at: None,
			failures: Vec::new(),
			cycles_completed: 0,
		}
	}

	/// A cycle completed and produced no ranked routes
	pub fn has_no_available_routes(&self) -> bool {
		self.cycles_completed > 0 && self.routes.is_empty()
	}

	pub fn best(&self) -> Option<&RankedRoute> {
		self.routes.first()
	}

	pub fn route_for(&self, adapter_name: &str) -> Option<&RankedRoute> {
		self.routes.iter().find(|r| r.adapter_name() == adapter_name)
	}
}
