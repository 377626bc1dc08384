use swapquote_service::QuoteEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
	pub engine: QuoteEngine,
}

impl AppState {
	pub fn new(engine: QuoteEngine) -> Self {
		Self { engine }
	}
}
