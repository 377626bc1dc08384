//! swapquote service
//!
//! Fetch, normalize, rank and refresh pipeline over the registered adapters.

pub mod engine;
pub mod fees;
pub mod fetcher;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod ranker;
pub mod scheduler;
pub mod session;
pub mod static_oracle;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{EngineConfig, QuoteEngine};
pub use fees::{compute_gas_cost, CostInputs, FeeNormalizer, NetworkReadings};
pub use fetcher::{Fetcher, FetcherConfig};
pub use filter::{eligibility, eligible_adapters, Eligibility};
pub use normalizer::{build_route, check_quote, CheckedQuote};
pub use pipeline::{CycleOutcome, QuotePipeline};
pub use ranker::{rank, select, AssetPrices, Ranking};
pub use scheduler::RefreshScheduler;
pub use session::QuoteSession;
pub use static_oracle::{StaticFeeOracle, StaticPriceOracle};
