//! Global limits and defaults for configuration and runtime

/// Minimum allowed timeout for a single adapter quote call in milliseconds
pub const MIN_ADAPTER_TIMEOUT_MS: u64 = 100; // 100ms

/// Maximum allowed timeout for a single adapter quote call in milliseconds
pub const MAX_ADAPTER_TIMEOUT_MS: u64 = 30_000; // 30s

/// Default timeout for a single adapter quote call in milliseconds
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 8_000; // 8s

/// Default timeout for a single fee/price oracle lookup in milliseconds
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 3_000; // 3s

/// Default refresh interval for an observed fingerprint in milliseconds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 25_000; // 25s

/// Smallest accepted refresh interval in milliseconds
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000; // 1s

/// How long an observation with no live receivers survives without being read
pub const DEFAULT_WATCH_IDLE_TIMEOUT_MS: u64 = 300_000; // 5min

/// Default debounce window for fingerprint changes in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Maximum number of fingerprints observed at once
pub const DEFAULT_MAX_OBSERVED_FINGERPRINTS: usize = 1_024;

/// Maximum slippage accepted in a request, in basis points (50%)
pub const MAX_SLIPPAGE_BPS: u32 = 5_000;

/// Default slippage in basis points (0.5%)
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Price impact above which the selected route is flagged (percent)
pub const PRICE_IMPACT_WARNING_THRESHOLD: f64 = 5.0;

/// Price impact above which the selected route is flagged as high impact (percent)
pub const HIGH_PRICE_IMPACT_THRESHOLD: f64 = 10.0;
