//! swapquote configuration
//!
//! Settings, loading and startup utilities for the swap route aggregator.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	AdapterSettings, ConfigValidationError, EngineSettings, EnvironmentProfile,
	EnvironmentSettings, FeeOracleSettings, LogFormat, LoggingSettings, NetworkSettings,
	OracleSettings, PriceOracleSettings, ServerSettings, Settings,
};
pub use startup_logger::{
	log_engine_summary, log_service_info, log_service_shutdown, log_startup_complete,
};
