//! Service startup logging

use std::env;
use tracing::{info, warn};

use crate::Settings;

/// Logs service information at startup
pub fn log_service_info() {
	info!("=== swapquote route aggregator starting ===");
	info!("🚀 Service: swapquote v{}", env!("CARGO_PKG_VERSION"));
	info!("💻 Platform: {} / {}", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}
	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}
	if let Ok(config_path) = env::var("CONFIG_PATH") {
		info!("📋 Config Path: {}", config_path);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the effective engine configuration
pub fn log_engine_summary(settings: &Settings) {
	let adapters: Vec<&str> = settings
		.enabled_adapters()
		.map(|a| a.display_name())
		.collect();
	if adapters.is_empty() {
		warn!("⚠️ No adapters enabled; every cycle will report no available routes");
	} else {
		info!("🔌 Adapters (registration order): {}", adapters.join(", "));
	}

	let networks: Vec<String> = settings
		.network_catalog()
		.iter()
		.map(|n| n.id.to_string())
		.collect();
	info!("🌍 Networks: {}", networks.join(", "));
	info!(
		"⏱️ Refresh every {}ms, debounce {}ms, adapter timeout {}ms",
		settings.engine.refresh_interval_ms,
		settings.engine.debounce_ms,
		settings.engine.adapter_timeout_ms
	);
}

pub fn log_service_shutdown() {
	info!("🛑 swapquote shutting down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

pub fn log_startup_complete(bind_address: &str) {
	info!("✅ swapquote started");
	info!("🌐 Server listening on: {}", bind_address);
}
