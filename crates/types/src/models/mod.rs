//! Shared domain models

pub mod asset;
pub mod network;
pub mod secret_string;
pub mod u256;

pub use asset::{Asset, NATIVE_PLACEHOLDER_ADDRESS, ZERO_ADDRESS};
pub use network::{NetworkId, NetworkProfile};
pub use secret_string::SecretString;
pub use u256::U256;
