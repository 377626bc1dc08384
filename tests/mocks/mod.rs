//! Shared mocks and fixtures for the integration suites

pub mod adapters;
pub mod fixtures;

#[allow(unused_imports)]
pub use adapters::{Behavior, MockAdapter};
#[allow(unused_imports)]
pub use fixtures::{engine_with, fingerprint, settings, TOKEN_X, TOKEN_Y};
