//! Provider API keys and keyed RPC URLs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "[REDACTED]";

/// Credential that never appears in logs or serialized output; zeroized on drop
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(secret: impl Into<String>) -> Self {
		Self(Zeroizing::new(secret.into()))
	}

	/// The raw value, for an outgoing request header or URL only
	pub fn expose_secret(&self) -> &str {
		self.0.as_str()
	}

	/// Blank keys count as missing
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Length and last two characters, enough to tell keys apart in logs
	pub fn hint(&self) -> String {
		let chars: Vec<char> = self.0.trim().chars().collect();
		if chars.len() < 8 {
			return format!("<{} chars>", chars.len());
		}
		let tail: String = chars[chars.len() - 2..].iter().collect();
		format!("<{} chars, ..{}>", chars.len(), tail)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(secret: String) -> Self {
		Self::new(secret)
	}
}

impl From<&str> for SecretString {
	fn from(secret: &str) -> Self {
		Self::new(secret)
	}
}

impl Serialize for SecretString {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(Self::new)
	}
}
