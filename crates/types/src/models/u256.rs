//! U256 model for token amounts in smallest integer units

use serde;
use std::cmp::Ordering;

/// Unsigned integer amount represented as a decimal string to preserve precision
///
/// Amounts are always expressed in the smallest unit of their asset (wei, satoshi, ...).
/// The value is kept in canonical form (no leading zeros) so that string equality is
/// numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct U256(String);

impl U256 {
	/// Create a new U256 from a decimal string, normalizing leading zeros
	pub fn new(value: String) -> Self {
		Self(canonicalize(&value))
	}

	/// Parse and validate a decimal string
	pub fn parse(value: &str) -> Result<Self, String> {
		let candidate = Self(canonicalize(value.trim()));
		candidate.validate()?;
		Ok(candidate)
	}

	pub fn zero() -> Self {
		Self("0".to_string())
	}

	/// Get the raw string value
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Try to parse as u128 (for smaller values)
	pub fn as_u128(&self) -> Result<u128, std::num::ParseIntError> {
		self.0.parse()
	}

	/// Check if the value is zero
	pub fn is_zero(&self) -> bool {
		self.0.chars().all(|c| c == '0')
	}

	/// Validate that the string contains only digits and fits in 256 bits
	pub fn validate(&self) -> Result<(), String> {
		if self.0.is_empty() {
			return Err("U256 value cannot be empty".to_string());
		}

		if !self.0.chars().all(|c| c.is_ascii_digit()) {
			return Err("U256 value must contain only digits".to_string());
		}

		// 2^256 has 78 decimal digits
		if self.0.len() > 78 {
			return Err("U256 value exceeds 256 bits".to_string());
		}

		Ok(())
	}

	/// Value as a float in whole-token units (`value / 10^decimals`)
	///
	/// Lossy by nature; only used for USD valuation and ordinal comparison.
	pub fn to_units(&self, decimals: u8) -> f64 {
		let raw: f64 = self.0.parse().unwrap_or(0.0);
		raw / 10f64.powi(decimals as i32)
	}

	/// Multiply by `numerator / denominator`, rounding down
	///
	/// Returns `None` when the intermediate product does not fit in u128.
	pub fn checked_mul_div(&self, numerator: u128, denominator: u128) -> Option<Self> {
		if denominator == 0 {
			return None;
		}
		let value = self.as_u128().ok()?;
		let product = value.checked_mul(numerator)?;
		Some(Self::from(product / denominator))
	}

	pub fn checked_add(&self, other: &Self) -> Option<Self> {
		let sum = self.as_u128().ok()?.checked_add(other.as_u128().ok()?)?;
		Some(Self::from(sum))
	}
}

fn canonicalize(value: &str) -> String {
	let trimmed = value.trim_start_matches('0');
	if trimmed.is_empty() && !value.is_empty() {
		"0".to_string()
	} else {
		trimmed.to_string()
	}
}

impl Ord for U256 {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0
			.len()
			.cmp(&other.0.len())
			.then_with(|| self.0.cmp(&other.0))
	}
}

impl PartialOrd for U256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl std::fmt::Display for U256 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<String> for U256 {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for U256 {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl From<u128> for U256 {
	fn from(value: u128) -> Self {
		Self(value.to_string())
	}
}

impl From<u64> for U256 {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}

// Serialize/deserialize as a decimal string
impl serde::Serialize for U256 {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}

impl<'de> serde::Deserialize<'de> for U256 {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		U256::parse(&value).map_err(serde::de::Error::custom)
	}
}
