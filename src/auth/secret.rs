//! Shared secret wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

/// Redacted HMAC secret shared by the calling and the receiving service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SharedSecret(Vec<u8>);
impl SharedSecret {
	/// Wraps raw secret bytes.
	pub fn new(value: impl Into<Vec<u8>>) -> Self {
		Self(value.into())
	}

	/// Returns the secret bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` when the secret holds no bytes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for SharedSecret {
	fn from(value: String) -> Self {
		Self(value.into_bytes())
	}
}
impl From<&str> for SharedSecret {
	fn from(value: &str) -> Self {
		Self(value.as_bytes().to_vec())
	}
}
impl From<Vec<u8>> for SharedSecret {
	fn from(value: Vec<u8>) -> Self {
		Self(value)
	}
}
impl Debug for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SharedSecret").field(&"<redacted>").finish()
	}
}
impl Display for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
