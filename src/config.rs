//! Immutable courier configuration shared by the signer, limiter, dispatcher, and verifier.
//!
//! A [`Config`] is built once at startup (directly or by deserializing a JSON/TOML document)
//! and handed to each component's constructor. Components never consult ambient process state.

// self
use crate::{_prelude::*, auth::SharedSecret, error::ConfigError};

/// Courier configuration.
///
/// Integer fields mirror the wire-level units operators configure: milliseconds for delays and
/// timeouts, seconds for the token skew window. Use the accessor methods to obtain
/// [`Duration`] values.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	/// Secret shared with the remote service for HMAC request tokens.
	pub shared_secret: SharedSecret,
	/// Base URL that relative request paths are resolved against.
	pub target_url: Url,
	/// Per-call HTTP timeout.
	#[serde(default = "Config::default_timeout_ms")]
	pub timeout_ms: u64,
	/// Retries allowed after the initial attempt.
	#[serde(default = "Config::default_max_retries")]
	pub max_retries: u32,
	/// Fixed delay between retries.
	#[serde(default = "Config::default_retry_delay_ms")]
	pub retry_delay_ms: u64,
	/// Outbound request ceiling per rolling one-second window.
	#[serde(default = "Config::default_max_requests_per_second")]
	pub max_requests_per_second: u32,
	/// Maximum accepted token age on the verifying side.
	#[serde(default = "Config::default_auth_token_max_skew_secs")]
	pub auth_token_max_skew_secs: u64,
}
impl Config {
	/// Default per-call timeout in milliseconds.
	pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
	/// Default retry budget.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Default fixed retry delay in milliseconds.
	pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
	/// Default outbound ceiling per second.
	pub const DEFAULT_MAX_REQUESTS_PER_SECOND: u32 = 5;
	/// Default token skew window in seconds.
	pub const DEFAULT_AUTH_TOKEN_MAX_SKEW_SECS: u64 = 300;

	/// Creates a configuration with default tuning for the provided secret and target.
	pub fn new(shared_secret: impl Into<SharedSecret>, target_url: Url) -> Self {
		Self {
			shared_secret: shared_secret.into(),
			target_url,
			timeout_ms: Self::DEFAULT_TIMEOUT_MS,
			max_retries: Self::DEFAULT_MAX_RETRIES,
			retry_delay_ms: Self::DEFAULT_RETRY_DELAY_MS,
			max_requests_per_second: Self::DEFAULT_MAX_REQUESTS_PER_SECOND,
			auth_token_max_skew_secs: Self::DEFAULT_AUTH_TOKEN_MAX_SKEW_SECS,
		}
	}

	/// Parses `target_url` before delegating to [`Config::new`].
	pub fn parse(
		shared_secret: impl Into<SharedSecret>,
		target_url: &str,
	) -> Result<Self, ConfigError> {
		let url = Url::parse(target_url).map_err(|source| ConfigError::InvalidTargetUrl {
			value: target_url.to_owned(),
			source,
		})?;

		Ok(Self::new(shared_secret, url))
	}

	/// Overrides the per-call timeout.
	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = timeout_ms;

		self
	}

	/// Overrides the retry budget.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the fixed retry delay.
	pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
		self.retry_delay_ms = retry_delay_ms;

		self
	}

	/// Overrides the outbound ceiling per second.
	pub fn with_max_requests_per_second(mut self, max: u32) -> Self {
		self.max_requests_per_second = max;

		self
	}

	/// Overrides the token skew window.
	pub fn with_auth_token_max_skew_secs(mut self, secs: u64) -> Self {
		self.auth_token_max_skew_secs = secs;

		self
	}

	/// Rejects configurations the components cannot operate with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.shared_secret.is_empty() {
			return Err(ConfigError::EmptySecret);
		}
		if self.max_requests_per_second == 0 {
			return Err(ConfigError::ZeroRateLimit);
		}

		Ok(())
	}

	/// Per-call timeout as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// Fixed retry delay as a [`Duration`].
	pub fn retry_delay(&self) -> Duration {
		Duration::from_millis(self.retry_delay_ms)
	}

	/// Token skew window as a [`Duration`].
	pub fn max_skew(&self) -> Duration {
		Duration::from_secs(self.auth_token_max_skew_secs)
	}

	fn default_timeout_ms() -> u64 {
		Self::DEFAULT_TIMEOUT_MS
	}

	fn default_max_retries() -> u32 {
		Self::DEFAULT_MAX_RETRIES
	}

	fn default_retry_delay_ms() -> u64 {
		Self::DEFAULT_RETRY_DELAY_MS
	}

	fn default_max_requests_per_second() -> u32 {
		Self::DEFAULT_MAX_REQUESTS_PER_SECOND
	}

	fn default_auth_token_max_skew_secs() -> u64 {
		Self::DEFAULT_AUTH_TOKEN_MAX_SKEW_SECS
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn deserializes_with_defaults() {
		let config: Config = serde_json::from_str(
			r#"{"shared_secret":"s3cret","target_url":"https://topics.internal/"}"#,
		)
		.expect("Minimal configuration should deserialize.");

		assert_eq!(config.timeout(), Duration::from_secs(30));
		assert_eq!(config.max_retries, 3);
		assert_eq!(config.retry_delay(), Duration::from_secs(1));
		assert_eq!(config.max_requests_per_second, 5);
		assert_eq!(config.max_skew(), Duration::from_secs(300));
		assert_eq!(config.target_url.as_str(), "https://topics.internal/");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn validate_rejects_unusable_values() {
		let config = Config::parse("", "https://topics.internal/")
			.expect("Target URL should parse for validation test.");

		assert!(matches!(config.validate(), Err(ConfigError::EmptySecret)));

		let config = Config::parse("s3cret", "https://topics.internal/")
			.expect("Target URL should parse for validation test.")
			.with_max_requests_per_second(0);

		assert!(matches!(config.validate(), Err(ConfigError::ZeroRateLimit)));
	}

	#[test]
	fn parse_reports_invalid_target() {
		let err = Config::parse("s3cret", "not a url").expect_err("Garbage URL should fail.");

		assert!(matches!(err, ConfigError::InvalidTargetUrl { ref value, .. } if value == "not a url"));
	}

	#[test]
	fn debug_output_redacts_secret() {
		let config = Config::parse("very-secret-value", "https://topics.internal/")
			.expect("Target URL should parse for redaction test.");

		assert!(!format!("{config:?}").contains("very-secret-value"));
	}
}
