//! Signed, rate-limited, retrying service-to-service HTTP dispatch, plus the matching HMAC
//! bearer-token verifier for the receiving side.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod rate_limit;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::Config,
		dispatch::{Dispatcher, ReqwestDispatcher},
		http::ReqwestTransport,
		rate_limit::RateLimiter,
	};

	/// Shared secret used by test dispatchers and verifiers.
	pub const TEST_SECRET: &str = "courier-test-secret";

	/// Builds a [`Config`] pointing at `target_url` with fast, test-friendly retry tuning.
	pub fn test_config(target_url: &str) -> Config {
		Config::parse(TEST_SECRET, target_url)
			.expect("Test target URL should parse.")
			.with_retry_delay_ms(10)
			.with_max_requests_per_second(50)
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`Dispatcher`] backed by the insecure test transport and a fresh limiter
	/// sized from `config`.
	pub fn build_reqwest_test_dispatcher(
		config: &Config,
	) -> (ReqwestDispatcher, Arc<RateLimiter>) {
		let limiter = Arc::new(
			RateLimiter::from_config(config).expect("Test limiter should build from config."),
		);
		let dispatcher =
			Dispatcher::with_transport(config, limiter.clone(), test_reqwest_transport())
				.expect("Test dispatcher should build from config.");

		(dispatcher, limiter)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
