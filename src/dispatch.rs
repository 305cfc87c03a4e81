//! Signed, rate-limited, retrying outbound dispatch.
//!
//! [`Dispatcher::dispatch`] drives one logical request through an iterative attempt loop. Every
//! attempt first takes a permit from the shared [`RateLimiter`], then mints a fresh token, then
//! issues the call. Responses are classified as:
//!
//! - 2xx: returned immediately.
//! - 429: held for `Retry-After` (5 seconds when absent) and retried without touching the retry
//!   budget. A remote that keeps answering 429 keeps the dispatch alive indefinitely.
//! - 401: logged as a warning, then handled like any other failure.
//! - anything else, including transport errors: retried after the fixed delay while budget
//!   remains, otherwise surfaced as [`Error::RetriesExhausted`].

mod metrics;
pub mod request;

pub use self::metrics::DispatchMetrics;
pub use request::*;

// crates.io
use http::{
	HeaderMap, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use tokio::time;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::TokenSigner,
	config::Config,
	error::{AttemptError, ConfigError},
	http::{DispatchTransport, OutboundRequest, TransportResponse},
	obs::{self, DispatchOutcome, DispatchSpan},
	rate_limit::RateLimiter,
};

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestTransport>;

/// Issues signed calls to one target service.
///
/// The dispatcher owns its signer and transport handle and shares the [`RateLimiter`] with every
/// other dispatcher that draws from the same outbound budget. Cloning is cheap.
pub struct Dispatcher<T>
where
	T: ?Sized + DispatchTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Outbound budget shared across call sites.
	pub limiter: Arc<RateLimiter>,
	/// Counters for calls, retries, holds, and terminal outcomes.
	pub metrics: Arc<DispatchMetrics>,
	signer: TokenSigner,
	target_url: Url,
	timeout: Duration,
	max_retries: u32,
	retry_delay: Duration,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + DispatchTransport,
{
	/// Default wait applied to a 429 response without a usable `Retry-After` header.
	pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

	/// Creates a dispatcher that reuses the caller-provided transport and limiter.
	pub fn with_transport(
		config: &Config,
		limiter: Arc<RateLimiter>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self {
			transport: transport.into(),
			limiter,
			metrics: Default::default(),
			signer: TokenSigner::new(&config.shared_secret)?,
			target_url: config.target_url.clone(),
			timeout: config.timeout(),
			max_retries: config.max_retries,
			retry_delay: config.retry_delay(),
		})
	}

	/// Base URL relative targets are resolved against.
	pub fn target_url(&self) -> &Url {
		&self.target_url
	}

	/// Starts a request builder; unset policy values fall back to the configuration on send.
	pub fn request(&self, method: Method, target: impl Into<String>) -> DispatchRequest {
		DispatchRequest::new(method, target)
	}

	/// Dispatches one logical request with an explicit retry policy.
	pub async fn dispatch(
		&self,
		method: Method,
		target: &str,
		payload: Option<serde_json::Value>,
		max_retries: u32,
		retry_delay: Duration,
	) -> Result<DispatchResponse> {
		let mut request =
			DispatchRequest::new(method, target).max_retries(max_retries).retry_delay(retry_delay);

		request.payload = payload;

		self.send(request).await
	}

	/// Dispatches `request`, filling unset policy values from the configuration.
	pub async fn send(&self, request: DispatchRequest) -> Result<DispatchResponse> {
		let url = self.resolve(&request.target)?;
		let body = request
			.payload
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(ConfigError::from)?;
		let span = DispatchSpan::new(&request.method, &url);
		let attempt = RequestAttempt {
			method: request.method,
			url,
			body,
			retries_remaining: request.max_retries.unwrap_or(self.max_retries),
			rate_limit_holds: 0,
		};
		let retry_delay = request.retry_delay.unwrap_or(self.retry_delay);
		let result = span.instrument(self.run(attempt, retry_delay)).await;

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_dispatch_outcome(DispatchOutcome::Success);
			},
			Err(Error::RetriesExhausted { .. }) => {
				self.metrics.record_failure();
				obs::record_dispatch_outcome(DispatchOutcome::Failure);
			},
			Err(_) => obs::record_dispatch_outcome(DispatchOutcome::Failure),
		}

		result
	}

	async fn run(
		&self,
		mut attempt: RequestAttempt,
		retry_delay: Duration,
	) -> Result<DispatchResponse> {
		let mut calls = 0_u32;

		loop {
			self.limiter.acquire().await;

			let outbound = attempt.outbound(&self.signer, self.timeout)?;

			calls = calls.saturating_add(1);
			self.metrics.record_call();
			obs::record_dispatch_outcome(DispatchOutcome::Attempt);

			let failure = match self.transport.send(outbound).await {
				Ok(response) if response.is_success() => {
					obs::trace_success(response.status, calls);

					return Ok(DispatchResponse::new(attempt.url, response));
				},
				Ok(response) if response.status == STATUS_TOO_MANY_REQUESTS => {
					let wait = response.retry_after().unwrap_or(Self::DEFAULT_RETRY_AFTER);

					attempt.rate_limit_holds += 1;
					self.metrics.record_rate_limited();
					obs::record_dispatch_outcome(DispatchOutcome::RateLimited);
					obs::trace_rate_limited(wait, attempt.rate_limit_holds);

					time::sleep(wait).await;

					continue;
				},
				Ok(response) => classify_failure(response),
				Err(err) => AttemptError::Transport(err),
			};

			if attempt.retries_remaining == 0 {
				obs::trace_exhausted(&failure, calls);

				return Err(Error::RetriesExhausted { url: attempt.url, attempts: calls, last: failure });
			}

			obs::trace_retry(&failure, attempt.retries_remaining, retry_delay);
			self.metrics.record_retry();
			obs::record_dispatch_outcome(DispatchOutcome::Retry);

			time::sleep(retry_delay).await;

			attempt.retries_remaining -= 1;
		}
	}

	fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		self.target_url
			.join(target)
			.map_err(|source| ConfigError::InvalidRequestPath { path: target.to_owned(), source })
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher backed by a reqwest client honoring the configured timeout.
	pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(config.timeout()).build()?;

		Self::with_transport(config, limiter, ReqwestTransport::with_client(client))
	}

	/// Creates a dispatcher together with a fresh limiter sized from `config`.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		Self::new(config, Arc::new(RateLimiter::from_config(config)?))
	}
}
impl<T> Clone for Dispatcher<T>
where
	T: ?Sized + DispatchTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			limiter: self.limiter.clone(),
			metrics: self.metrics.clone(),
			signer: self.signer.clone(),
			target_url: self.target_url.clone(),
			timeout: self.timeout,
			max_retries: self.max_retries,
			retry_delay: self.retry_delay,
		}
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + DispatchTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("target_url", &self.target_url.as_str())
			.field("timeout", &self.timeout)
			.field("max_retries", &self.max_retries)
			.field("retry_delay", &self.retry_delay)
			.finish()
	}
}

/// In-flight state for one logical request, carried across attempts.
struct RequestAttempt {
	method: Method,
	url: Url,
	body: Option<Vec<u8>>,
	retries_remaining: u32,
	rate_limit_holds: u32,
}
impl RequestAttempt {
	/// Builds the next call with a token minted now.
	fn outbound(
		&self,
		signer: &TokenSigner,
		timeout: Duration,
	) -> Result<OutboundRequest, ConfigError> {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::try_from(signer.generate().bearer())?);
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		if self.body.is_some() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}

		Ok(OutboundRequest {
			method: self.method.clone(),
			url: self.url.clone(),
			headers,
			body: self.body.clone(),
			timeout,
		})
	}
}

fn classify_failure(response: TransportResponse) -> AttemptError {
	if response.status == STATUS_UNAUTHORIZED {
		obs::trace_unauthorized();

		AttemptError::Unauthorized
	} else {
		AttemptError::status(response.status, &response.body)
	}
}
