// crates.io
use http::Method;
// self
use crate::{_prelude::*, auth::RejectionReason, error::AttemptError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedDispatch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedDispatch<F> = F;

/// A span wrapping one logical dispatch, across all of its attempts.
#[derive(Clone, Debug)]
pub struct DispatchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DispatchSpan {
	/// Creates a new span tagged with the request method and resolved URL.
	pub fn new(method: &Method, url: &Url) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"service_courier.dispatch",
				method = %method,
				url = %url
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, url);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedDispatch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn trace_success(status: u16, calls: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(status, calls, "Dispatch succeeded.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, calls);
	}
}

pub(crate) fn trace_rate_limited(wait: Duration, holds: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(
			wait_ms = super::millis(wait),
			holds,
			"Remote signaled rate limiting; holding."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (wait, holds);
	}
}

pub(crate) fn trace_unauthorized() {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!("Remote rejected the request token with HTTP 401.");
	}
}

pub(crate) fn trace_retry(error: &AttemptError, retries_remaining: u32, delay: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			error = %error,
			retries_remaining,
			delay_ms = super::millis(delay),
			"Attempt failed; retrying."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, retries_remaining, delay);
	}
}

pub(crate) fn trace_exhausted(error: &AttemptError, calls: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(error = %error, calls, "Retry budget exhausted.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, calls);
	}
}

pub(crate) fn trace_rate_limit_hold(wait: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(wait_ms = super::millis(wait), "Outbound budget exhausted; waiting.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = wait;
	}
}

pub(crate) fn trace_verification(rejection: Option<RejectionReason>) {
	#[cfg(feature = "tracing")]
	{
		match rejection {
			Some(reason) => tracing::warn!(reason = reason.as_str(), "Inbound request rejected."),
			None => tracing::debug!("Inbound request authenticated."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = rejection;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let url = Url::parse("https://topics.internal/search").expect("Test URL should parse.");
		let span = DispatchSpan::new(&Method::POST, &url);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
