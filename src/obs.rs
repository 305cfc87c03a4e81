//! Optional observability helpers for dispatch and verification.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit a span named `service_courier.dispatch` with the
//!   `method` and `url` fields, plus events for each success, rate-limit hold, and retry decision.
//! - Enable `metrics` to increment the `service_courier_dispatch_total` counter labeled by
//!   `outcome`, and the `service_courier_auth_total` counter labeled by `result`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for dispatch calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
	/// One HTTP call was issued.
	Attempt,
	/// Dispatch returned a 2xx response.
	Success,
	/// A failed call is being retried.
	Retry,
	/// Remote answered 429 and the call is being held.
	RateLimited,
	/// Dispatch exhausted its retry budget.
	Failure,
}
impl DispatchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchOutcome::Attempt => "attempt",
			DispatchOutcome::Success => "success",
			DispatchOutcome::Retry => "retry",
			DispatchOutcome::RateLimited => "rate_limited",
			DispatchOutcome::Failure => "failure",
		}
	}
}
impl Display for DispatchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(feature = "tracing")]
fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
