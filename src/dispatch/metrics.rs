// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for outbound dispatch activity.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	calls: AtomicU64,
	success: AtomicU64,
	retries: AtomicU64,
	rate_limited: AtomicU64,
	failure: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the total number of HTTP calls issued, rate-limited ones included.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of dispatches that ended with a 2xx response.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of budgeted retries performed.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of 429 holds observed.
	pub fn rate_limited(&self) -> u64 {
		self.rate_limited.load(Ordering::Relaxed)
	}

	/// Returns the number of dispatches that exhausted their retry budget.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rate_limited(&self) {
		self.rate_limited.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
