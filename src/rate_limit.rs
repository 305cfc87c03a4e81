//! Outbound request budget shared by every dispatch call site in the process.
//!
//! The limiter hands out at most `max_per_window` permits per window, where a window opens with
//! the first permit granted after the previous window elapsed. Callers that find the current
//! window full reserve a slot in the next one while holding the internal lock, so reservation
//! order equals arrival order and waiters are released FIFO. The lock is never held across an
//! await point.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::{_prelude::*, config::Config, error::ConfigError, obs};

/// Fixed-window FIFO rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
	state: Mutex<RateWindow>,
	max_per_window: u32,
	window: Duration,
}
impl RateLimiter {
	/// Creates a limiter granting `max_per_window` permits per `window`.
	pub fn new(max_per_window: u32, window: Duration) -> Result<Self, ConfigError> {
		if max_per_window == 0 {
			return Err(ConfigError::ZeroRateLimit);
		}

		Ok(Self { state: Mutex::new(RateWindow::default()), max_per_window, window })
	}

	/// Creates a limiter granting `max` permits per second.
	pub fn per_second(max: u32) -> Result<Self, ConfigError> {
		Self::new(max, Duration::from_secs(1))
	}

	/// Creates a limiter from `max_requests_per_second` in `config`.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		Self::per_second(config.max_requests_per_second)
	}

	/// Permits granted per window.
	pub fn max_per_window(&self) -> u32 {
		self.max_per_window
	}

	/// Window length.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Waits until the caller may issue one request.
	///
	/// The permit is consumed; nothing needs to be returned afterwards.
	pub async fn acquire(&self) {
		let now = Instant::now();
		let ready_at = self.state.lock().reserve(now, self.max_per_window, self.window);

		if ready_at > now {
			obs::trace_rate_limit_hold(ready_at - now);

			time::sleep_until(ready_at).await;
		}
	}

	/// Takes a permit only if one is available right now and nobody is queued ahead.
	pub fn try_acquire(&self) -> bool {
		let now = Instant::now();
		let mut state = self.state.lock();

		if !state.has_capacity_at(now, self.max_per_window, self.window) {
			return false;
		}

		state.reserve(now, self.max_per_window, self.window);

		true
	}
}

#[derive(Debug, Default)]
struct RateWindow {
	window_start: Option<Instant>,
	count_in_window: u32,
}
impl RateWindow {
	/// Books the next free slot and returns the instant it becomes usable.
	fn reserve(&mut self, now: Instant, max: u32, window: Duration) -> Instant {
		let start = match self.window_start {
			Some(start) if now < start + window =>
				if self.count_in_window < max {
					start
				} else {
					let next = start + window;

					self.window_start = Some(next);
					self.count_in_window = 0;

					next
				},
			_ => {
				self.window_start = Some(now);
				self.count_in_window = 0;

				now
			},
		};

		self.count_in_window += 1;

		start.max(now)
	}

	fn has_capacity_at(&self, now: Instant, max: u32, window: Duration) -> bool {
		match self.window_start {
			Some(start) if start > now => false,
			Some(start) if now < start + window => self.count_in_window < max,
			_ => true,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const WINDOW: Duration = Duration::from_secs(1);

	#[test]
	fn reservations_fill_windows_in_order() {
		let t0 = Instant::now();
		let mut window = RateWindow::default();
		let slots = (0..5).map(|_| window.reserve(t0, 2, WINDOW)).collect::<Vec<_>>();

		assert_eq!(slots, vec![t0, t0, t0 + WINDOW, t0 + WINDOW, t0 + WINDOW * 2]);
	}

	#[test]
	fn window_resets_after_elapsing() {
		let t0 = Instant::now();
		let mut window = RateWindow::default();

		window.reserve(t0, 1, WINDOW);

		let later = t0 + Duration::from_millis(1_500);

		assert_eq!(window.reserve(later, 1, WINDOW), later);
		assert_eq!(window.reserve(later, 1, WINDOW), later + WINDOW);
	}

	#[test]
	fn zero_ceiling_is_rejected() {
		assert!(matches!(RateLimiter::per_second(0), Err(ConfigError::ZeroRateLimit)));
	}

	#[tokio::test(start_paused = true)]
	async fn try_acquire_does_not_queue() {
		let limiter = RateLimiter::per_second(1).expect("Limiter should accept a ceiling of 1.");

		assert!(limiter.try_acquire());
		assert!(!limiter.try_acquire());

		time::advance(WINDOW).await;

		assert!(limiter.try_acquire());
	}

	#[tokio::test(start_paused = true)]
	async fn try_acquire_yields_to_queued_waiters() {
		let limiter = RateLimiter::per_second(2).expect("Limiter should accept a ceiling of 2.");

		limiter.acquire().await;
		limiter.acquire().await;
		// Books a slot in the next window without waiting for it.
		limiter.state.lock().reserve(Instant::now(), 2, WINDOW);

		time::advance(Duration::from_millis(500)).await;

		assert!(!limiter.try_acquire());
	}

	#[tokio::test(start_paused = true)]
	async fn acquire_spaces_bursts_by_window() {
		let limiter = RateLimiter::per_second(3).expect("Limiter should accept a ceiling of 3.");
		let t0 = Instant::now();

		for _ in 0..3 {
			limiter.acquire().await;
		}

		assert_eq!(Instant::now(), t0);

		limiter.acquire().await;

		let elapsed = Instant::now() - t0;

		assert!(elapsed >= WINDOW && elapsed < WINDOW + Duration::from_millis(5));
	}
}
