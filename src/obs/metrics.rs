// self
use crate::{auth::RejectionReason, obs::DispatchOutcome};

/// Records a dispatch outcome via the global metrics recorder (when enabled).
pub fn record_dispatch_outcome(outcome: DispatchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("service_courier_dispatch_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records an inbound verification result via the global metrics recorder (when enabled).
pub fn record_verification(rejection: Option<RejectionReason>) {
	super::trace_verification(rejection);

	#[cfg(feature = "metrics")]
	{
		let result = rejection.map_or("authenticated", RejectionReason::as_str);

		metrics::counter!("service_courier_auth_total", "result" => result).increment(1);
	}
}
