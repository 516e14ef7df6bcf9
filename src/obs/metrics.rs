// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counts one flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"ums_admin_client_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records how long a finished flow took.
pub fn record_flow_duration(kind: FlowKind, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("ums_admin_client_flow_duration_seconds", "flow" => kind.as_str())
		.record(elapsed.as_secs_f64());

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, elapsed);
}

/// Counts a refresh request that was satisfied by another caller's refresh.
pub fn record_refresh_coalesced() {
	#[cfg(feature = "metrics")]
	metrics::counter!("ums_admin_client_refresh_coalesced_total").increment(1);
}
