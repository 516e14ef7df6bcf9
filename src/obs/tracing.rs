// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Future type returned by [`FlowSpan::instrument`]; a passthrough without `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future type returned by [`FlowSpan::instrument`]; a passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span tagged with a flow kind and call-site stage.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens `ums_admin_client.flow` for `kind` at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		return Self {
			span: tracing::info_span!("ums_admin_client.flow", flow = kind.as_str(), stage),
		};

		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Attaches the span to `fut`; no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		return tracing::Instrument::instrument(fut, self.span.clone());

		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn flow_finished_event(span: &FlowSpan, outcome: FlowOutcome, elapsed: StdDuration) {
	#[cfg(feature = "tracing")]
	span.span.in_scope(|| {
		tracing::debug!(
			outcome = outcome.as_str(),
			elapsed_ms = elapsed.as_millis() as u64,
			"flow finished"
		)
	});

	#[cfg(not(feature = "tracing"))]
	let _ = (span, outcome, elapsed);
}

/// Emits a `warn` event for a recoverable anomaly.
pub fn warn_event(stage: &'static str, message: &str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(stage, "{message}");

	#[cfg(not(feature = "tracing"))]
	let _ = (stage, message);
}

/// Emits a `debug` event for expected but noteworthy behavior.
pub fn debug_event(stage: &'static str, message: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(stage, "{message}");

	#[cfg(not(feature = "tracing"))]
	let _ = (stage, message);
}
