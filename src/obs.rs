//! Optional observability for session flows.
//!
//! Every flow (login, logout, refresh, ...) is wrapped in a [`FlowRecord`], which opens a span,
//! counts the attempt, and reports the outcome and wall-clock duration when it finishes.
//!
//! # Feature Flags
//!
//! - `tracing`: spans named `ums_admin_client.flow` carrying `flow` and `stage`, a `debug`
//!   completion event with `outcome` and `elapsed_ms`, and `warn`/`debug` events for recoverable
//!   anomalies (ignored logout failures, discarded caches, coalesced refreshes).
//! - `metrics`: the `ums_admin_client_flow_total` counter labeled by `flow` + `outcome`, the
//!   `ums_admin_client_flow_duration_seconds` histogram labeled by `flow`, and the
//!   `ums_admin_client_refresh_coalesced_total` counter.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Session flows observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Password login.
	Login,
	/// Logout and local cleanup.
	Logout,
	/// Credential refresh.
	Refresh,
	/// Self-registration.
	Register,
	/// Revoke every session of the operator.
	RevokeAll,
	/// User-info lookup.
	UserInfo,
	/// Restore from persisted state at startup.
	Restore,
}
impl FlowKind {
	/// Stable label for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Login => "login",
			Self::Logout => "logout",
			Self::Refresh => "refresh",
			Self::Register => "register",
			Self::RevokeAll => "revoke_all",
			Self::UserInfo => "user_info",
			Self::Restore => "restore",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome label of one flow execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The flow was entered.
	Attempt,
	/// The flow completed.
	Success,
	/// The flow returned an error.
	Failure,
}
impl FlowOutcome {
	/// Stable label for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}

	/// Classifies a flow result.
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One in-flight execution of a session flow.
#[derive(Debug)]
pub struct FlowRecord {
	kind: FlowKind,
	span: FlowSpan,
	started: Instant,
}
impl FlowRecord {
	/// Opens the span and counts the attempt.
	pub fn start(kind: FlowKind, stage: &'static str) -> Self {
		record_flow_outcome(kind, FlowOutcome::Attempt);

		Self { kind, span: FlowSpan::new(kind, stage), started: Instant::now() }
	}

	/// Flow this record tracks.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Runs `fut` inside the flow's span.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		self.span.instrument(fut)
	}

	/// Reports the outcome of `result`.
	pub fn finish<T>(self, result: &Result<T>) {
		self.close(FlowOutcome::of(result));
	}

	/// Reports success for flows that cannot fail.
	pub fn succeed(self) {
		self.close(FlowOutcome::Success);
	}

	fn close(self, outcome: FlowOutcome) {
		let elapsed = self.started.elapsed();

		record_flow_outcome(self.kind, outcome);
		record_flow_duration(self.kind, elapsed);
		flow_finished_event(&self.span, outcome, elapsed);
	}
}
