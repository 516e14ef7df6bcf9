// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs;

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
	/// Refresh requests, coalesced ones included.
	pub attempts: u64,
	/// Refreshes that produced a new credential.
	pub successes: u64,
	/// Refreshes that ended the session.
	pub failures: u64,
	/// Requests answered by a refresh another caller already finished.
	pub coalesced: u64,
}

/// Lock-free refresh counters shared by every holder of the session.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	coalesced: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh requests, coalesced ones included.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refreshes that produced a new credential.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Refreshes that ended the session.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Requests answered by a refresh another caller already finished.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Copies every counter.
	pub fn stats(&self) -> RefreshStats {
		RefreshStats {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
			coalesced: self.coalesced(),
		}
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
		obs::record_refresh_coalesced();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn stats_copy_every_counter() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_attempt();
		metrics.record_success();
		metrics.record_coalesced();

		assert_eq!(
			metrics.stats(),
			RefreshStats { attempts: 2, successes: 1, failures: 0, coalesced: 1 }
		);
	}
}
