//! Routing seam the session uses to send the operator back to the login entry point.

// self
use crate::_prelude::*;

/// Host-provided navigation hooks.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Location the operator is currently viewing, used as the post-login return target.
	fn current_location(&self) -> Option<String>;

	/// Shows the login entry point, optionally carrying a return target.
	fn redirect_to_login(&self, return_to: Option<&str>);
}
impl<T> Navigator for Arc<T>
where
	T: ?Sized + Navigator,
{
	fn current_location(&self) -> Option<String> {
		(**self).current_location()
	}

	fn redirect_to_login(&self, return_to: Option<&str>) {
		(**self).redirect_to_login(return_to)
	}
}

/// Navigator for headless hosts; reports no location and ignores redirects.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn current_location(&self) -> Option<String> {
		None
	}

	fn redirect_to_login(&self, _: Option<&str>) {}
}

/// Navigator that records redirects and serves a settable current location.
///
/// Handy for CLIs that print "log in again" hints, and for tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
	location: Mutex<Option<String>>,
	redirects: Mutex<Vec<Option<String>>>,
}
impl RecordingNavigator {
	/// Creates a navigator positioned at `location`.
	pub fn at(location: impl Into<String>) -> Self {
		Self { location: Mutex::new(Some(location.into())), redirects: Mutex::default() }
	}

	/// Moves the current location.
	pub fn set_location(&self, location: Option<String>) {
		*self.location.lock() = location;
	}

	/// Every redirect issued so far, oldest first.
	pub fn redirects(&self) -> Vec<Option<String>> {
		self.redirects.lock().clone()
	}
}
impl Navigator for RecordingNavigator {
	fn current_location(&self) -> Option<String> {
		self.location.lock().clone()
	}

	fn redirect_to_login(&self, return_to: Option<&str>) {
		self.redirects.lock().push(return_to.map(str::to_owned));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_navigator_tracks_redirects() {
		let navigator = RecordingNavigator::at("/admin/roles");

		navigator.redirect_to_login(navigator.current_location().as_deref());
		navigator.set_location(None);
		navigator.redirect_to_login(None);

		assert_eq!(navigator.redirects(), vec![Some("/admin/roles".to_owned()), None]);
	}
}
