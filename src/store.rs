//! Durable key-value contract and built-in backends for session persistence.

pub mod credential;
pub mod file;
pub mod memory;

pub use credential::CredentialStore;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`KvStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// One atomic mutation: removals are applied first, then writes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreBatch {
	/// Entries to write.
	pub set: Vec<(String, String)>,
	/// Keys to remove; absent keys are ignored.
	pub remove: Vec<String>,
}
impl StoreBatch {
	/// Returns `true` when the batch changes nothing.
	pub fn is_empty(&self) -> bool {
		self.set.is_empty() && self.remove.is_empty()
	}
}

/// String key-value surface that outlives the process (browser storage equivalent).
///
/// Batches must be applied atomically: readers observe either every change of a batch or none
/// of them.
pub trait KvStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Applies `batch` atomically.
	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()>;

	/// Writes every entry as one batch.
	fn set_many(&self, entries: Vec<(String, String)>) -> StoreFuture<'_, ()> {
		self.apply(StoreBatch { set: entries, remove: Vec::new() })
	}

	/// Removes every key as one batch; absent keys are ignored.
	fn remove_many(&self, keys: Vec<String>) -> StoreFuture<'_, ()> {
		self.apply(StoreBatch { set: Vec::new(), remove: keys })
	}
}
impl<T> KvStore for Arc<T>
where
	T: ?Sized + KvStore,
{
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		(**self).get(key)
	}

	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()> {
		(**self).apply(batch)
	}
}

/// Error type produced by [`KvStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[tokio::test]
	async fn shared_handles_delegate_to_the_inner_store() {
		let store = Arc::new(MemoryStore::default());
		let handle: Arc<dyn KvStore> = store.clone();

		handle
			.set_many(vec![("k".into(), "v".into())])
			.await
			.expect("Shared handle should write through.");

		assert_eq!(store.get("k").await.expect("Read should succeed."), Some("v".into()));
	}
}
