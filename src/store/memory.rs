//! Thread-safe in-memory [`KvStore`] implementation for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreBatch, StoreFuture},
};

type StoreMap = Arc<RwLock<BTreeMap<String, String>>>;

/// Storage backend that keeps entries in-process; contents vanish with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-populated with `entries`.
	pub fn with_entries<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Copies the current contents.
	pub fn snapshot(&self) -> BTreeMap<String, String> {
		self.0.read().clone()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl KvStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.0.read().get(key).cloned()) })
	}

	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.0.write();

			for key in &batch.remove {
				guard.remove(key);
			}

			guard.extend(batch.set);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn batches_apply_and_remove_together() {
		let store = MemoryStore::with_entries([("keep", "1")]);

		store
			.set_many(vec![("a".into(), "1".into()), ("b".into(), "2".into())])
			.await
			.expect("Batch write should succeed.");

		assert_eq!(store.snapshot().len(), 3);

		store
			.remove_many(vec!["a".into(), "b".into(), "missing".into()])
			.await
			.expect("Batch removal should ignore absent keys.");

		assert_eq!(store.get("a").await.expect("Read should succeed."), None);
		assert_eq!(store.get("keep").await.expect("Read should succeed."), Some("1".into()));
		assert!(!store.is_empty());
	}

	#[tokio::test]
	async fn mixed_batches_remove_then_write() {
		let store = MemoryStore::with_entries([("refreshToken", "r1"), ("accessToken", "a1")]);

		store
			.apply(StoreBatch {
				set: vec![("accessToken".into(), "a2".into())],
				remove: vec!["refreshToken".into(), "accessToken".into()],
			})
			.await
			.expect("Mixed batch should apply.");

		assert_eq!(store.snapshot(), BTreeMap::from([("accessToken".into(), "a2".into())]));
	}
}
