//! File-backed [`KvStore`] so a console session survives process restarts.

// std
use std::{
	fs::{self, File},
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreBatch, StoreError, StoreFuture},
};

type Entries = BTreeMap<String, String>;

/// Persists entries as one JSON object that is rewritten after each mutation.
///
/// Writes land in a sibling `.tmp` file that is then renamed over the target, so readers of
/// the file never observe half of a batch.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens the store at `path`, loading any existing snapshot. A missing or blank file starts
	/// empty; an unparseable one is an error.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let entries = match fs::read(&path) {
			Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Entries::new(),
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => Entries::new(),
			Err(e) => return Err(io_error("read", &path, e)),
		};

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	// The on-disk write happens before the in-memory swap so a failed write leaves both views
	// unchanged.
	fn mutate<F>(&self, apply: F) -> Result<(), StoreError>
	where
		F: FnOnce(&mut Entries) -> bool,
	{
		let mut guard = self.entries.write();
		let mut next = guard.clone();

		if !apply(&mut next) {
			return Ok(());
		}

		self.write_snapshot(&next)?;
		*guard = next;

		Ok(())
	}

	fn write_snapshot(&self, entries: &Entries) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
		}

		let bytes = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode store snapshot: {e}"),
		})?;
		let tmp = self.path.with_extension("tmp");
		let mut file = File::create(&tmp).map_err(|e| io_error("create", &tmp, e))?;

		file.write_all(&bytes).map_err(|e| io_error("write", &tmp, e))?;
		file.sync_all().map_err(|e| io_error("sync", &tmp, e))?;
		drop(file);

		fs::rename(&tmp, &self.path).map_err(|e| io_error("replace", &self.path, e))
	}
}
impl KvStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.entries.read().get(key).cloned()) })
	}

	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			if batch.is_empty() {
				return Ok(());
			}

			self.mutate(|entries| {
				let removed = batch
					.remove
					.iter()
					.fold(false, |changed, key| entries.remove(key).is_some() || changed);
				let written = !batch.set.is_empty();

				entries.extend(batch.set);

				removed || written
			})
		})
	}
}

fn io_error(action: &str, path: &Path, e: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}
