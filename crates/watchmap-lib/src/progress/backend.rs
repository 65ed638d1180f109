//! Key-value persistence backends for [`ProgressStore`](super::ProgressStore).

use std::collections::HashMap;

/// An opaque persistent key-value store.
///
/// Implementations should treat writes as complete once the call returns.
pub trait KeyValueBackend {
	/// Returns `None` when the key has never been written or was deleted.
	fn get(&self, key: &str) -> crate::Result<Option<String>>;
	fn set(&mut self, key: &str, value: &str) -> crate::Result<()>;
	/// Deleting a missing key is not an error.
	fn delete(&mut self, key: &str) -> crate::Result<()>;
}

/// Keeps values in process memory, nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
	values: HashMap<String, String>,
	writes: usize,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of `set` calls made, used to check write batching.
	pub fn write_count(&self) -> usize {
		self.writes
	}
}

impl KeyValueBackend for MemoryBackend {
	fn get(&self, key: &str) -> crate::Result<Option<String>> {
		Ok(self.values.get(key).cloned())
	}

	fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
		self.writes += 1;
		self.values.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn delete(&mut self, key: &str) -> crate::Result<()> {
		self.values.remove(key);
		Ok(())
	}
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
	dir: std::path::PathBuf,
}

impl FileBackend {
	/// The directory is created lazily on the first write.
	pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &std::path::Path {
		&self.dir
	}

	fn path_for(&self, key: &str) -> crate::Result<std::path::PathBuf> {
		if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
			return Err(crate::Error::Storage(format!("invalid storage key \"{}\"", key)))
		}
		Ok(self.dir.join(format!("{}.json", key)))
	}
}

impl KeyValueBackend for FileBackend {
	fn get(&self, key: &str) -> crate::Result<Option<String>> {
		let path = self.path_for(key)?;
		match std::fs::read_to_string(&path) {
			Ok(s) => Ok(Some(s)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
		let path = self.path_for(key)?;
		std::fs::create_dir_all(&self.dir)?;
		/* Write then rename so a crash mid-write can't leave a truncated file behind */
		let tmp = path.with_extension("json.tmp");
		if let Err(e) = std::fs::write(&tmp, value).and_then(|_| std::fs::rename(&tmp, &path)) {
			let _ = std::fs::remove_file(&tmp);
			return Err(e.into())
		}
		log::trace!("Wrote {} bytes to {}", value.len(), path.display());
		Ok(())
	}

	fn delete(&mut self, key: &str) -> crate::Result<()> {
		let path = self.path_for(key)?;
		match std::fs::remove_file(&path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}
