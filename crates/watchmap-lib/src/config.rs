use serde::{Serialize, Deserialize};

use crate::layout::LayoutMetrics;

const CONFIG_FILE_NAME: &str = "config.json";

/// Storage key used when none is configured, kept compatible with existing saves.
pub const DEFAULT_STORAGE_KEY: &str = "watchProgress";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchmapConfig {
	data_dir: std::path::PathBuf,
	image_dir: std::path::PathBuf,
	catalog_path: Option<std::path::PathBuf>,
	storage_key: String,
	layout: LayoutMetrics,
}

impl Default for WatchmapConfig {
	fn default() -> Self {
		Self {
			data_dir: {
				#[cfg(target_os = "windows")]
				let path = std::env::var("APPDATA").map(std::path::PathBuf::from).ok();

				#[cfg(not(target_os = "windows"))]
				let path = if let Ok(e) = std::env::var("XDG_DATA_HOME") {
					Some(std::path::PathBuf::from(e))
				} else {
					std::env::var("HOME").map(|h| std::path::PathBuf::from(h).join(".local/share")).ok()
				};

				/* Without a home directory progress lands next to the working directory */
				path.unwrap_or_else(|| std::path::PathBuf::from(".")).join("watchmap")
			},
			image_dir: std::path::PathBuf::from("assets/images"),
			catalog_path: None,
			storage_key: DEFAULT_STORAGE_KEY.to_string(),
			layout: LayoutMetrics::default(),
		}
	}
}

impl WatchmapConfig {
	/// Location of the config file, `None` when no config directory can be determined.
	pub fn config_file_path() -> Option<std::path::PathBuf> {
		#[cfg(target_os = "windows")]
		let path = std::env::var("APPDATA").map(std::path::PathBuf::from).ok();

		#[cfg(not(target_os = "windows"))]
		let path = if let Ok(e) = std::env::var("XDG_CONFIG_HOME") {
			Some(std::path::PathBuf::from(e))
		} else {
			std::env::var("HOME").map(|h| std::path::PathBuf::from(h).join(".config")).ok()
		};

		path.map(|p| p.join("watchmap").join(CONFIG_FILE_NAME))
	}

	/// Reads the config from the default location.
	///
	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when the file is missing or unreadable.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when the file is malformed.
	pub fn load_from_disk() -> crate::Result<Self> {
		let path = Self::config_file_path().ok_or_else(|| {
			std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory available")
		})?;
		Self::load_from_file(path)
	}

	pub fn load_from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		log::debug!("Reading config from {}", path.as_ref().display());
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}

	/// Writes the config to the default location, creating the directory if needed.
	pub fn save_to_disk(&self) -> crate::Result<()> {
		let path = Self::config_file_path().ok_or_else(|| {
			std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory available")
		})?;
		self.save_to_file(path)
	}

	pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		log::debug!("Saved config to {}", path.display());
		Ok(())
	}

	pub fn data_dir(&self) -> &std::path::PathBuf {
		&self.data_dir
	}
	/// Unlike the other directories this one may not exist yet, it is created on first save.
	pub fn set_data_dir(&mut self, data_dir: std::path::PathBuf) {
		self.data_dir = data_dir;
	}

	pub fn image_dir(&self) -> &std::path::PathBuf {
		&self.image_dir
	}
	/// returns if the directory is valid or not.
	pub fn set_image_dir(&mut self, image_dir: std::path::PathBuf) -> bool {
		if image_dir.is_dir() {
			self.image_dir = image_dir;
			true
		} else {
			false
		}
	}

	pub fn catalog_path(&self) -> Option<&std::path::PathBuf> {
		self.catalog_path.as_ref()
	}
	/// returns if the file exists or not.
	pub fn set_catalog_path(&mut self, catalog_path: std::path::PathBuf) -> bool {
		if catalog_path.is_file() {
			self.catalog_path = Some(catalog_path);
			true
		} else {
			false
		}
	}

	pub fn storage_key(&self) -> &str {
		&self.storage_key
	}
	pub fn set_storage_key(&mut self, storage_key: impl Into<String>) {
		self.storage_key = storage_key.into();
	}

	pub fn layout(&self) -> &LayoutMetrics {
		&self.layout
	}
	pub fn set_layout(&mut self, layout: LayoutMetrics) {
		self.layout = layout;
	}
}
