use std::sync::{Arc, PoisonError, RwLock};

use crate::config::Config;
use crate::error::ConfigError;

/// Holds the currently installed configuration.
///
/// The configuration is swapped as a whole and never edited in place, so a
/// reader always gets either the old or the new document in full. Readers
/// only hold the lock long enough to clone the `Arc`.
#[derive(Debug, Default)]
pub struct ConfigStore {
	current: RwLock<Option<Arc<Config>>>,
}

impl ConfigStore {
	/// Create an empty store with no configuration installed.
	pub fn new() -> Self {
		Self::default()
	}

	/// Install a new configuration, replacing whatever was there.
	pub fn replace(&self, config: Config) -> Arc<Config> {
		let config = Arc::new(config);
		// The guarded value is a single pointer, so a poisoned lock still holds a whole config
		let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
		*guard = Some(Arc::clone(&config));
		config
	}

	/// Current configuration, or None while nothing has been loaded.
	pub fn snapshot(&self) -> Option<Arc<Config>> {
		let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
		guard.clone()
	}

	/// Parse a config file and install it.
	///
	/// On error the previously installed configuration (if any) is kept.
	pub fn load_file(&self, path: &str) -> Result<Arc<Config>, ConfigError> {
		let config = Config::from_file(path)?;
		Ok(self.replace(config))
	}
}
