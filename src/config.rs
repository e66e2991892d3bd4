//! Runtime configuration lookup.
//!
//! The scheduler asks its [`ConfigSource`] for the sample rate on every tick, so a
//! source backed by something editable (a file, a parameter server) retunes the
//! loop without a restart.

/// Key holding the number of samples taken per second.
pub const UPDATES_PER_SECOND_KEY: &str = "updates-per-second";

#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration source unavailable")]
    Unavailable,
    #[error("configuration is malformed")]
    Malformed,
    #[error("configuration key missing")]
    Missing,
    #[error("configuration value is not a number")]
    NotANumber,
    #[error("configuration value {0} must be a positive, finite number")]
    NonPositive(f64),
    #[error("configuration value {0} gives a polling period too long to represent")]
    PeriodOutOfRange(f64),
}

pub trait ConfigSource {
    /// Returns the current value of `key`.
    fn get_float(&mut self, key: &str) -> Result<f64, ConfigError>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &mut T {
    fn get_float(&mut self, key: &str) -> Result<f64, ConfigError> {
        (**self).get_float(key)
    }
}

#[cfg(feature = "std")]
pub use self::file::JsonFileConfig;

#[cfg(feature = "std")]
mod file {
    use super::{ConfigError, ConfigSource};
    use log::warn;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// A JSON object on disk, re-read on every lookup.
    ///
    /// ```json
    /// { "updates-per-second": 10.0 }
    /// ```
    #[derive(Clone, Debug)]
    pub struct JsonFileConfig {
        path: PathBuf,
    }

    impl JsonFileConfig {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl ConfigSource for JsonFileConfig {
        fn get_float(&mut self, key: &str) -> Result<f64, ConfigError> {
            let contents = fs::read_to_string(&self.path).map_err(|e| {
                warn!("Could not read {}: {}", self.path.display(), e);
                ConfigError::Unavailable
            })?;

            let document: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
                warn!("Could not parse {}: {}", self.path.display(), e);
                ConfigError::Malformed
            })?;

            let object = document.as_object().ok_or(ConfigError::Malformed)?;
            object
                .get(key)
                .ok_or(ConfigError::Missing)?
                .as_f64()
                .ok_or(ConfigError::NotANumber)
        }
    }

}
