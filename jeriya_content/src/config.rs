use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the [`AsyncLoader`](crate::AsyncLoader)
///
/// Every field is optional when the configuration is read from YAML.
///
/// ```yaml
/// thread_name: "texture loader"
/// stack_size: 4194304
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncLoaderConfig {
    /// Name of the worker thread as it shows up in debuggers and profilers
    pub thread_name: String,
    /// Stack size of the worker thread in bytes. The platform default is used when `None`.
    pub stack_size: Option<usize>,
}

impl Default for AsyncLoaderConfig {
    fn default() -> Self {
        Self {
            thread_name: "jeriya loader thread".to_owned(),
            stack_size: None,
        }
    }
}

impl AsyncLoaderConfig {
    /// Parses the configuration from a YAML string.
    ///
    /// # Example
    ///
    /// ```
    /// use jeriya_content::AsyncLoaderConfig;
    /// let config = AsyncLoaderConfig::from_yaml("thread_name: texture loader").unwrap();
    /// assert_eq!(config.thread_name, "texture loader");
    /// assert_eq!(config.stack_size, None);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Checks that a worker thread can be spawned with this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.thread_name.is_empty() {
            return Err(Error::InvalidConfig("the thread name must not be empty".to_owned()));
        }
        if self.thread_name.contains('\0') {
            return Err(Error::InvalidConfig(format!(
                "the thread name '{}' must not contain NUL",
                self.thread_name.escape_debug()
            )));
        }
        if self.stack_size == Some(0) {
            return Err(Error::InvalidConfig("the stack size must not be zero".to_owned()));
        }
        Ok(())
    }
}
