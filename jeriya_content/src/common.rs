use std::{
    borrow::Cow,
    fmt::{self, Formatter},
    io,
    path::{Path, PathBuf},
    result,
};

use jeriya_shared::thiserror;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to start the worker thread: {0}")]
    FailedToStartWorker(String),
    #[error("Failed to read the asset: {0}")]
    InvalidAssetData(PathBuf),
    #[error("Asset has not been loaded: {0}")]
    NotLoaded(AssetKey),
    #[error("Other: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Identifies an asset in log messages. It's usually the path of the file the asset is loaded from.
///
/// The loader doesn't use the key for deduplication. Two assets with the same key are two separate jobs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetKey(PathBuf);

impl AssetKey {
    /// Create a new [`AssetKey`] from a path. No validation is done on the path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jeriya_content::AssetKey;
    /// let asset_key = AssetKey::new("textures/character.png");
    /// assert_eq!(asset_key.as_str(), "textures/character.png");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the path of the asset.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::ffi::OsStr;
    /// use jeriya_content::AssetKey;
    /// let asset_key = AssetKey::new("sounds/explosion.wav");
    /// assert_eq!(asset_key.as_path().extension(), Some(OsStr::new("wav")));
    /// ```
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns the key as a string. Invalid unicode is replaced.
    pub fn as_str(&self) -> Cow<str> {
        self.0.to_string_lossy()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({})", self.as_str())
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for AssetKey {
    fn from(value: &Path) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for AssetKey {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

impl From<&AssetKey> for AssetKey {
    fn from(value: &AssetKey) -> Self {
        value.clone()
    }
}
