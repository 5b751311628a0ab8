use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use jeriya_shared::{log::trace, parking_lot::Mutex};

use crate::{AssetKey, AssetStatus, AsyncAsset, Error, Result};

/// Decodes the content of a file. Runs on the worker thread.
pub type Importer<T> = dyn Fn(&[u8]) -> Result<T> + Send + Sync;

/// Finishes a decoded value on the thread that finalizes the assets, e.g. by uploading it to the GPU.
pub type Finalizer<T> = dyn Fn(&AssetKey, &T) -> Result<()> + Send + Sync;

/// [`AsyncAsset`] that reads a file and decodes it with an [`Importer`] on the worker thread.
///
/// The optional [`Finalizer`] runs when the asset is finalized.
///
/// # Example
///
/// ```
/// use jeriya_content::{AssetKey, AsyncAsset, FileAsset};
///
/// let shader = FileAsset::<String>::new(
///     "shaders/color.frag",
///     Box::new(|data: &[u8]| Ok(String::from_utf8_lossy(data).into_owned())),
/// )
/// .with_finalizer(Box::new(|_key: &AssetKey, _source: &String| {
///     // compile the shader on the thread that owns the graphics context
///     Ok(())
/// }));
/// assert_eq!(shader.key().as_str(), "shaders/color.frag");
/// assert!(shader.value().is_none());
/// ```
pub struct FileAsset<T> {
    key: AssetKey,
    path: PathBuf,
    status: AssetStatus,
    importer: Box<Importer<T>>,
    finalizer: Option<Box<Finalizer<T>>>,
    value: Mutex<Option<Arc<T>>>,
}

impl<T> FileAsset<T>
where
    T: 'static + Send + Sync,
{
    /// Creates a new `FileAsset` for the file at `path`. The path is also used as the [`AssetKey`].
    pub fn new(path: impl Into<PathBuf>, importer: Box<Importer<T>>) -> Self {
        let path = path.into();
        Self {
            key: AssetKey::new(path.clone()),
            path,
            status: AssetStatus::new(),
            importer,
            finalizer: None,
            value: Mutex::new(None),
        }
    }

    pub fn with_finalizer(mut self, finalizer: Box<Finalizer<T>>) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decoded value when the asset was loaded successfully.
    pub fn value(&self) -> Option<Arc<T>> {
        self.value.lock().clone()
    }

    /// Drops the decoded value, e.g. after the finalizer moved it to the GPU.
    pub fn drop_data(&self) {
        *self.value.lock() = None;
    }
}

impl<T> AsyncAsset for FileAsset<T>
where
    T: 'static + Send + Sync,
{
    fn key(&self) -> &AssetKey {
        &self.key
    }

    fn status(&self) -> &AssetStatus {
        &self.status
    }

    fn load(&self) -> Result<()> {
        // A failed reload must not leave the previous value behind for the finalizer.
        *self.value.lock() = None;

        trace!("Reading content of {}", self.key);
        let content = fs::read(&self.path)?;

        trace!("Decoding content of {}", self.key);
        let value = (self.importer)(&content)?;
        *self.value.lock() = Some(Arc::new(value));
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        let Some(value) = self.value() else {
            return Err(Error::NotLoaded(self.key.clone()));
        };
        if let Some(finalizer) = &self.finalizer {
            (finalizer)(&self.key, &value)?;
        }
        Ok(())
    }
}
