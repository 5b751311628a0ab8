use jeriya_shared::parking_lot::Mutex;

use crate::{AssetKey, Result};

/// Phase of an asset in the two-phase load/finalize protocol of the [`AsyncLoader`](crate::AsyncLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The asset was submitted but the worker thread hasn't loaded it yet.
    Pending,
    /// The worker thread ran [`AsyncAsset::load`] and the asset waits for [`AsyncAsset::finalize`].
    Loaded,
    /// Both phases ran and succeeded.
    Finalized,
    /// Both phases ran and at least one of them failed.
    Failed,
}

#[derive(Debug)]
struct StatusInner {
    state: LoadState,
    load_valid: bool,
    finalize_valid: bool,
}

/// Progress and validity of an asset.
///
/// Implementors of [`AsyncAsset`] embed an `AssetStatus` and return it from [`AsyncAsset::status`].
/// Only the [`AsyncLoader`](crate::AsyncLoader) writes to it. The result of the load phase can be
/// inspected independently of the result of the finalize phase.
#[derive(Debug)]
pub struct AssetStatus {
    inner: Mutex<StatusInner>,
}

impl AssetStatus {
    /// Creates a new `AssetStatus` in the [`LoadState::Pending`] state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                state: LoadState::Pending,
                load_valid: true,
                finalize_valid: true,
            }),
        }
    }

    pub fn state(&self) -> LoadState {
        self.inner.lock().state
    }

    /// Returns `false` when [`AsyncAsset::load`] failed.
    pub fn is_load_valid(&self) -> bool {
        self.inner.lock().load_valid
    }

    /// Returns `false` when [`AsyncAsset::finalize`] failed.
    pub fn is_finalize_valid(&self) -> bool {
        self.inner.lock().finalize_valid
    }

    /// Returns `true` when none of the phases that already ran has failed.
    pub fn is_valid(&self) -> bool {
        let inner = self.inner.lock();
        inner.load_valid && inner.finalize_valid
    }

    pub(crate) fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = LoadState::Pending;
        inner.load_valid = true;
        inner.finalize_valid = true;
    }

    pub(crate) fn set_loaded(&self, load_valid: bool) {
        let mut inner = self.inner.lock();
        inner.state = LoadState::Loaded;
        inner.load_valid = load_valid;
    }

    pub(crate) fn set_finalized(&self, finalize_valid: bool) {
        let mut inner = self.inner.lock();
        inner.finalize_valid = finalize_valid;
        inner.state = if inner.load_valid && finalize_valid {
            LoadState::Finalized
        } else {
            LoadState::Failed
        };
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// A resource that is loaded in two phases by the [`AsyncLoader`](crate::AsyncLoader).
///
/// [`AsyncAsset::load`] runs on the worker thread and may block on I/O. [`AsyncAsset::finalize`]
/// runs on the thread that calls [`AsyncLoader::drain_and_finalize`](crate::AsyncLoader::drain_and_finalize)
/// which is usually the thread owning the graphics context. Neither of them is called while the
/// loader holds a lock, so both are free to take as long as they need.
///
/// Errors returned from the phases are not propagated. They are logged and recorded in the
/// [`AssetStatus`] which the caller inspects after the asset was finalized.
pub trait AsyncAsset: Send + Sync {
    /// Identifier used in log messages.
    fn key(&self) -> &AssetKey;

    /// Status that the loader updates while the asset moves through the phases.
    fn status(&self) -> &AssetStatus;

    /// Loads the asset. Called on the worker thread.
    fn load(&self) -> Result<()>;

    /// Finishes the asset on the owning thread, e.g. by uploading the loaded data to the GPU.
    ///
    /// This is called exactly once after every [`AsyncAsset::load`], even when the load failed.
    fn finalize(&self) -> Result<()>;

    fn is_valid(&self) -> bool {
        self.status().is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_is_pending_and_valid() {
        let status = AssetStatus::new();
        assert_eq!(status.state(), LoadState::Pending);
        assert!(status.is_load_valid());
        assert!(status.is_finalize_valid());
        assert!(status.is_valid());
    }

    #[test]
    fn successful_phases() {
        let status = AssetStatus::new();
        status.set_loaded(true);
        assert_eq!(status.state(), LoadState::Loaded);
        status.set_finalized(true);
        assert_eq!(status.state(), LoadState::Finalized);
        assert!(status.is_valid());
    }

    #[test]
    fn failed_load_is_visible_after_successful_finalize() {
        let status = AssetStatus::new();
        status.set_loaded(false);
        status.set_finalized(true);
        assert_eq!(status.state(), LoadState::Failed);
        assert!(!status.is_load_valid());
        assert!(status.is_finalize_valid());
        assert!(!status.is_valid());
    }

    #[test]
    fn failed_finalize() {
        let status = AssetStatus::new();
        status.set_loaded(true);
        status.set_finalized(false);
        assert_eq!(status.state(), LoadState::Failed);
        assert!(status.is_load_valid());
        assert!(!status.is_valid());
    }

    #[test]
    fn reset() {
        let status = AssetStatus::new();
        status.set_loaded(false);
        status.set_finalized(false);
        status.reset();
        assert_eq!(status.state(), LoadState::Pending);
        assert!(status.is_valid());
    }
}
