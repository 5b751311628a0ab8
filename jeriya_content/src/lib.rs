//! # Overview
//!
//! Crate for loading assets in the background without blocking the main thread.
//!
//! Loading an asset is split into two phases. The [`AsyncLoader`] runs the *load*
//! phase (e.g. reading and decoding a file) on a single worker thread. The
//! *finalize* phase (e.g. uploading the decoded data to the GPU) runs on the thread
//! that calls [`AsyncLoader::drain_and_finalize`], which is usually the thread that
//! owns the graphics context and calls it once per frame.
//!
//! ```text
//! submit ──▶ JobQueue ──▶ worker thread: load ──▶ DoneQueue ──▶ drain_and_finalize: finalize
//! ```
//!
//! # Components
//!
//! * [`AsyncAsset`] is the contract that every loadable asset implements. The caller
//!   owns the asset and keeps an `Arc` to inspect it after it was finalized.
//! * [`AssetStatus`] records the [`LoadState`] and whether the phases succeeded.
//! * [`AsyncLoader`] owns the queues and the worker thread.
//! * [`FileAsset`] is an [`AsyncAsset`] for the common case of decoding a single file.

mod async_loader;
mod asset;
mod common;
mod config;
mod file_asset;
mod queue;
mod worker;

#[cfg(test)]
mod test_utils;

pub use asset::*;
pub use async_loader::*;
pub use common::{AssetKey, Error, Result};
pub use config::*;
pub use file_asset::*;
pub use worker::WorkerState;
