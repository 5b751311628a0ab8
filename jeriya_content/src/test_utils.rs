use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
};

use jeriya_shared::{
    crossbeam_channel::{Receiver, Sender},
    parking_lot::Mutex,
};

use crate::{AssetKey, AssetStatus, AsyncAsset, Error, Result};

/// Phase call recorded in a [`Journal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Finalize(String),
}

/// Records the order in which the phases of several [`TestAsset`]s were called.
pub type Journal = Arc<Mutex<Vec<Call>>>;

/// Where and how often the phases of a [`TestAsset`] ran.
#[derive(Debug, Default)]
struct Calls {
    load_threads: Vec<(ThreadId, Option<String>)>,
    finalize_threads: Vec<ThreadId>,
}

/// Asset that records every call and can be configured to fail, panic or block.
pub struct TestAsset {
    key: AssetKey,
    status: AssetStatus,
    fail_load: bool,
    panic_load: bool,
    fail_finalize: bool,
    load_started: Option<Sender<()>>,
    load_gate: Option<Receiver<()>>,
    journal: Option<Journal>,
    on_finalize: Option<Box<dyn Fn() + Send + Sync>>,
    load_count: AtomicUsize,
    finalize_count: AtomicUsize,
    calls: Mutex<Calls>,
}

impl TestAsset {
    pub fn new(key: &str) -> Self {
        Self {
            key: AssetKey::new(key),
            status: AssetStatus::new(),
            fail_load: false,
            panic_load: false,
            fail_finalize: false,
            load_started: None,
            load_gate: None,
            journal: None,
            on_finalize: None,
            load_count: AtomicUsize::new(0),
            finalize_count: AtomicUsize::new(0),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn panicking_load(mut self) -> Self {
        self.panic_load = true;
        self
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    /// `load` sends a message to `load_started` and then blocks until it receives a message
    /// from `load_gate` or the sender of the gate is dropped.
    pub fn gated(mut self, load_started: Sender<()>, load_gate: Receiver<()>) -> Self {
        self.load_started = Some(load_started);
        self.load_gate = Some(load_gate);
        self
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Runs `f` every time the asset is finalized.
    pub fn on_finalize(mut self, f: Box<dyn Fn() + Send + Sync>) -> Self {
        self.on_finalize = Some(f);
        self
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn finalize_count(&self) -> usize {
        self.finalize_count.load(Ordering::SeqCst)
    }

    pub fn load_threads(&self) -> Vec<ThreadId> {
        self.calls.lock().load_threads.iter().map(|(id, _)| *id).collect()
    }

    pub fn load_thread_names(&self) -> Vec<Option<String>> {
        self.calls.lock().load_threads.iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn finalize_threads(&self) -> Vec<ThreadId> {
        self.calls.lock().finalize_threads.clone()
    }
}

impl AsyncAsset for TestAsset {
    fn key(&self) -> &AssetKey {
        &self.key
    }

    fn status(&self) -> &AssetStatus {
        &self.status
    }

    fn load(&self) -> Result<()> {
        let current = thread::current();
        self.calls
            .lock()
            .load_threads
            .push((current.id(), current.name().map(str::to_owned)));
        if let Some(journal) = &self.journal {
            journal.lock().push(Call::Load(self.key.as_str().into_owned()));
        }
        self.load_count.fetch_add(1, Ordering::SeqCst);

        if let Some(load_started) = &self.load_started {
            let _ = load_started.send(());
        }
        if let Some(load_gate) = &self.load_gate {
            let _ = load_gate.recv();
        }

        if self.panic_load {
            panic!("{} panics on purpose", self.key);
        }
        if self.fail_load {
            return Err(Error::InvalidAssetData(self.key.as_path().to_owned()));
        }
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        self.calls.lock().finalize_threads.push(thread::current().id());
        if let Some(journal) = &self.journal {
            journal.lock().push(Call::Finalize(self.key.as_str().into_owned()));
        }
        self.finalize_count.fetch_add(1, Ordering::SeqCst);
        if let Some(on_finalize) = &self.on_finalize {
            on_finalize();
        }

        if self.fail_finalize {
            return Err(Error::Other(format!("{} fails to finalize on purpose", self.key).into()));
        }
        Ok(())
    }
}
