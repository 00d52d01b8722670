//! In-memory collaborators for controller and session tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, watch};

use crate::collaborators::{AudioEngine, Cancelled, EngineHandle, FileFilter, FileSelector, ShareService};
use crate::error::{EngineError, LoadError, ShareError, TransportOp};
use crate::file_ref::FileRef;

#[derive(Default)]
struct EngineLog {
    created: Vec<FileRef>,
    released: Vec<FileRef>,
    calls: Vec<(FileRef, TransportOp)>,
    live: usize,
    failing_files: HashSet<String>,
    failing_ops: HashSet<TransportOp>,
}

#[derive(Clone, Default)]
pub struct MockEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl MockEngine {
    pub fn fail_create(&self, file: &str) {
        self.log.lock().unwrap().failing_files.insert(file.to_string());
    }

    pub fn fail_op(&self, op: TransportOp) {
        self.log.lock().unwrap().failing_ops.insert(op);
    }

    pub fn clear_failures(&self) {
        let mut log = self.log.lock().unwrap();
        log.failing_files.clear();
        log.failing_ops.clear();
    }

    pub fn created(&self) -> Vec<FileRef> {
        self.log.lock().unwrap().created.clone()
    }

    pub fn released(&self) -> Vec<FileRef> {
        self.log.lock().unwrap().released.clone()
    }

    pub fn calls(&self) -> Vec<(FileRef, TransportOp)> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn live_handles(&self) -> usize {
        self.log.lock().unwrap().live
    }
}

impl AudioEngine for MockEngine {
    type Handle = MockHandle;

    async fn create(&self, file: &FileRef) -> Result<MockHandle, LoadError> {
        let mut log = self.log.lock().unwrap();
        if log.failing_files.contains(file.as_str()) {
            return Err(LoadError::new(file.clone(), anyhow::anyhow!("unsupported format")));
        }
        log.created.push(file.clone());
        log.live += 1;
        Ok(MockHandle {
            file: file.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

pub struct MockHandle {
    file: FileRef,
    log: Arc<Mutex<EngineLog>>,
}

impl MockHandle {
    fn call(&self, op: TransportOp) -> Result<(), EngineError> {
        let mut log = self.log.lock().unwrap();
        if log.failing_ops.contains(&op) {
            return Err(EngineError::new(op, anyhow::anyhow!("platform call failed")));
        }
        log.calls.push((self.file.clone(), op));
        Ok(())
    }
}

impl EngineHandle for MockHandle {
    async fn play(&mut self) -> Result<(), EngineError> {
        self.call(TransportOp::Play)
    }

    async fn pause(&mut self) -> Result<(), EngineError> {
        self.call(TransportOp::Pause)
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.call(TransportOp::Stop)
    }

    async fn release(self) -> Result<(), EngineError> {
        let mut log = self.log.lock().unwrap();
        if log.failing_ops.contains(&TransportOp::Release) {
            return Err(EngineError::new(
                TransportOp::Release,
                anyhow::anyhow!("platform call failed"),
            ));
        }
        log.released.push(self.file.clone());
        Ok(())
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.log.lock().unwrap().live -= 1;
    }
}

/// Hands out queued picks in order; an empty queue behaves like a dismissed picker.
#[derive(Default)]
pub struct MockSelector {
    picks: Mutex<VecDeque<Result<FileRef, Cancelled>>>,
    calls: Mutex<usize>,
    gate: Option<Gate>,
}

/// Holds a pick open until the test lets it through.
pub struct Gate {
    pub entered: watch::Sender<bool>,
    pub open: Arc<Notify>,
}

impl MockSelector {
    pub fn with_picks<I>(picks: I) -> Self
    where
        I: IntoIterator<Item = Result<FileRef, Cancelled>>,
    {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(&self, pick: Result<FileRef, Cancelled>) {
        self.picks.lock().unwrap().push_back(pick);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl FileSelector for MockSelector {
    async fn select(&self, filter: FileFilter) -> Result<FileRef, Cancelled> {
        assert_eq!(filter, FileFilter::Audio);
        *self.calls.lock().unwrap() += 1;
        if let Some(gate) = &self.gate {
            gate.entered.send_replace(true);
            gate.open.notified().await;
        }
        self.picks.lock().unwrap().pop_front().unwrap_or(Err(Cancelled))
    }
}

#[derive(Default)]
pub struct MockShare {
    shared: Mutex<Vec<FileRef>>,
    fail: Mutex<bool>,
}

impl MockShare {
    pub fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            ..Self::default()
        }
    }

    pub fn shared(&self) -> Vec<FileRef> {
        self.shared.lock().unwrap().clone()
    }
}

impl ShareService for MockShare {
    async fn share(&self, file: &FileRef) -> Result<(), ShareError> {
        if *self.fail.lock().unwrap() {
            return Err(ShareError::new(file.clone(), anyhow::anyhow!("share sheet dismissed")));
        }
        self.shared.lock().unwrap().push(file.clone());
        Ok(())
    }
}
