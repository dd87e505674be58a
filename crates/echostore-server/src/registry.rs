//! Worker bookkeeping
//!
//! A plain `Vec` owned by the main loop: only one thread ever inserts or
//! removes, so there is nothing to synchronize. `reap_completed` runs once
//! per loop iteration and joins only workers whose thread has already
//! finished; it never blocks on a live connection. `drain_all` is the
//! shutdown path: it waits for every remaining worker, running or not.
//!
//! Sockets and private store handles are owned by the worker itself and
//! close when its thread returns, so a joined record has always released
//! its resources exactly once.

use std::thread::JoinHandle;

use log::{error, info, warn};

use crate::worker::WorkerOutcome;

/// One spawned worker: its peer label and the handle to join it by.
pub struct WorkerRecord {
    peer: String,
    handle: JoinHandle<WorkerOutcome>,
}

impl WorkerRecord {
    pub(crate) fn new(peer: String, handle: JoinHandle<WorkerOutcome>) -> Self {
        Self { peer, handle }
    }

    fn join_and_log(self) {
        match self.handle.join() {
            Ok(WorkerOutcome::Clean) => {}
            Ok(WorkerOutcome::Failed) => {
                warn!("worker for {} exited after an I/O failure", self.peer)
            }
            Err(_) => error!("worker for {} panicked", self.peer),
        }
        info!("Closed connection from {}", self.peer);
    }
}

/// Tracks live workers pending join.
#[derive(Default)]
pub struct WorkerRegistry {
    records: Vec<WorkerRecord>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) insertion of a freshly spawned worker.
    pub fn register(&mut self, record: WorkerRecord) {
        self.records.push(record);
    }

    /// Workers still tracked (running or finished-but-unjoined).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Join and release every worker that has already finished.
    /// Returns how many were reaped.
    pub fn reap_completed(&mut self) -> usize {
        let mut reaped = 0;
        let mut i = 0;
        while i < self.records.len() {
            if self.records[i].handle.is_finished() {
                self.records.swap_remove(i).join_and_log();
                reaped += 1;
            } else {
                i += 1;
            }
        }
        reaped
    }

    /// Block until every remaining worker has finished, then release all.
    pub fn drain_all(&mut self) {
        for record in self.records.drain(..) {
            record.join_and_log();
        }
    }
}
