//! Per-connection worker
//!
//! One OS thread per accepted connection, unbounded. The design is
//! explicitly thread-per-connection with no pool and no cap.
//!
//! # State machine
//!
//! `Reading → {packet → Applying → Echoing → Reading} | Disconnected | Failed`
//!
//! Applying dispatches on the packet: a well-formed seek command against a
//! seekable store becomes a cursor reposition; everything else, including
//! seek-looking text that fails to parse, is appended as raw payload. A
//! malformed command is never a reason to drop the connection.
//!
//! Any I/O failure ends the worker with [`WorkerOutcome::Failed`]; a clean
//! peer disconnect ends it with [`WorkerOutcome::Clean`]. The outcome
//! travels through the `JoinHandle` to the registry.

use std::io::{self, Read};
use std::net::TcpStream;
use std::thread;

use log::{debug, warn};

use echostore_core::{PacketAssembler, SeekCommand};

use crate::error::StoreError;
use crate::gateway::StoreGateway;
use crate::registry::WorkerRecord;
use crate::store::RecordStore;

/// Bytes pulled from the socket per read.
const READ_CHUNK: usize = 512;

/// How a worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Peer disconnected cleanly.
    Clean,

    /// A read, store or echo operation failed; the connection was dropped.
    Failed,
}

pub struct ConnectionWorker {
    stream: TcpStream,
    peer: String,
    store: Box<dyn RecordStore + Send>,
    gateway: StoreGateway,
}

impl ConnectionWorker {
    /// Spawn the worker thread for one accepted connection.
    ///
    /// `store` is the worker's store handle: a clone of the shared file
    /// handle in file mode, a privately opened device handle in device
    /// mode. Dropping the worker closes both the socket and the handle.
    pub fn spawn(
        stream: TcpStream,
        peer: String,
        store: Box<dyn RecordStore + Send>,
        gateway: StoreGateway,
    ) -> io::Result<WorkerRecord> {
        let worker = Self {
            stream,
            peer: peer.clone(),
            store,
            gateway,
        };

        let handle = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || worker.run())?;

        Ok(WorkerRecord::new(peer, handle))
    }

    fn run(mut self) -> WorkerOutcome {
        let mut assembler = PacketAssembler::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) => {
                    warn!("read from {} failed: {}", self.peer, e);
                    return WorkerOutcome::Failed;
                }
            };
            if n == 0 {
                debug!("{} disconnected", self.peer);
                return WorkerOutcome::Clean;
            }

            let Some(packet) = assembler.feed(&chunk[..n]) else {
                continue;
            };
            debug!("{}-byte packet from {}", packet.len(), self.peer);

            if let Err(e) = self.apply(&packet) {
                warn!("applying packet from {} failed: {}", self.peer, e);
                return WorkerOutcome::Failed;
            }
            if let Err(e) = self.echo() {
                warn!("echo to {} failed: {}", self.peer, e);
                return WorkerOutcome::Failed;
            }
        }
    }

    /// Seek command or raw payload: decide and execute under the gateway.
    fn apply(&mut self, packet: &[u8]) -> Result<(), StoreError> {
        if self.store.supports_seek() && SeekCommand::recognize(packet) {
            match SeekCommand::parse(packet) {
                Ok(cmd) => {
                    debug!(
                        "repositioning to record {} offset {} for {}",
                        cmd.record, cmd.offset, self.peer
                    );
                    return self.gateway.reposition(self.store.as_mut(), cmd);
                }
                Err(e) => {
                    // Not a protocol error: the packet is stored literally.
                    debug!("{} from {}; storing as payload", e, self.peer);
                }
            }
        }
        self.gateway.append(self.store.as_mut(), packet)
    }

    fn echo(&mut self) -> Result<(), StoreError> {
        self.gateway
            .snapshot_send_to(self.store.as_mut(), &mut self.stream)
    }
}
