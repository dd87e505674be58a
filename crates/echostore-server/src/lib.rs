//! # echostore-server
//!
//! Runtime for the echostore daemon: a TCP service that frames client bytes
//! into newline-terminated packets, appends each packet to a shared record
//! store (plain file or record device) and echoes the store's readable
//! content back after every packet. An embedded `AESDCHAR_IOCSEEKTO:n,m`
//! command repositions the device read cursor instead of appending.
//!
//! Concurrency model: one OS thread per connection, every store operation
//! serialized by one process-wide lock, signal-driven graceful drain.
//!
//! ## Modules
//!
//! - `config` - Defaults + environment overrides
//! - `daemon` - Background-execution mode
//! - `error` - Error types
//! - `gateway` - Serialized store access
//! - `listener` - Listening socket and accept loop
//! - `registry` - Worker bookkeeping (spawn/reap/drain)
//! - `server` - Main loop glue
//! - `shutdown` - Signal-driven shutdown coordination
//! - `store` - File and device store backends
//! - `timestamp` - Periodic timestamp injection
//! - `worker` - Per-connection worker

pub mod config;
pub mod daemon;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod timestamp;
pub mod worker;

// Re-exports for convenience
pub use config::{BackingMode, ServerConfig};
pub use error::{ServerError, ServerResult, StoreError};
pub use gateway::StoreGateway;
pub use listener::{AcceptOutcome, Listener};
pub use registry::{WorkerRecord, WorkerRegistry};
pub use store::{DeviceStore, FileStore, RecordStore};
pub use timestamp::TimestampInjector;
pub use worker::{ConnectionWorker, WorkerOutcome};
