//! # echostore-core
//!
//! Protocol types for the echostore daemon.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Socket handling, storage backends and process control live in
//! `echostore-server`.
//!
//! ## Modules
//!
//! - `packet` - Delimiter-terminated packet assembly
//! - `command` - Embedded seek-command recognition and parsing

pub mod command;
pub mod packet;

// Re-exports for convenience
pub use command::{CommandError, SeekCommand};
pub use packet::PacketAssembler;

/// Wire-protocol constants
pub mod protocol {
    /// Byte that terminates a logical packet.
    pub const DELIMITER: u8 = b'\n';

    /// Prefix token that marks a packet as a seek command.
    pub const SEEK_PREFIX: &[u8] = b"AESDCHAR_IOCSEEKTO";

    /// Well-known listening port.
    pub const DEFAULT_PORT: u16 = 9000;

    /// strftime-style pattern for injected timestamp records.
    /// The full record on the wire is `timestamp:<formatted>\n`.
    pub const TIMESTAMP_PATTERN: &str = "%a, %d %b %Y %H:%M:%S %z";
}
