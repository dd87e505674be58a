//! Record store backends
//!
//! The backing resource is either a plain file or a record-oriented char
//! device. Both expose the same three operations (append, cursor seek,
//! snapshot stream) behind [`RecordStore`], so the worker and the injector
//! never care which one they hold.
//!
//! # Handles
//!
//! - File mode: one process-wide handle (`Arc<File>`), cloned into every
//!   worker and the timestamp injector. Created truncated at startup,
//!   removed by the main loop at exit.
//! - Device mode: each worker opens its own handle, because the device's
//!   read cursor is per-open-file and a seek must only move the cursor of
//!   the connection that asked for it.
//!
//! Serialization of operations is NOT done here; the process-wide lock
//! lives in [`gateway`](crate::gateway).

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::sync::Arc;

use echostore_core::protocol::DELIMITER;
use echostore_core::SeekCommand;

use crate::error::StoreError;

/// Bytes moved per snapshot read.
const SNAPSHOT_CHUNK: usize = 512;

/// A durable append-only record store.
pub trait RecordStore: Send {
    /// Append raw packet bytes. A short write is an error.
    fn append(&mut self, data: &[u8]) -> Result<(), StoreError>;

    /// Move the read cursor to `offset` bytes into stored record `record`.
    fn seek_to(&mut self, cmd: SeekCommand) -> Result<(), StoreError>;

    /// Stream the readable content to `sink` in bounded chunks until
    /// end-of-data.
    fn stream_to(&mut self, sink: &mut dyn Write) -> Result<(), StoreError>;

    /// Whether `seek_to` is meaningful for this backend.
    fn supports_seek(&self) -> bool;
}

// ── File backend ──────────────────────────────────────────────────

/// Plain-file backend: the full accumulated history, echoed from byte 0.
#[derive(Debug, Clone)]
pub struct FileStore {
    file: Arc<File>,
}

impl FileStore {
    /// Create the backing file, truncated, in append mode.
    pub fn create(path: &Path) -> io::Result<Self> {
        // OpenOptions rejects `append` + `truncate` together, so truncate
        // explicitly after opening.
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        file.set_len(0)?;
        Ok(Self { file: Arc::new(file) })
    }
}

impl RecordStore for FileStore {
    fn append(&mut self, data: &[u8]) -> Result<(), StoreError> {
        (&*self.file).write_all(data).map_err(StoreError::Write)
    }

    fn seek_to(&mut self, _cmd: SeekCommand) -> Result<(), StoreError> {
        Err(StoreError::SeekUnsupported)
    }

    fn stream_to(&mut self, sink: &mut dyn Write) -> Result<(), StoreError> {
        let mut buf = [0u8; SNAPSHOT_CHUNK];
        let mut off: u64 = 0;
        let mut last_sent: Option<u8> = None;

        loop {
            let n = self.file.read_at(&mut buf, off).map_err(StoreError::Read)?;
            if n == 0 {
                break;
            }
            sink.write_all(&buf[..n]).map_err(StoreError::Write)?;
            last_sent = Some(buf[n - 1]);
            off += n as u64;
        }

        // Every file-mode echo is self-terminated.
        if last_sent != Some(DELIMITER) {
            sink.write_all(&[DELIMITER]).map_err(StoreError::Write)?;
        }
        Ok(())
    }

    fn supports_seek(&self) -> bool {
        false
    }
}

// ── Device backend ────────────────────────────────────────────────

/// Argument block for the device's seek-to-record control op.
#[repr(C)]
pub struct RecordSeek {
    pub record: u32,
    pub offset: u32,
}

// _IOWR(0x16, 1, struct RecordSeek): the driver's cursor-seek request.
nix::ioctl_readwrite!(record_seek_to, 0x16, 1, RecordSeek);

/// Record-device backend: reads start at the handle's current cursor, and
/// the cursor is movable with [`RecordStore::seek_to`]. Opened once per
/// connection.
#[derive(Debug)]
pub struct DeviceStore {
    file: File,
}

impl DeviceStore {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }
}

impl RecordStore for DeviceStore {
    fn append(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(data).map_err(StoreError::Write)
    }

    fn seek_to(&mut self, cmd: SeekCommand) -> Result<(), StoreError> {
        let mut arg = RecordSeek {
            record: cmd.record,
            offset: cmd.offset,
        };
        unsafe { record_seek_to(self.file.as_raw_fd(), &mut arg) }
            .map_err(|e| StoreError::Seek(io::Error::from(e)))?;
        Ok(())
    }

    fn stream_to(&mut self, sink: &mut dyn Write) -> Result<(), StoreError> {
        // From the current cursor; no trailing-delimiter guarantee here,
        // the device owns its record framing.
        let mut buf = [0u8; SNAPSHOT_CHUNK];
        loop {
            let n = self.file.read(&mut buf).map_err(StoreError::Read)?;
            if n == 0 {
                return Ok(());
            }
            sink.write_all(&buf[..n]).map_err(StoreError::Write)?;
        }
    }

    fn supports_seek(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_append_then_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        let mut store = FileStore::create(&path).unwrap();

        store.append(b"hello\n").unwrap();
        store.append(b"world\n").unwrap();

        let mut out = Vec::new();
        store.stream_to(&mut out).unwrap();
        assert_eq!(out, b"hello\nworld\n");
    }

    #[test]
    fn test_file_store_snapshot_is_always_full_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        let mut store = FileStore::create(&path).unwrap();

        store.append(b"one\n").unwrap();
        let mut first = Vec::new();
        store.stream_to(&mut first).unwrap();

        store.append(b"two\n").unwrap();
        let mut second = Vec::new();
        store.stream_to(&mut second).unwrap();

        assert_eq!(first, b"one\n");
        assert_eq!(second, b"one\ntwo\n");
    }

    #[test]
    fn test_file_store_terminates_unterminated_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        let mut store = FileStore::create(&path).unwrap();

        store.append(b"no delimiter").unwrap();

        let mut out = Vec::new();
        store.stream_to(&mut out).unwrap();
        assert_eq!(out, b"no delimiter\n");
    }

    #[test]
    fn test_file_store_empty_snapshot_is_delimiter_terminated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        let mut store = FileStore::create(&path).unwrap();

        let mut out = Vec::new();
        store.stream_to(&mut out).unwrap();
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_file_store_create_truncates_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        std::fs::write(&path, b"stale content\n").unwrap();

        let mut store = FileStore::create(&path).unwrap();
        let mut out = Vec::new();
        store.stream_to(&mut out).unwrap();
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_file_store_rejects_seek() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::create(&dir.path().join("s")).unwrap();
        assert!(!store.supports_seek());
        assert!(matches!(
            store.seek_to(SeekCommand { record: 0, offset: 0 }),
            Err(StoreError::SeekUnsupported)
        ));
    }

    #[test]
    fn test_record_seek_layout_matches_driver_contract() {
        // Two packed u32s, nothing else.
        assert_eq!(std::mem::size_of::<RecordSeek>(), 8);
    }
}
