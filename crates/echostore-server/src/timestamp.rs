//! Periodic timestamp injection
//!
//! File mode only: a dedicated thread appends a formatted timestamp record
//! through the gateway at a fixed interval, under the same lock discipline
//! as ordinary packets. The thread sleeps in short slices so a disarm is
//! answered promptly instead of after a full interval.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, error, warn};

use echostore_core::protocol::TIMESTAMP_PATTERN;

use crate::gateway::StoreGateway;
use crate::store::FileStore;

/// Maximum sleep per wakeup check.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Handle to the running injector thread.
pub struct TimestampInjector {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl TimestampInjector {
    /// Spawn the injector, firing every `interval`.
    pub fn arm(
        interval: Duration,
        store: FileStore,
        gateway: StoreGateway,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("store-timestamp".into())
            .spawn(move || injector_loop(interval, store, gateway, thread_stop))?;

        Ok(Self {
            handle: Some(handle),
            stop,
        })
    }

    /// Stop the injector and wait for its thread to exit.
    pub fn disarm(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("timestamp thread panicked");
            }
        }
    }
}

fn injector_loop(
    interval: Duration,
    mut store: FileStore,
    gateway: StoreGateway,
    stop: Arc<AtomicBool>,
) {
    let mut next_fire = Instant::now() + interval;

    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= next_fire {
            fire(&mut store, &gateway);
            next_fire += interval;
        }

        let sleep_for = next_fire
            .saturating_duration_since(Instant::now())
            .min(SLEEP_SLICE);
        if sleep_for > Duration::ZERO {
            thread::sleep(sleep_for);
        }
    }
}

/// Format the current time and append it. Failures are logged, never fatal.
fn fire(store: &mut FileStore, gateway: &StoreGateway) {
    let record = format!("timestamp:{}\n", Local::now().format(TIMESTAMP_PATTERN));
    match gateway.append(store, record.as_bytes()) {
        Ok(()) => debug!("timestamp appended"),
        Err(e) => warn!("timestamp append failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_injector_appends_delimited_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");
        let store = FileStore::create(&path).unwrap();
        let gateway = StoreGateway::new();

        let injector =
            TimestampInjector::arm(Duration::from_millis(40), store, gateway).unwrap();
        thread::sleep(Duration::from_millis(150));
        injector.disarm();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.split_terminator('\n').collect();
        assert!(lines.len() >= 2, "expected several fires, got {:?}", lines);
        for line in lines {
            assert!(line.starts_with("timestamp:"), "bad record: {}", line);
        }
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_disarm_is_prompt() {
        let dir = tempdir().unwrap();
        let store = FileStore::create(&dir.path().join("s")).unwrap();
        let injector =
            TimestampInjector::arm(Duration::from_secs(3600), store, StoreGateway::new())
                .unwrap();

        let start = Instant::now();
        injector.disarm();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
