//! Main accept loop
//!
//! Single-threaded driver: block in accept, hand each connection to a fresh
//! worker thread, reap finished workers once per iteration. A termination
//! signal flips the shutdown flag and forces the listener closed; the loop
//! then stops accepting and drains every in-flight worker before returning.

use std::fs;

use log::{info, warn};

use crate::config::{BackingMode, ServerConfig};
use crate::daemon;
use crate::error::{ServerError, ServerResult};
use crate::gateway::StoreGateway;
use crate::listener::{AcceptOutcome, Listener};
use crate::registry::WorkerRegistry;
use crate::shutdown;
use crate::store::{DeviceStore, FileStore, RecordStore};
use crate::timestamp::TimestampInjector;
use crate::worker::ConnectionWorker;

/// Run the service until a termination request.
///
/// Returns `Ok(())` after a clean signal-driven drain; any `Err` is a setup
/// failure and maps to a non-zero exit status.
pub fn run(config: &ServerConfig) -> ServerResult<()> {
    shutdown::install()?;

    let listener = Listener::start(config.port, config.backlog)?;
    info!("listening on 0.0.0.0:{}", config.port);

    // After bind, so setup errors surface on the console first.
    if config.daemonize {
        daemon::daemonize()?;
    }

    let gateway = StoreGateway::new();

    // File mode shares one handle process-wide; device mode opens per
    // connection inside the loop.
    let shared_file = match config.backing {
        BackingMode::File => Some(
            FileStore::create(&config.data_path)
                .map_err(|e| ServerError::setup("data file", e))?,
        ),
        BackingMode::Device => None,
    };

    let injector = shared_file.as_ref().and_then(|store| {
        match TimestampInjector::arm(config.timestamp_interval, store.clone(), gateway.clone()) {
            Ok(inj) => Some(inj),
            Err(e) => {
                warn!("timestamp injector unavailable: {}", e);
                None
            }
        }
    });

    shutdown::register_listener(listener.raw_fd());

    let mut registry = WorkerRegistry::new();
    while !shutdown::requested() {
        match listener.accept_next() {
            AcceptOutcome::Connection(stream, peer) => {
                info!("Accepted connection from {}", peer);

                let store: Box<dyn RecordStore + Send> = match &shared_file {
                    Some(file) => Box::new(file.clone()),
                    None => match DeviceStore::open(&config.device_path) {
                        Ok(dev) => Box::new(dev),
                        Err(e) => {
                            warn!(
                                "cannot open {} for {}: {}; dropping connection",
                                config.device_path.display(),
                                peer,
                                e
                            );
                            continue;
                        }
                    },
                };

                match ConnectionWorker::spawn(stream, peer, store, gateway.clone()) {
                    Ok(record) => registry.register(record),
                    Err(e) => warn!("failed to spawn worker: {}", e),
                }
            }
            AcceptOutcome::Interrupted => break,
            AcceptOutcome::Retry(e) => warn!("accept failed: {}", e),
        }

        registry.reap_completed();
    }

    info!(
        "termination requested; draining {} connection(s)",
        registry.len()
    );
    if let Some(injector) = injector {
        injector.disarm();
    }
    registry.drain_all();

    shutdown::clear_listener();
    drop(listener);

    if config.backing == BackingMode::File {
        if let Err(e) = fs::remove_file(&config.data_path) {
            warn!("could not remove {}: {}", config.data_path.display(), e);
        }
    }

    info!("clean shutdown");
    Ok(())
}
