//! Background-execution mode
//!
//! Daemonization happens *after* the socket is bound so setup errors still
//! reach the console: fork, parent exits 0, child starts a new session,
//! moves to `/` and points stdio at `/dev/null`.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::process;

use nix::unistd::{chdir, dup2, fork, setsid, ForkResult};

use crate::error::ServerError;

/// Detach from the controlling terminal. Returns only in the child.
pub fn daemonize() -> Result<(), ServerError> {
    match unsafe { fork() }.map_err(|e| ServerError::setup("fork", io::Error::from(e)))? {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => {}
    }

    setsid().map_err(|e| ServerError::setup("setsid", io::Error::from(e)))?;
    chdir("/").map_err(|e| ServerError::setup("chdir", io::Error::from(e)))?;

    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|e| ServerError::setup("open /dev/null", e))?;

    for target in 0..=2 {
        dup2(null.as_raw_fd(), target)
            .map_err(|e| ServerError::setup("dup2", io::Error::from(e)))?;
    }

    Ok(())
}
