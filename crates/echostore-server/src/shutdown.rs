//! Signal-driven shutdown coordination
//!
//! SIGINT and SIGTERM request a graceful drain: stop accepting, let every
//! in-flight worker finish, then exit 0.
//!
//! The handler runs in signal context, so it is restricted to two
//! async-signal-safe actions: an atomic flag store and `shutdown(2)` on the
//! registered listener fd (which unblocks a pending `accept`). No
//! allocation, no locks, no logging.
//!
//! # Lifecycle
//!
//! 1. [`install`] once at startup (idempotent).
//! 2. [`register_listener`] after the listener is bound, so the handler has
//!    an fd to kick.
//! 3. [`clear_listener`] before the listener is dropped.
//!
//! The main loop polls [`requested`] every iteration.

use std::io;
use std::os::unix::io::RawFd;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::error::ServerError;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static LISTENER_FD: AtomicI32 = AtomicI32::new(-1);
static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the SIGINT/SIGTERM handler. Idempotent.
///
/// `SA_RESTART` is deliberately not set: a blocked accept must come back
/// with an error once the handler has run.
pub fn install() -> Result<(), ServerError> {
    if HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_termination as usize;
        libc::sigemptyset(&mut sa.sa_mask);
        sa.sa_flags = 0;

        for sig in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(sig, &sa, ptr::null_mut()) != 0 {
                return Err(ServerError::setup("sigaction", io::Error::last_os_error()));
            }
        }
    }
    Ok(())
}

/// Give the handler a listener fd to force closed on termination.
pub fn register_listener(fd: RawFd) {
    LISTENER_FD.store(fd, Ordering::SeqCst);
}

/// Forget the listener fd; call before the listener is dropped so the
/// handler can never touch a recycled descriptor.
pub fn clear_listener() {
    LISTENER_FD.store(-1, Ordering::SeqCst);
}

/// Has a termination request been delivered?
#[inline]
pub fn requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

extern "C" fn on_termination(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    let fd = LISTENER_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        // ENOTCONN on a listening socket is expected and harmless.
        unsafe {
            libc::shutdown(fd, libc::SHUT_RDWR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        install().unwrap();
        install().unwrap();
    }

    #[test]
    fn test_listener_registration_lifecycle() {
        register_listener(42);
        assert_eq!(LISTENER_FD.load(Ordering::SeqCst), 42);
        clear_listener();
        assert_eq!(LISTENER_FD.load(Ordering::SeqCst), -1);
    }
}
