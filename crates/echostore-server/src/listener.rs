//! Listening socket
//!
//! IPv4 stream socket on the wildcard address, `SO_REUSEADDR`, fixed
//! backlog. Built with raw libc calls so every step can report precisely
//! which stage failed; once bound it is handed to `std::net::TcpListener`
//! for accepting.
//!
//! `accept_next` blocks. The only way to unblock it is
//! [`request_shutdown`](Listener::request_shutdown), which forces the
//! socket into a closed-for-read/write state; that is what the signal
//! handler does through [`shutdown`](crate::shutdown).

use std::io;
use std::mem;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

use crate::error::ServerError;
use crate::shutdown;

/// What came out of one `accept_next` call.
pub enum AcceptOutcome {
    /// A new connection plus the peer's numeric host string.
    Connection(TcpStream, String),

    /// Transient accept failure; log and keep accepting.
    Retry(io::Error),

    /// The listener was shut down while we were blocked.
    Interrupted,
}

pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// socket + SO_REUSEADDR + bind + listen. Any failure is fatal.
    pub fn start(port: u16, backlog: i32) -> Result<Self, ServerError> {
        unsafe {
            let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0);
            if fd < 0 {
                return Err(ServerError::setup("socket", io::Error::last_os_error()));
            }

            let opt: libc::c_int = 1;
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &opt as *const _ as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            );

            let mut addr: libc::sockaddr_in = mem::zeroed();
            addr.sin_family = libc::AF_INET as libc::sa_family_t;
            addr.sin_addr.s_addr = libc::INADDR_ANY;
            addr.sin_port = port.to_be();

            if libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            ) != 0
            {
                let e = io::Error::last_os_error();
                libc::close(fd);
                return Err(ServerError::setup("bind", e));
            }

            if libc::listen(fd, backlog) != 0 {
                let e = io::Error::last_os_error();
                libc::close(fd);
                return Err(ServerError::setup("listen", e));
            }

            Ok(Self {
                inner: TcpListener::from_raw_fd(fd),
            })
        }
    }

    /// Block until a connection arrives or the listener is shut down.
    pub fn accept_next(&self) -> AcceptOutcome {
        match self.inner.accept() {
            Ok((stream, addr)) => AcceptOutcome::Connection(stream, addr.ip().to_string()),
            Err(_) if shutdown::requested() => AcceptOutcome::Interrupted,
            Err(e) => AcceptOutcome::Retry(e),
        }
    }

    /// Force the socket closed-for-read/write to unblock a pending accept.
    /// Safe to call any number of times, from any thread.
    pub fn request_shutdown(&self) {
        // ENOTCONN is expected on a listening socket; the wakeup still
        // happens, which is all we need.
        unsafe {
            libc::shutdown(self.inner.as_raw_fd(), libc::SHUT_RDWR);
        }
    }

    /// The bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;

    #[test]
    fn test_start_and_accept_one() {
        let listener = Listener::start(0, 5).unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = std::thread::spawn(move || {
            TcpStream::connect(("127.0.0.1", port)).unwrap();
        });

        match listener.accept_next() {
            AcceptOutcome::Connection(_, peer) => assert_eq!(peer, "127.0.0.1"),
            _ => panic!("expected a connection"),
        }
        client.join().unwrap();
    }

    #[test]
    fn test_bind_conflict_is_setup_error() {
        let first = Listener::start(0, 5).unwrap();
        let port = first.local_addr().unwrap().port();

        // Second bind on the same port must fail at setup, not later.
        match Listener::start(port, 5) {
            Err(ServerError::Setup { stage, .. }) => assert_eq!(stage, "bind"),
            Ok(_) => panic!("expected bind failure"),
        }
    }

    #[test]
    fn test_request_shutdown_unblocks_accept() {
        let listener = std::sync::Arc::new(Listener::start(0, 5).unwrap());
        let accepting = listener.clone();

        let t = std::thread::spawn(move || {
            // Without the shutdown this would block forever.
            match accepting.accept_next() {
                AcceptOutcome::Connection(..) => panic!("no client connected"),
                AcceptOutcome::Retry(_) | AcceptOutcome::Interrupted => {}
            }
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        listener.request_shutdown();
        t.join().unwrap();
    }
}
