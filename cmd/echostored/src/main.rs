//! echostored: packet-append echo daemon
//!
//! Accepts TCP connections on port 9000, appends each newline-terminated
//! packet to the backing store and echoes the store's readable content back.
//! `AESDCHAR_IOCSEEKTO:<record>,<offset>` packets reposition the device
//! read cursor instead of appending (device mode only).
//!
//! Usage:
//!     echostored              # file-backed, foreground
//!     echostored -d           # file-backed, detached
//!     echostored --device /dev/aesdchar
//!
//! Test with:
//!     printf 'hello\n' | nc localhost 9000

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use echostore_server::{server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "echostored", version, about = "Packet-append echo daemon")]
struct Cli {
    /// Run detached: new session, root working directory, stdio to /dev/null
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Back the store with a record device instead of a plain file
    #[arg(long, value_name = "PATH")]
    device: Option<PathBuf>,

    /// Listening port override
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(path) = cli.device {
        config = config.device(path);
    }
    config.daemonize = cli.daemon;

    match server::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
