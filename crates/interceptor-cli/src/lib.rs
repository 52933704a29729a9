//! Demonstration binary for the Dispatch Core.
//!
//! Wires a toy single-message codec ([`demo_codec`]), a real-clock
//! [`interceptor_core::Environment`] ([`env::RealEnvironment`]), and a
//! length-prefixed stdin/stdout read loop ([`connection`]) into a working
//! [`interceptor_core::Dispatch`]. Gives the configuration surface (log
//! level, buffer size, starting protocol version) somewhere concrete to
//! land; a real deployment's I/O glue belongs to the host application, not
//! the Dispatch Core.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod demo_codec;
pub mod env;

use bytes::Bytes;
use clap::Parser;
use interceptor_core::Dispatch;
use interceptor_proto::Frame;
pub use connection::ConnectionError;
pub use demo_codec::{DemoCodecRegistry, DemoSystemMessageTable, DEMO_PROTO_VERSION};
pub use env::RealEnvironment;

/// Command-line configuration.
#[derive(Parser, Debug)]
#[command(name = "interceptor-cli")]
#[command(about = "Demonstration read loop for the dispatch core")]
#[command(version)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Read-loop buffer size in bytes.
    #[arg(long, default_value = "4096")]
    pub buffer_size: usize,
}

/// Run the demonstration read loop with the given configuration, negotiating
/// the demo protocol version up front since this binary has no real peer to
/// probe it from — without this, the dispatch facade would reject every
/// frame until one arrived on the wire.
///
/// # Errors
///
/// Propagates I/O, frame, and dispatch errors from the read loop.
pub async fn run(args: Args) -> Result<(), ConnectionError> {
    let codec = DemoCodecRegistry;
    let table = DemoSystemMessageTable;
    let dispatch = Dispatch::new(&codec, &table);

    let probe = Frame::new(
        interceptor_proto::C_CHECK_VERSION,
        Bytes::copy_from_slice(&DEMO_PROTO_VERSION.to_le_bytes()),
    )?;
    dispatch.write(&probe, true, false)?;

    tracing::info!(proto_version = DEMO_PROTO_VERSION, "negotiated demo protocol version");

    connection::run_read_loop(&dispatch, args.buffer_size).await
}
