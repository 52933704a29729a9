//! A toy length-prefixed connection over stdin/stdout.
//!
//! Stands in for the real I/O collaborator (spec §6), which owns socket
//! framing and is out of scope for the Dispatch Core itself. Frames read
//! from stdin are treated as inbound (`incoming = true`); frames the
//! dispatch facade decides to forward are written to stdout.

use bytes::BytesMut;
use interceptor_core::{Dispatch, DispatchAction, DispatchError};
use interceptor_proto::Frame;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Failures reading or writing the toy connection, distinct from dispatch
/// errors so the read loop can tell I/O trouble apart from pipeline trouble.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The underlying stdin/stdout stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A frame failed to decode.
    #[error("frame error: {0}")]
    Frame(#[from] interceptor_proto::ProtocolError),
    /// The dispatch facade rejected the frame.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Reads length-prefixed frames from stdin, runs each through `dispatch`,
/// and writes whatever the facade decides to forward to stdout, until EOF.
pub async fn run_read_loop(dispatch: &Dispatch<'_>, buffer_size: usize) -> Result<(), ConnectionError> {
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut buf = BytesMut::with_capacity(buffer_size);

    loop {
        if buf.len() < interceptor_proto::HEADER_LEN {
            if !fill(&mut stdin, &mut buf, buffer_size).await? {
                return Ok(());
            }
            continue;
        }

        let needed = interceptor_proto::read_length(&buf[..2])? as usize;
        if buf.len() < needed {
            if !fill(&mut stdin, &mut buf, buffer_size).await? {
                warn!("connection closed mid-frame");
                return Ok(());
            }
            continue;
        }

        let frame_bytes = buf.split_to(needed).freeze();
        let frame = Frame::decode(&frame_bytes)?;

        debug!(opcode = frame.opcode(), len = frame.as_bytes().len(), "frame received");

        for action in dispatch.write(&frame, true, false)? {
            let DispatchAction::Forward { frame, .. } = action;
            stdout.write_all(frame.as_bytes()).await?;
        }
        stdout.flush().await?;
    }
}

async fn fill(
    stdin: &mut tokio::io::Stdin,
    buf: &mut BytesMut,
    buffer_size: usize,
) -> Result<bool, std::io::Error> {
    let mut chunk = vec![0u8; buffer_size];
    let read = stdin.read(&mut chunk).await?;
    if read == 0 {
        return Ok(false);
    }
    buf.extend_from_slice(&chunk[..read]);
    Ok(true)
}
