//! A connected client and the handle used to write to it.
//!
//! Each registered connection gets its own writer task that owns the write
//! half of the socket and drains an unbounded queue of frames. Sending is a
//! queue push: it never waits on the peer, so a client that stops reading
//! only stalls its own writer task.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ParticipantId;

/// Write half of a client connection, type-erased so that TCP streams and
/// in-memory pipes can share the registry.
pub type FrameSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes one frame in a single `write_all` and flushes it.
///
/// # Errors
///
/// Returns the I/O error if the peer is gone or the write fails.
pub async fn write_frame(sink: &mut FrameSink, frame: &[u8]) -> std::io::Result<()> {
    sink.write_all(frame).await?;
    sink.flush().await
}

/// Sending side of one connection.
///
/// Clones share one queue and therefore one writer task. The writer shuts
/// the sink down once every clone is dropped and the queue is drained.
#[derive(Clone)]
pub struct ParticipantHandle {
    id: ParticipantId,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
}

impl ParticipantHandle {
    /// Spawns the writer task for `sink` and returns the handle feeding it,
    /// plus the task so the owner can wait for the socket to be released.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(id: ParticipantId, sink: FrameSink) -> (Self, JoinHandle<()>) {
        let (outbox, frames) = mpsc::unbounded_channel();
        let writer = tokio::spawn(drain_frames(id, sink, frames));
        (Self { id, outbox }, writer)
    }

    /// Identity of the underlying connection.
    #[must_use]
    pub const fn id(&self) -> ParticipantId {
        self.id
    }

    /// Queues one frame for the writer task.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::BrokenPipe`] if the writer task has
    /// stopped, because an earlier write failed or the connection was
    /// released.
    pub fn send_frame(&self, frame: Vec<u8>) -> std::io::Result<()> {
        self.outbox.send(frame).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection writer has stopped",
            )
        })
    }
}

impl fmt::Debug for ParticipantHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantHandle")
            .field("id", &self.id)
            .field("closed", &self.outbox.is_closed())
            .finish()
    }
}

async fn drain_frames(
    id: ParticipantId,
    mut sink: FrameSink,
    mut frames: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(err) = write_frame(&mut sink, &frame).await {
            tracing::debug!(participant = %id, %err, "writer stopped");
            break;
        }
    }
    // Refuse further frames before the (possibly slow) shutdown.
    frames.close();
    if let Err(err) = sink.shutdown().await {
        tracing::debug!(participant = %id, %err, "shutdown of closed connection failed");
    }
}

/// A client that has completed the handshake.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Sending side of the client connection.
    pub handle: ParticipantHandle,

    /// Display name from the handshake frame (not unique, immutable).
    pub name: String,

    /// When the participant was registered.
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Creates a participant joining now.
    #[must_use]
    pub fn new(handle: ParticipantHandle, name: String) -> Self {
        Self {
            handle,
            name,
            joined_at: Utc::now(),
        }
    }

    /// Shorthand for `self.handle.id()`.
    #[must_use]
    pub const fn id(&self) -> ParticipantId {
        self.handle.id()
    }

    /// Time since the participant joined.
    #[must_use]
    pub fn session_duration(&self) -> chrono::Duration {
        Utc::now() - self.joined_at
    }
}
