//! Connection state machine.
//!
//! Drives one client from handshake to departure:
//!
//! ```text
//! Connecting ──name frame──▶ Active ──EOF / error──▶ Closed
//!      │                                                ▲
//!      └──────────────EOF / error───────────────────────┘
//! ```
//!
//! Every failure inside `Connecting` or `Active` ends the session; it is
//! logged here and never reaches the listener.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use super::messages;
use crate::app_state::RelayState;
use crate::codec;
use crate::domain::{write_frame, FrameSink, ParticipantHandle, ParticipantId, ParticipantRegistry};
use crate::error::RelayError;

/// Lifecycle of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the handshake frame carrying the display name.
    Connecting,
    /// Registered; every frame received is relayed to the others.
    Active,
    /// Terminal. Departure notice, unregister, farewell, handle shutdown.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Runs one client session to completion.
///
/// Splits `stream` into a read half owned by this task and a write half.
/// Until the handshake succeeds the write half is used directly; afterwards
/// it moves into a writer task fed through a [`ParticipantHandle`] that the
/// registry can share. Returns once the session is closed and the write
/// half shut down.
pub async fn run_connection<S>(stream: S, state: RelayState)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut session = Session::new(reader, Box::new(writer), &state);

    if let Err(err) = session.drive().await {
        if err.is_disconnect() {
            tracing::debug!(participant = %session.id, state = %session.state, %err, "peer dropped");
        } else {
            tracing::warn!(participant = %session.id, state = %session.state, %err, "connection failed");
        }
    }
    session.close().await;
}

/// Where outgoing frames go.
enum Outlet {
    /// Not registered yet: this task writes to the socket itself.
    Direct(FrameSink),
    /// Registered: frames are queued for the writer task.
    Queued {
        handle: ParticipantHandle,
        writer: JoinHandle<()>,
        name: String,
    },
    /// The write half has been given up.
    Released,
}

struct Session<R> {
    reader: R,
    id: ParticipantId,
    outlet: Outlet,
    registry: Arc<ParticipantRegistry>,
    buf: Vec<u8>,
    state: ConnectionState,
}

impl<R: AsyncRead + Unpin> Session<R> {
    fn new(reader: R, sink: FrameSink, state: &RelayState) -> Self {
        Self {
            reader,
            id: ParticipantId::random(),
            outlet: Outlet::Direct(sink),
            registry: Arc::clone(&state.registry),
            buf: vec![0; state.read_buffer_size],
            state: ConnectionState::Connecting,
        }
    }

    /// Reads and decodes one frame. `None` means the peer closed its side.
    async fn read_frame(&mut self) -> Result<Option<String>, RelayError> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        let frame = self.buf.get(..n).unwrap_or_default();
        Ok(Some(codec::decode(frame)))
    }

    async fn drive(&mut self) -> Result<(), RelayError> {
        loop {
            match self.state {
                ConnectionState::Connecting => match self.read_frame().await? {
                    Some(name) => self.handshake(name).await?,
                    None => self.state = ConnectionState::Closed,
                },
                ConnectionState::Active => match self.read_frame().await? {
                    Some(text) => {
                        self.registry.broadcast(self.id, &text).await;
                    }
                    None => self.state = ConnectionState::Closed,
                },
                ConnectionState::Closed => return Ok(()),
            }
        }
    }

    /// Greets the client, then registers it. A greeting that cannot be
    /// written leaves the client unregistered.
    async fn handshake(&mut self, name: String) -> Result<(), RelayError> {
        let online = self.registry.count().await;
        let greeting = codec::encode(&messages::greeting(&name, online));

        let Outlet::Direct(mut sink) = std::mem::replace(&mut self.outlet, Outlet::Released) else {
            self.state = ConnectionState::Closed;
            return Ok(());
        };
        if let Err(err) = write_frame(&mut sink, &greeting).await {
            self.outlet = Outlet::Direct(sink);
            return Err(err.into());
        }

        let (handle, writer) = ParticipantHandle::spawn(self.id, sink);
        self.registry.register(handle.clone(), name.clone()).await;
        tracing::info!(participant = %self.id, %name, online = online + 1, "participant joined");
        self.registry.broadcast(self.id, &messages::entered(&name)).await;

        self.outlet = Outlet::Queued {
            handle,
            writer,
            name,
        };
        self.state = ConnectionState::Active;
        Ok(())
    }

    async fn close(mut self) {
        self.state = ConnectionState::Closed;
        let id = self.id;

        match std::mem::replace(&mut self.outlet, Outlet::Released) {
            Outlet::Queued {
                handle,
                writer,
                name,
            } => {
                self.registry.broadcast(id, &messages::left(&name)).await;
                if let Some(participant) = self.registry.unregister(id).await {
                    tracing::info!(
                        participant = %id,
                        %name,
                        session_secs = participant.session_duration().num_seconds(),
                        "participant left"
                    );
                }
                // Unregistered, so nothing else can queue after the farewell.
                if let Err(err) = handle.send_frame(messages::FAREWELL.to_vec()) {
                    tracing::debug!(participant = %id, %err, "farewell not delivered");
                }
                drop(handle);
                if let Err(err) = writer.await {
                    tracing::warn!(participant = %id, %err, "writer task failed");
                }
            }
            Outlet::Direct(mut sink) => {
                if let Err(err) = sink.shutdown().await {
                    tracing::debug!(participant = %id, %err, "shutdown of closed connection failed");
                }
            }
            Outlet::Released => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;
    use tokio_test::io::Builder;

    use super::*;
    use crate::config::RelayConfig;

    fn relay_state() -> RelayState {
        RelayState::new(&RelayConfig::default())
    }

    fn connect(state: &RelayState) -> (DuplexStream, JoinHandle<()>) {
        let (client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(run_connection(server, state.clone()));
        (client, task)
    }

    async fn read_exactly(client: &mut DuplexStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0; len];
        let Ok(_) = client.read_exact(&mut buf).await else {
            panic!("expected {len} bytes from the relay");
        };
        buf
    }

    /// Registration happens after the greeting is written, so a client
    /// can see its greeting before it is counted.
    async fn wait_for_count(state: &RelayState, expected: usize) {
        let waited = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while state.registry.count().await != expected {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await;
        let Ok(()) = waited else {
            panic!("registry never reached {expected} participants");
        };
    }

    async fn finish(task: JoinHandle<()>) {
        let Ok(()) = task.await else {
            panic!("connection task panicked");
        };
    }

    #[tokio::test]
    async fn greets_then_says_bye_on_disconnect() {
        let state = relay_state();
        let (mut client, task) = connect(&state);

        let Ok(()) = client.write_all(&codec::encode("Alice")).await else {
            panic!("handshake write failed");
        };
        let greeting = codec::encode("Hello, Alice. Users online: 0");
        assert_eq!(read_exactly(&mut client, greeting.len()).await, greeting);
        wait_for_count(&state, 1).await;

        let Ok(()) = client.shutdown().await else {
            panic!("client shutdown failed");
        };
        let mut rest = Vec::new();
        let Ok(_) = client.read_to_end(&mut rest).await else {
            panic!("reading farewell failed");
        };
        assert_eq!(rest, messages::FAREWELL);

        finish(task).await;
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn plain_text_name_is_accepted() {
        let state = relay_state();
        let (mut client, task) = connect(&state);

        let Ok(()) = client.write_all(b"carol").await else {
            panic!("handshake write failed");
        };
        let greeting = codec::encode("Hello, carol. Users online: 0");
        assert_eq!(read_exactly(&mut client, greeting.len()).await, greeting);

        drop(client);
        finish(task).await;
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn disconnect_before_handshake_registers_nobody() {
        let state = relay_state();
        let (mut client, task) = connect(&state);

        let Ok(()) = client.shutdown().await else {
            panic!("client shutdown failed");
        };
        let mut rest = Vec::new();
        let Ok(_) = client.read_to_end(&mut rest).await else {
            panic!("read after shutdown failed");
        };
        assert!(rest.is_empty());

        finish(task).await;
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn relays_between_two_clients() {
        let state = relay_state();
        let (mut alice, alice_task) = connect(&state);
        let Ok(()) = alice.write_all(&codec::encode("Alice")).await else {
            panic!("alice handshake failed");
        };
        let greeting = codec::encode("Hello, Alice. Users online: 0");
        read_exactly(&mut alice, greeting.len()).await;
        wait_for_count(&state, 1).await;

        let (mut bob, bob_task) = connect(&state);
        let Ok(()) = bob.write_all(&codec::encode("Bob")).await else {
            panic!("bob handshake failed");
        };
        let greeting = codec::encode("Hello, Bob. Users online: 1");
        assert_eq!(read_exactly(&mut bob, greeting.len()).await, greeting);

        let entered = codec::encode("Bob: Bob entered the chat!");
        assert_eq!(read_exactly(&mut alice, entered.len()).await, entered);

        let Ok(()) = bob.write_all(&codec::encode("hi")).await else {
            panic!("bob message failed");
        };
        let relayed = codec::encode("Bob: hi");
        assert_eq!(read_exactly(&mut alice, relayed.len()).await, relayed);

        drop(bob);
        let left = codec::encode("Bob: Bob left the chat!");
        assert_eq!(read_exactly(&mut alice, left.len()).await, left);
        finish(bob_task).await;
        assert_eq!(state.registry.count().await, 1);

        drop(alice);
        finish(alice_task).await;
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn read_error_still_runs_departure() {
        let state = relay_state();
        let mock = Builder::new()
            .read(&codec::encode("Alice"))
            .write(&codec::encode("Hello, Alice. Users online: 0"))
            .read_error(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
            .write(messages::FAREWELL)
            .build();

        run_connection(mock, state.clone()).await;
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn failed_greeting_leaves_client_unregistered() {
        let state = relay_state();
        // Any further write, a farewell included, would fail the mock.
        let mock = Builder::new()
            .read(&codec::encode("Alice"))
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();

        run_connection(mock, state.clone()).await;
        assert!(state.registry.is_empty().await);
    }

    #[test]
    fn state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Active.to_string(), "active");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
