//! Accept loop.
//!
//! Binds through [`TcpSocket`] so the configured maximum-clients value can
//! be passed as the listen backlog. The backlog only bounds connections
//! waiting to be accepted; the number of concurrent sessions is unbounded.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tracing::Instrument;

use super::connection::run_connection;
use crate::app_state::RelayState;
use crate::config::RelayConfig;
use crate::error::RelayError;

/// Listening socket plus the state shared with every connection.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    state: RelayState,
}

impl Listener {
    /// Binds and listens on `config.listen_addr`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the socket cannot be created, bound,
    /// or put into listening mode.
    pub fn bind(config: &RelayConfig) -> Result<Self, RelayError> {
        let socket = match config.listen_addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(config.listen_addr)?;
        let inner = socket.listen(config.max_clients)?;

        Ok(Self {
            inner,
            state: RelayState::new(config),
        })
    }

    /// Address actually bound (resolves port `0`).
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the OS cannot report the address.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.inner.local_addr()?)
    }

    /// State shared with the connection tasks.
    #[must_use]
    pub const fn state(&self) -> &RelayState {
        &self.state
    }

    /// Accepts connections forever, spawning one task per client.
    ///
    /// Open connections are abandoned when the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] on the first accept failure; there is no
    /// recovery path.
    pub async fn run(self) -> Result<(), RelayError> {
        loop {
            let (stream, peer) = self.inner.accept().await?;
            if let Err(err) = stream.set_nodelay(true) {
                tracing::debug!(%peer, %err, "could not disable nagle");
            }
            tracing::debug!(%peer, "connection accepted");
            let state = self.state.clone();
            tokio::spawn(
                run_connection(stream, state).instrument(tracing::info_span!("connection", %peer)),
            );
        }
    }
}
