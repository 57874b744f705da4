//! Shared state handed to every connection task.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::ParticipantRegistry;

/// State available to every connection handler.
#[derive(Debug, Clone)]
pub struct RelayState {
    /// Participants that completed the handshake.
    pub registry: Arc<ParticipantRegistry>,
    /// Bytes read per frame.
    pub read_buffer_size: usize,
}

impl RelayState {
    /// Creates state with an empty registry sized from `config`.
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            registry: Arc::new(ParticipantRegistry::new()),
            read_buffer_size: config.read_buffer_size,
        }
    }
}
