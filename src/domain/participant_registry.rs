//! Concurrent participant membership and fan-out broadcast.
//!
//! [`ParticipantRegistry`] stores every participant that completed the
//! handshake in a `HashMap` behind a single [`tokio::sync::RwLock`].
//!
//! # Concurrency
//!
//! - register and unregister take the write lock; broadcast iterates under
//!   the read lock, so each broadcast sees one consistent membership.
//! - No lock is held across an `.await` on socket I/O. Delivering a frame
//!   means pushing it onto the recipient's writer queue, which never waits,
//!   so a peer that stops reading cannot stall anyone else.
//! - Once `unregister` returns, no later broadcast queues frames for that
//!   participant.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::participant::{Participant, ParticipantHandle};
use super::ParticipantId;
use crate::codec;

/// Shared set of connected participants.
#[derive(Debug)]
pub struct ParticipantRegistry {
    participants: RwLock<HashMap<ParticipantId, Participant>>,
}

impl ParticipantRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            participants: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a participant under its handle's id.
    ///
    /// Each handle belongs to exactly one connection handler, which
    /// registers it once, so ids never collide.
    pub async fn register(&self, handle: ParticipantHandle, name: String) {
        let participant = Participant::new(handle, name);
        let mut map = self.participants.write().await;
        map.insert(participant.id(), participant);
    }

    /// Removes the participant with this id, returning it if it was present.
    pub async fn unregister(&self, id: ParticipantId) -> Option<Participant> {
        self.participants.write().await.remove(&id)
    }

    /// Queues `"<sender name>: <message>"` for every participant except the
    /// sender.
    ///
    /// Nothing is sent when fewer than two participants are registered or
    /// when `from` is not registered. A participant whose writer has stopped
    /// is logged and skipped; the others still receive the frame.
    ///
    /// Returns the number of participants the frame was queued for.
    pub async fn broadcast(&self, from: ParticipantId, message: &str) -> usize {
        let map = self.participants.read().await;
        if map.len() < 2 {
            return 0;
        }
        let Some(sender) = map.get(&from) else {
            tracing::debug!(participant = %from, "broadcast from unregistered participant dropped");
            return 0;
        };
        let frame = codec::encode(&format!("{}: {message}", sender.name));

        let mut delivered = 0;
        for participant in map.values().filter(|p| p.id() != from) {
            match participant.handle.send_frame(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        participant = %participant.id(),
                        name = %participant.name,
                        %err,
                        "failed to relay message"
                    );
                }
            }
        }
        delivered
    }

    /// Returns the number of registered participants.
    pub async fn count(&self) -> usize {
        self.participants.read().await.len()
    }

    /// Returns `true` if nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.participants.read().await.is_empty()
    }

    /// Returns `true` if a participant with this id is registered.
    pub async fn contains(&self, id: ParticipantId) -> bool {
        self.participants.read().await.contains_key(&id)
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
