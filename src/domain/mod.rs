//! Domain layer: participant identity, connection handles, and the
//! shared participant registry.
//!
//! This module contains the server-side model of who is connected: the
//! [`ParticipantId`] newtype, the [`Participant`] record with its
//! queue-fed [`ParticipantHandle`], and the lock-guarded [`ParticipantRegistry`]
//! that every connection task shares.

pub mod participant;
pub mod participant_id;
pub mod participant_registry;

pub use participant::{write_frame, FrameSink, Participant, ParticipantHandle};
pub use participant_id::ParticipantId;
pub use participant_registry::ParticipantRegistry;
