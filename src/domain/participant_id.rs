//! Connection identity.

use std::fmt;

/// Identity of one accepted connection.
///
/// Display names may collide; ids never do. Drawn once per connection and
/// used as the registry key and the sender exclusion in broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantId(uuid::Uuid);

impl ParticipantId {
    /// Draws a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        assert_ne!(ParticipantId::random(), ParticipantId::random());
    }

    #[test]
    fn logs_as_hyphenated_uuid() {
        let shown = ParticipantId::random().to_string();
        assert_eq!(shown.len(), 36);
        assert_eq!(shown.matches('-').count(), 4);
    }
}
