//! Fixed texts of the chat protocol.

/// Raw farewell sent to a departing client. Written as-is, not uuencoded.
pub const FAREWELL: &[u8] = b"Bye";

/// Greeting sent in reply to the handshake frame. `online` counts the
/// participants present before this one joined.
#[must_use]
pub fn greeting(name: &str, online: usize) -> String {
    format!("Hello, {name}. Users online: {online}")
}

/// Announcement broadcast when a participant joins.
#[must_use]
pub fn entered(name: &str) -> String {
    format!("{name} entered the chat!")
}

/// Announcement broadcast when a participant leaves.
#[must_use]
pub fn left(name: &str) -> String {
    format!("{name} left the chat!")
}
