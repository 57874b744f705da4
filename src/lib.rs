//! # uu-relay
//!
//! Multi-client TCP chat relay. Clients connect, send a display name, and
//! every frame they send afterwards is relayed to all other connected
//! clients as `"<name>: <message>"`. Frames are uuencoded UTF-8 text.
//!
//! ## Architecture
//!
//! ```text
//! Clients (TCP)
//!     │
//!     ├── Listener (relay/)            one task per accepted connection
//!     ├── Connection state machine     Connecting → Active → Closed
//!     │
//!     ├── ParticipantRegistry (domain/)  RwLock-guarded membership + fan-out
//!     ├── Writer task per participant  drains an mpsc queue into the socket
//!     │
//!     └── Frame codec (codec/)         uuencode with plain-text fallback
//! ```

pub mod app_state;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod relay;
