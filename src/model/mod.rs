//! Session and entry data model
//!
//! Sessions are owned by the external registry and only read here. Entries are
//! append-only from participants; the only mutations are vote increments and
//! presenter answers.

pub mod entry;
pub mod session;

pub use entry::{ChangeKind, Entry, EntryChange, EntryId, EntryStatus};
pub use session::{JoinCode, Session, SessionId, SessionType};
