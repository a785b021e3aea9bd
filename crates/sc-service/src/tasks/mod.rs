//! Background tasks.
//!
//! - `session_purge` - drops idle sessions from the in-process store

pub mod session_purge;

pub use session_purge::start_session_purge;
