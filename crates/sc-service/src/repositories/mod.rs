//! Collaborator seams over persistent storage.
//!
//! Each trait has a Postgres implementation here; tests swap in in-memory
//! versions. Every tenant-scoped query takes a scope value produced by the
//! access service, never a raw client-supplied id.

pub mod activity_logs;
pub mod buildings;
pub mod funds;
pub mod meetings;
pub mod users;

pub use activity_logs::{ActivityEntry, ActivityLog, PgActivityLog};
pub use buildings::{BuildingDirectory, PgBuildingDirectory};
pub use funds::{FundLedger, LedgerTransaction, PgFundLedger};
pub use meetings::{MeetingRepository, PgMeetingRepository};
pub use users::{PgUserDirectory, UserDirectory};
