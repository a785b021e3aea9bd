//! # Society Service Test Utilities
//!
//! Shared test utilities for the society service.
//!
//! This crate provides:
//! - In-memory collaborators (`mock_*`) with fault injection
//! - User fixtures with bcrypt hashes (`fixtures`)
//! - An in-process harness that drives the real router (`server_harness`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let mut app = TestApp::new();
//!     app.login_as("admin@society.test").await;
//!
//!     let response = app.get_json("/api/v1/society/fund").await;
//!     assert_eq!(response.status, StatusCode::OK);
//! }
//! ```

pub mod fixtures;
pub mod mock_activity;
pub mod mock_buildings;
pub mod mock_ledger;
pub mod mock_meetings;
pub mod mock_users;
pub mod server_harness;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_activity::MockActivityLog;
pub use mock_buildings::MockBuildingDirectory;
pub use mock_ledger::{MockFundLedger, Tenant};
pub use mock_meetings::MockMeetingRepository;
pub use mock_users::MockUserDirectory;
pub use server_harness::*;
