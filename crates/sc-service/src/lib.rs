//! Society management service library.
//!
//! Session handling, CSRF protection, role and tenant-scope enforcement,
//! and the transactional fund ledger for a multi-society property app.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Random tokens, constant-time comparison, password hashing
//! - `errors` - Error types and their HTTP rendering
//! - `handlers` - HTTP request handlers
//! - `middleware` - Session, CSRF, security header and metrics layers
//! - `models` - Roles, scopes and data models
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - Database access layer
//! - `routes` - Router and application state
//! - `services` - Business logic layer
//! - `session` - Server-side sessions and CSRF tokens
//! - `tasks` - Background maintenance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod session;
pub mod tasks;
