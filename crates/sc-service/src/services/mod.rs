pub mod access_service;
pub mod activity_service;
pub mod auth_service;
pub mod fund_service;
