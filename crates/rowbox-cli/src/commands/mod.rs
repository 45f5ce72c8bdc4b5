//! CLI command implementations

pub mod errors;
pub mod files;
pub mod retry;
pub mod schema;
pub mod status;
pub mod upload;
