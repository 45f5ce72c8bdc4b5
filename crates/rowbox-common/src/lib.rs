//! Rowbox Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Rowbox project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Rowbox workspace
//! members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Types**: The ingestion domain model (files, schemas, mappings)
//! - **Logging**: Centralized tracing configuration
//!
//! # Example
//!
//! ```no_run
//! use rowbox_common::types::{FileFormat, FileStatus};
//!
//! let format = FileFormat::from_filename("sales.csv");
//! assert_eq!(format, FileFormat::Csv);
//! assert!(!FileStatus::Pending.is_terminal());
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, RowboxError};
