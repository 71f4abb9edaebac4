//! # dataroom-core
//!
//! Core crate for DataRoom. Contains the unified error system, the
//! configuration schema, typed identifiers, timestamp helpers and the
//! blob store contract.
//!
//! This crate has **no** internal dependencies on other DataRoom crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
