//! # possync-core
//!
//! Core crate for possync. Contains the configuration schemas and the
//! unified error system shared by the worker, the CLI and the binary.
//!
//! This crate has **no** internal dependencies on other possync crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
