//! # groupcost-common
//!
//! Foundation layer for groupcost: identifiers, literal values, and errors.
//!
//! This crate provides the building blocks shared by every other groupcost
//! crate. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (TableId, IndexId, GroupId, Value)
//! - [`utils`] - Utility functions and helpers (errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{GroupId, IndexId, TableId, Value};
pub use utils::error::{Error, Result};
