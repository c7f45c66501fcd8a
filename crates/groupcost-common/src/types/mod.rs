//! Core type definitions for groupcost.
//!
//! - Identifier types ([`TableId`], [`IndexId`], [`GroupId`])
//! - Literal values ([`Value`]) as they appear in predicates and statistics

mod id;
mod value;

pub use id::{GroupId, IndexId, TableId};
pub use value::Value;
