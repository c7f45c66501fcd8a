//! Serializable schema documents.
//!
//! ```json
//! {
//!   "tables": [
//!     { "name": "customers", "columns": ["cid", "name"] },
//!     { "name": "orders", "columns": ["oid", "cid", "order_date"], "parent": "customers" }
//!   ],
//!   "indexes": [
//!     { "table": "customers", "name": "PRIMARY", "columns": ["cid"], "unique": true }
//!   ],
//!   "group_indexes": [
//!     { "name": "name_and_date", "columns": ["customers.name", "orders.order_date"] }
//!   ]
//! }
//! ```

use std::path::Path;

use super::{Schema, SchemaBuilder};
use groupcost_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// A table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Column names in order.
    pub columns: Vec<String>,
    /// Parent table name, absent for a group root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A table index entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Indexed table.
    pub table: String,
    /// Index name.
    pub name: String,
    /// Key columns in order.
    pub columns: Vec<String>,
    /// Unique index.
    #[serde(default)]
    pub unique: bool,
}

/// A group index entry. Columns are written `table.column`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupIndexDefinition {
    /// Index name.
    pub name: String,
    /// Key columns in order.
    pub columns: Vec<String>,
}

/// A whole schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Tables, parents before children.
    pub tables: Vec<TableDefinition>,
    /// Table indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    /// Group indexes.
    #[serde(default)]
    pub group_indexes: Vec<GroupIndexDefinition>,
}

impl SchemaDefinition {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed input.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds the schema, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns the first validation error from [`SchemaBuilder`], or
    /// [`Error::Config`] for a group index column not written
    /// `table.column`.
    pub fn build(&self) -> Result<Schema> {
        let mut builder = SchemaBuilder::new();
        for table in &self.tables {
            let columns: Vec<&str> = table.columns.iter().map(String::as_str).collect();
            builder.add_table(&table.name, &columns, table.parent.as_deref())?;
        }
        for index in &self.indexes {
            let columns: Vec<&str> = index.columns.iter().map(String::as_str).collect();
            builder.add_index(&index.table, &index.name, &columns, index.unique)?;
        }
        for index in &self.group_indexes {
            let columns = index
                .columns
                .iter()
                .map(|c| {
                    c.split_once('.').ok_or_else(|| {
                        Error::Config(format!(
                            "group index {} column {c} is not written table.column",
                            index.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            builder.add_group_index(&index.name, &columns)?;
        }
        Ok(builder.build())
    }
}
