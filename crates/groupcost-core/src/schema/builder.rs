//! Incremental, validating schema construction.

use super::{Group, Index, IndexColumn, IndexKind, Schema, Table};
use groupcost_common::{Error, GroupId, IndexId, Result, TableId};

/// Builds a [`Schema`].
///
/// Tables must be added parent-first. Every table without a parent starts
/// a new group named after it.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. `parent` names an already added table.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate table or column names and for an
    /// unknown parent.
    pub fn add_table(
        &mut self,
        name: &str,
        columns: &[&str],
        parent: Option<&str>,
    ) -> Result<TableId> {
        if self.schema.table_names.contains_key(name) {
            return Err(Error::Duplicate {
                kind: "table",
                name: name.to_string(),
            });
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(Error::Duplicate {
                    kind: "column",
                    name: format!("{name}.{column}"),
                });
            }
        }

        let id = TableId::new(u32::try_from(self.schema.tables.len()).map_err(|_| {
            Error::Config("too many tables".to_string())
        })?);

        let (parent, group) = match parent {
            Some(parent_name) => {
                let parent = self
                    .schema
                    .table_by_name(parent_name)
                    .ok_or_else(|| Error::UnknownTable(parent_name.to_string()))?;
                (Some(parent.id), parent.group)
            }
            None => {
                let group = GroupId::new(u32::try_from(self.schema.groups.len()).map_err(
                    |_| Error::Config("too many groups".to_string()),
                )?);
                self.schema.groups.push(Group {
                    id: group,
                    name: name.to_string(),
                    root: id,
                });
                self.schema.group_indexes.push(Vec::new());
                (None, group)
            }
        };

        self.schema.tables.push(Table {
            id,
            name: name.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            parent,
            group,
        });
        self.schema.table_names.insert(name.to_string(), id);
        self.schema.children.push(Vec::new());
        self.schema.table_indexes.push(Vec::new());
        if let Some(parent) = parent {
            self.schema.children[parent.index()].push(id);
        }
        Ok(id)
    }

    /// Adds a table index over columns of one table.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown table or column, an empty column
    /// list, or an index name already used on the table.
    pub fn add_index(
        &mut self,
        table: &str,
        name: &str,
        columns: &[&str],
        unique: bool,
    ) -> Result<IndexId> {
        let table_ref = self
            .schema
            .table_by_name(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
        let (table_id, group) = (table_ref.id, table_ref.group);

        if self.schema.table_indexes(table_id).any(|i| i.name == name) {
            return Err(Error::Duplicate {
                kind: "index",
                name: format!("{table}.{name}"),
            });
        }
        let columns = columns
            .iter()
            .map(|c| self.resolve_column(table, c))
            .collect::<Result<Vec<_>>>()?;

        let id = self.push_index(name, IndexKind::Table, table_id, group, columns, unique)?;
        self.schema.table_indexes[table_id.index()].push(id);
        Ok(id)
    }

    /// Adds a group index. Columns are `(table, column)` pairs in key order
    /// and must all lie on one root-to-leaf branch of a single group.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tables or columns, columns spanning
    /// groups or sibling branches, an empty column list, or a duplicate
    /// index name within the group.
    pub fn add_group_index(&mut self, name: &str, columns: &[(&str, &str)]) -> Result<IndexId> {
        let columns = columns
            .iter()
            .map(|(table, column)| self.resolve_column(table, column))
            .collect::<Result<Vec<_>>>()?;
        let Some(first) = columns.first() else {
            return Err(Error::Config(format!("index {name} has no columns")));
        };

        let group = self.schema.tables[first.table.index()].group;
        let leaf = columns
            .iter()
            .map(|c| c.table)
            .max_by_key(|t| self.schema.depth(*t))
            .unwrap_or(first.table);
        for column in &columns {
            let table = &self.schema.tables[column.table.index()];
            if table.group != group {
                return Err(Error::Config(format!(
                    "group index {name} spans more than one group"
                )));
            }
            if column.table != leaf && !self.schema.is_ancestor_of(column.table, leaf) {
                return Err(Error::Config(format!(
                    "group index {name} columns are not on a single branch"
                )));
            }
        }
        if self.schema.group_indexes(group).any(|i| i.name == name) {
            return Err(Error::Duplicate {
                kind: "group index",
                name: name.to_string(),
            });
        }

        let id = self.push_index(name, IndexKind::Group, leaf, group, columns, false)?;
        self.schema.group_indexes[group.index()].push(id);
        Ok(id)
    }

    /// Finishes the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }

    fn resolve_column(&self, table: &str, column: &str) -> Result<IndexColumn> {
        let t = self
            .schema
            .table_by_name(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
        if !t.has_column(column) {
            return Err(Error::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(IndexColumn {
            table: t.id,
            column: column.to_string(),
        })
    }

    fn push_index(
        &mut self,
        name: &str,
        kind: IndexKind,
        table: TableId,
        group: GroupId,
        columns: Vec<IndexColumn>,
        unique: bool,
    ) -> Result<IndexId> {
        if columns.is_empty() {
            return Err(Error::Config(format!("index {name} has no columns")));
        }
        let id = IndexId::new(
            u32::try_from(self.schema.indexes.len())
                .map_err(|_| Error::Config("too many indexes".to_string()))?,
        );
        self.schema.indexes.push(Index {
            id,
            name: name.to_string(),
            kind,
            table,
            group,
            columns,
            unique,
        });
        Ok(id)
    }
}
