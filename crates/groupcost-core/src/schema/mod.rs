//! Schema model: tables, table groups and indexes.
//!
//! Tables form groups. A group is a root table together with all of its
//! descendants, stored clustered so that each child row sits next to its
//! parent row. Indexes are either table indexes over one table's columns
//! or group indexes whose columns run along one root-to-leaf branch of a
//! group.
//!
//! The schema is built once through [`SchemaBuilder`] (or from a
//! [`SchemaDefinition`] document) and is immutable afterwards.

mod builder;
mod definition;

pub use builder::SchemaBuilder;
pub use definition::{GroupIndexDefinition, IndexDefinition, SchemaDefinition, TableDefinition};

use groupcost_common::{Error, GroupId, IndexId, Result, TableId};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A table.
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) id: TableId,
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) parent: Option<TableId>,
    pub(crate) group: GroupId,
}

impl Table {
    /// Returns the table id.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns true if the table declares the column.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Returns the parent table, or `None` for a group root.
    #[must_use]
    pub fn parent(&self) -> Option<TableId> {
        self.parent
    }

    /// Returns the group this table belongs to.
    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Returns true if this table is the root of its group.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A table group.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) root: TableId,
}

impl Group {
    /// Returns the group id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the group name (the name of its root table).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the root table.
    #[must_use]
    pub fn root(&self) -> TableId {
        self.root
    }
}

/// Whether an index covers a single table or a branch of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Index over one table's columns.
    Table,
    /// Index over columns of several tables on one root-to-leaf branch.
    Group,
}

/// One key column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexColumn {
    /// Table that owns the column.
    pub table: TableId,
    /// Column name.
    pub column: String,
}

/// An index.
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) id: IndexId,
    pub(crate) name: String,
    pub(crate) kind: IndexKind,
    pub(crate) table: TableId,
    pub(crate) group: GroupId,
    pub(crate) columns: Vec<IndexColumn>,
    pub(crate) unique: bool,
}

impl Index {
    /// Returns the index id.
    #[must_use]
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// Returns the index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the index kind.
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns the leaf-most table the index covers. Each index entry
    /// corresponds to one row of this table.
    #[must_use]
    pub fn leaf_table(&self) -> TableId {
        self.table
    }

    /// Returns the group of the indexed tables.
    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Returns the key columns in index order.
    #[must_use]
    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Returns the number of key columns.
    #[must_use]
    pub fn key_column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the first key column.
    #[must_use]
    pub fn leading_column(&self) -> &IndexColumn {
        &self.columns[0]
    }

    /// Returns true for unique indexes.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

/// An immutable catalog of tables, groups and indexes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) tables: Vec<Table>,
    pub(crate) groups: Vec<Group>,
    pub(crate) indexes: Vec<Index>,
    pub(crate) table_names: HashMap<String, TableId>,
    pub(crate) children: Vec<Vec<TableId>>,
    pub(crate) table_indexes: Vec<Vec<IndexId>>,
    pub(crate) group_indexes: Vec<Vec<IndexId>>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns all tables in declaration order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns all groups.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns all indexes.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Looks up a table by id.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index())
    }

    /// Looks up a table by id, failing for ids from another schema.
    pub fn require_table(&self, id: TableId) -> Result<&Table> {
        self.table(id)
            .ok_or_else(|| Error::UnknownTable(id.to_string()))
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table_names.get(name).and_then(|id| self.table(*id))
    }

    /// Returns the display name of a table, or its id if unknown.
    #[must_use]
    pub fn table_name(&self, id: TableId) -> String {
        self.table(id)
            .map_or_else(|| id.to_string(), |t| t.name.clone())
    }

    /// Looks up a group by id.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index())
    }

    /// Looks up an index by id.
    #[must_use]
    pub fn index(&self, id: IndexId) -> Option<&Index> {
        self.indexes.get(id.index())
    }

    /// Looks up an index by id, failing for ids from another schema.
    pub fn require_index(&self, id: IndexId) -> Result<&Index> {
        self.index(id)
            .ok_or_else(|| Error::UnknownIndex(id.to_string()))
    }

    /// Looks up an index by name: first among the table's own indexes,
    /// then among the group indexes of the table's group.
    #[must_use]
    pub fn index_by_name(&self, table: &str, index: &str) -> Option<&Index> {
        let table = self.table_by_name(table)?;
        self.table_indexes(table.id)
            .find(|i| i.name == index)
            .or_else(|| self.group_indexes(table.group).find(|i| i.name == index))
    }

    /// Looks up a group index by name in any group.
    #[must_use]
    pub fn group_index_by_name(&self, name: &str) -> Option<&Index> {
        self.indexes
            .iter()
            .find(|i| i.kind == IndexKind::Group && i.name == name)
    }

    /// Returns the direct children of a table.
    #[must_use]
    pub fn children(&self, table: TableId) -> &[TableId] {
        self.children.get(table.index()).map_or(&[], Vec::as_slice)
    }

    /// Returns the ancestors of a table, nearest first. The table itself is
    /// not included.
    #[must_use]
    pub fn ancestors(&self, table: TableId) -> SmallVec<[TableId; 4]> {
        let mut ancestors = SmallVec::new();
        let mut current = self.table(table).and_then(|t| t.parent);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.table(id).and_then(|t| t.parent);
        }
        ancestors
    }

    /// Returns the number of ancestors of a table; 0 for a group root.
    #[must_use]
    pub fn depth(&self, table: TableId) -> usize {
        self.ancestors(table).len()
    }

    /// Returns true if `ancestor` is a proper ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: TableId, descendant: TableId) -> bool {
        self.ancestors(descendant).contains(&ancestor)
    }

    /// Returns the table indexes declared on a table.
    pub fn table_indexes(&self, table: TableId) -> impl Iterator<Item = &Index> {
        self.table_indexes
            .get(table.index())
            .into_iter()
            .flatten()
            .filter_map(|id| self.index(*id))
    }

    /// Returns the group indexes of a group.
    pub fn group_indexes(&self, group: GroupId) -> impl Iterator<Item = &Index> {
        self.group_indexes
            .get(group.index())
            .into_iter()
            .flatten()
            .filter_map(|id| self.index(*id))
    }

    /// Returns the tables of a group in declaration order.
    pub fn group_tables(&self, group: GroupId) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(move |t| t.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coi() -> Schema {
        let mut builder = Schema::builder();
        builder
            .add_table("customers", &["cid", "name"], None)
            .unwrap();
        builder
            .add_table("orders", &["oid", "cid", "order_date"], Some("customers"))
            .unwrap();
        builder
            .add_table("items", &["iid", "oid", "sku"], Some("orders"))
            .unwrap();
        builder
            .add_table("addresses", &["aid", "cid", "state"], Some("customers"))
            .unwrap();
        builder
            .add_index("customers", "PRIMARY", &["cid"], true)
            .unwrap();
        builder
            .add_index("items", "sku", &["sku"], false)
            .unwrap();
        builder
            .add_group_index("sku_and_date", &[("items", "sku"), ("orders", "order_date")])
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_tables_and_groups() {
        let schema = coi();
        assert_eq!(schema.tables().len(), 4);
        assert_eq!(schema.groups().len(), 1);
        let items = schema.table_by_name("items").unwrap();
        let customers = schema.table_by_name("customers").unwrap();
        assert_eq!(items.group(), customers.group());
        assert!(customers.is_root());
        assert_eq!(schema.group(items.group()).unwrap().root(), customers.id());
    }

    #[test]
    fn test_ancestors_and_depth() {
        let schema = coi();
        let items = schema.table_by_name("items").unwrap().id();
        let orders = schema.table_by_name("orders").unwrap().id();
        let customers = schema.table_by_name("customers").unwrap().id();
        assert_eq!(schema.ancestors(items).as_slice(), &[orders, customers]);
        assert_eq!(schema.depth(items), 2);
        assert_eq!(schema.depth(customers), 0);
        assert!(schema.is_ancestor_of(customers, items));
        assert!(!schema.is_ancestor_of(items, customers));
        assert_eq!(schema.children(customers).len(), 2);
    }

    #[test]
    fn test_index_lookup() {
        let schema = coi();
        let sku = schema.index_by_name("items", "sku").unwrap();
        assert_eq!(sku.kind(), IndexKind::Table);
        assert_eq!(sku.key_column_count(), 1);

        let gi = schema.index_by_name("orders", "sku_and_date").unwrap();
        assert_eq!(gi.kind(), IndexKind::Group);
        assert_eq!(gi.leaf_table(), schema.table_by_name("items").unwrap().id());
        assert_eq!(schema.group_index_by_name("sku_and_date").unwrap().id(), gi.id());

        let customers = schema.table_by_name("customers").unwrap();
        assert_eq!(schema.table_indexes(customers.id()).count(), 1);
        assert_eq!(schema.group_indexes(customers.group()).count(), 1);
        assert!(schema.index_by_name("items", "missing").is_none());
    }

    #[test]
    fn test_require_unknown_ids() {
        let schema = coi();
        assert!(matches!(
            schema.require_table(TableId::new(99)),
            Err(Error::UnknownTable(_))
        ));
        assert!(matches!(
            schema.require_index(IndexId::new(99)),
            Err(Error::UnknownIndex(_))
        ));
    }
}
