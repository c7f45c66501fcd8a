//! Join trees over one table group.
//!
//! Nodes live in an arena and refer to each other by [`JoinNodeId`]. A
//! tree always mirrors the ancestor/descendant structure of the schema: a
//! node's parent is a schema ancestor of its table.

use std::fmt;

use groupcost_common::{Error, GroupId, Result, TableId};
use groupcost_core::Schema;
use smallvec::SmallVec;

/// Handle of a node in a [`TableGroupJoinTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinNodeId(u32);

impl JoinNodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JoinNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct JoinNode {
    table: TableId,
    parent: Option<JoinNodeId>,
    first_child: Option<JoinNodeId>,
    next_sibling: Option<JoinNodeId>,
}

/// The tables of one group taking part in a query, arranged as the group
/// clusters them.
#[derive(Debug, Clone)]
pub struct TableGroupJoinTree {
    group: GroupId,
    nodes: Vec<JoinNode>,
}

impl TableGroupJoinTree {
    /// Creates a tree with a single root node.
    pub fn new(schema: &Schema, root: TableId) -> Result<Self> {
        let table = schema.require_table(root)?;
        Ok(Self {
            group: table.group(),
            nodes: vec![JoinNode {
                table: root,
                parent: None,
                first_child: None,
                next_sibling: None,
            }],
        })
    }

    /// Builds the smallest tree rooted at the group root that contains
    /// `tables` and all of their ancestors.
    pub fn for_tables(schema: &Schema, tables: &[TableId]) -> Result<Self> {
        let Some(first) = tables.first() else {
            return Err(Error::MalformedJoinTree("no tables".to_string()));
        };
        let group = schema.require_table(*first)?.group();
        let root = schema
            .group(group)
            .ok_or_else(|| Error::UnknownGroup(group.to_string()))?
            .root();

        let mut tree = Self::new(schema, root)?;
        for &table in tables {
            if schema.require_table(table)?.group() != group {
                return Err(Error::MalformedJoinTree(format!(
                    "{} is not in group {}",
                    schema.table_name(table),
                    schema.table_name(root)
                )));
            }
            let mut path: SmallVec<[TableId; 4]> = schema.ancestors(table);
            path.reverse();
            path.push(table);
            let mut parent = tree.root();
            for &t in path.iter().skip(1) {
                parent = match tree.find_child(parent, t) {
                    Some(node) => node,
                    None => tree.add_child(schema, parent, t)?,
                };
            }
        }
        Ok(tree)
    }

    /// Adds `table` as the last child of `parent`.
    ///
    /// Fails if `parent` is not a node of this tree, if `table` is already
    /// in the tree, or if `parent`'s table is not a schema ancestor of
    /// `table`.
    pub fn add_child(
        &mut self,
        schema: &Schema,
        parent: JoinNodeId,
        table: TableId,
    ) -> Result<JoinNodeId> {
        let parent_table = self
            .nodes
            .get(parent.index())
            .map(|n| n.table)
            .ok_or_else(|| Error::MalformedJoinTree(format!("no node {parent}")))?;
        schema.require_table(table)?;
        if self.find(table).is_some() {
            return Err(Error::MalformedJoinTree(format!(
                "{} appears twice",
                schema.table_name(table)
            )));
        }
        if !schema.is_ancestor_of(parent_table, table) {
            return Err(Error::MalformedJoinTree(format!(
                "{} is not an ancestor of {}",
                schema.table_name(parent_table),
                schema.table_name(table)
            )));
        }

        let id = JoinNodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| Error::MalformedJoinTree("too many nodes".to_string()))?,
        );
        self.nodes.push(JoinNode {
            table,
            parent: Some(parent),
            first_child: None,
            next_sibling: None,
        });
        let last = self.children(parent).last();
        match last {
            Some(last) => self.nodes[last.index()].next_sibling = Some(id),
            None => self.nodes[parent.index()].first_child = Some(id),
        }
        Ok(id)
    }

    /// The group the tree covers.
    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> JoinNodeId {
        JoinNodeId(0)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Table of a node.
    #[must_use]
    pub fn table(&self, node: JoinNodeId) -> TableId {
        self.nodes[node.index()].table
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, node: JoinNodeId) -> Option<JoinNodeId> {
        self.nodes[node.index()].parent
    }

    /// First child of a node.
    #[must_use]
    pub fn first_child(&self, node: JoinNodeId) -> Option<JoinNodeId> {
        self.nodes[node.index()].first_child
    }

    /// Next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, node: JoinNodeId) -> Option<JoinNodeId> {
        self.nodes[node.index()].next_sibling
    }

    /// Children of a node in insertion order.
    pub fn children(&self, node: JoinNodeId) -> impl Iterator<Item = JoinNodeId> + '_ {
        std::iter::successors(self.first_child(node), move |c| self.next_sibling(*c))
    }

    /// The node and its ancestors, nearest first.
    pub fn path_to_root(&self, node: JoinNodeId) -> impl Iterator<Item = JoinNodeId> + '_ {
        std::iter::successors(Some(node), move |n| self.parent(*n))
    }

    /// All nodes in pre-order.
    #[must_use]
    pub fn iter(&self) -> Vec<JoinNodeId> {
        self.subtree(self.root())
    }

    /// `node` and its descendants in pre-order.
    #[must_use]
    pub fn subtree(&self, node: JoinNodeId) -> Vec<JoinNodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            order.push(n);
            let children: SmallVec<[JoinNodeId; 4]> = self.children(n).collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Descendants of `node` in pre-order, excluding `node`.
    #[must_use]
    pub fn descendants(&self, node: JoinNodeId) -> Vec<JoinNodeId> {
        let mut nodes = self.subtree(node);
        nodes.remove(0);
        nodes
    }

    /// Node holding `table`.
    #[must_use]
    pub fn find(&self, table: TableId) -> Option<JoinNodeId> {
        self.nodes
            .iter()
            .position(|n| n.table == table)
            .map(|i| JoinNodeId(i as u32))
    }

    /// Node holding `table`, failing if it is not in the tree.
    pub fn require(&self, schema: &Schema, table: TableId) -> Result<JoinNodeId> {
        self.find(table)
            .ok_or_else(|| Error::TableNotInJoinTree(schema.table_name(table)))
    }

    /// Returns true if `ancestor` is a proper ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: JoinNodeId, node: JoinNodeId) -> bool {
        self.path_to_root(node).skip(1).any(|n| n == ancestor)
    }

    fn find_child(&self, parent: JoinNodeId, table: TableId) -> Option<JoinNodeId> {
        self.children(parent).find(|c| self.table(*c) == table)
    }
}
