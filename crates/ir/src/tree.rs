// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Expression tree
//!
//! The parser hands over an [`ExpTree`]: an arena of [`Node`]s addressed by
//! [`NodeId`]. Each node owns an ordered list of child ids and keeps a plain
//! id of its parent for ancestor lookups ("find the enclosing SELECT").
//!
//! Node kinds form the closed enum [`Exp`]. Child conventions per kind:
//!
//! | kind | children |
//! |---|---|
//! | `SelectStatement` | `SingleSelect`, then the right-hand `SelectStatement` of a compound |
//! | `SingleSelect` | `Selection`, `From`?, `Where`?, `GroupBy`?, `Having`?, `WindowClause`?, `OrderBy`?, `LimitOffset`?, `Options`? |
//! | `CommonTable` | `CommonTableBlock`+, then `SelectStatement` |
//! | `CommonTableBlock` | `SelectStatement` |
//! | `Update` | `ClassName`, `AssignmentList`, `Where`?, `Options`? |
//! | `Insert` | `ClassName`, `PropertyNameList`?, `ValueList` |
//! | `Delete` | `ClassName`, `Where`?, `Options`? |
//! | `Selection` | `DerivedProperty`* |
//! | `From` | range entries: `ClassName`, `SubqueryRef`, `Join`, `RelationshipJoin` |
//! | `Join` | left, right, ON condition? |
//! | `RelationshipJoin` | from, to `ClassName`, relationship `ClassName` |
//! | `SubqueryRef`, `Exists` | `Subquery` |
//! | `Subquery` | `SelectStatement` or `CommonTable` |
//! | `OrderBy` | `OrderBySpec`* |
//! | `LimitOffset` | limit, offset? |
//! | `WindowClause` | `NamedWindow`* (each with a `WindowSpec`) |
//! | `WindowSpec` | `WindowPartition`?, `OrderBy`?, `WindowFrame`? |
//! | `WindowFunction` | `FunctionCall`, `WindowSpec`? |
//! | `BinaryBoolean` | lhs, rhs (`ValueList`/`Subquery` for IN, `BetweenRange`, `LikeEscape`) |
//!
//! ## Write-once fields
//!
//! The resolved type and the render alias of a node are filled in during
//! analysis and can be set only once. Attempting to set them again is a
//! [`TreeError`].

use crate::error::{TreeError, TreeResult};
use crate::expr::{
    BinaryValueOperator, BooleanOperator, FunctionCall, Literal, Parameter, PropertyName,
    UnaryValueOperator,
};
use crate::query::{
    ClassNameRef, CommonTableBlock, CompoundSelect, DerivedProperty, JoinKind, OptionEntry,
    RelationshipJoin, SetQuantifier, SortDirection, WindowFrame, WindowFunction,
};
use crate::types::{PrimitiveType, TypeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of a node in its [`ExpTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Exp {
    // Statements
    SelectStatement(CompoundSelect),
    SingleSelect(SetQuantifier),
    CommonTable { recursive: bool },
    CommonTableBlock(CommonTableBlock),
    Insert,
    Update,
    Delete,

    // Clauses
    Selection,
    DerivedProperty(DerivedProperty),
    From,
    ClassName(ClassNameRef),
    SubqueryRef { alias: Option<String> },
    Join(JoinKind),
    RelationshipJoin(RelationshipJoin),
    Where,
    GroupBy,
    Having,
    OrderBy,
    OrderBySpec(SortDirection),
    LimitOffset,
    AssignmentList,
    Assignment,
    PropertyNameList,
    Options(Vec<OptionEntry>),
    WindowClause,
    NamedWindow { name: String },
    WindowSpec { base: Option<String> },
    WindowPartition,
    WindowFrame(WindowFrame),
    WindowFunction(WindowFunction),

    // Values
    BinaryBoolean(BooleanOperator),
    Not,
    BinaryValue(BinaryValueOperator),
    UnaryValue(UnaryValueOperator),
    Literal(Literal),
    Parameter(Parameter),
    PropertyName(PropertyName),
    FunctionCall(FunctionCall),
    Cast(PrimitiveType),
    ValueList,
    BetweenRange,
    LikeEscape,
    Subquery,
    Exists,
}

impl Exp {
    /// Human-readable kind name, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Exp::SelectStatement(_) => "SELECT statement",
            Exp::SingleSelect(_) => "SELECT",
            Exp::CommonTable { .. } => "WITH",
            Exp::CommonTableBlock(_) => "common table",
            Exp::Insert => "INSERT",
            Exp::Update => "UPDATE",
            Exp::Delete => "DELETE",
            Exp::Selection => "select list",
            Exp::DerivedProperty(_) => "derived property",
            Exp::From => "FROM",
            Exp::ClassName(_) => "class name",
            Exp::SubqueryRef { .. } => "subquery reference",
            Exp::Join(_) => "JOIN",
            Exp::RelationshipJoin(_) => "relationship JOIN",
            Exp::Where => "WHERE",
            Exp::GroupBy => "GROUP BY",
            Exp::Having => "HAVING",
            Exp::OrderBy => "ORDER BY",
            Exp::OrderBySpec(_) => "sort key",
            Exp::LimitOffset => "LIMIT",
            Exp::AssignmentList => "SET",
            Exp::Assignment => "assignment",
            Exp::PropertyNameList => "property list",
            Exp::Options(_) => "ECSQLOPTIONS",
            Exp::WindowClause => "WINDOW",
            Exp::NamedWindow { .. } => "named window",
            Exp::WindowSpec { .. } => "window specification",
            Exp::WindowPartition => "PARTITION BY",
            Exp::WindowFrame(_) => "window frame",
            Exp::WindowFunction(_) => "window function",
            Exp::BinaryBoolean(_) => "boolean expression",
            Exp::Not => "NOT",
            Exp::BinaryValue(_) => "binary expression",
            Exp::UnaryValue(_) => "unary expression",
            Exp::Literal(_) => "literal",
            Exp::Parameter(_) => "parameter",
            Exp::PropertyName(_) => "property name",
            Exp::FunctionCall(_) => "function call",
            Exp::Cast(_) => "CAST",
            Exp::ValueList => "value list",
            Exp::BetweenRange => "BETWEEN range",
            Exp::LikeEscape => "LIKE pattern",
            Exp::Subquery => "subquery",
            Exp::Exists => "EXISTS",
        }
    }

    /// FROM-list entries that property paths resolve against
    pub fn is_range_class(&self) -> bool {
        matches!(self, Exp::ClassName(_) | Exp::SubqueryRef { .. })
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Exp::Parameter(_))
    }

    pub fn as_property_name(&self) -> Option<&PropertyName> {
        match self {
            Exp::PropertyName(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_class_name(&self) -> Option<&ClassNameRef> {
        match self {
            Exp::ClassName(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_derived_property(&self) -> Option<&DerivedProperty> {
        match self {
            Exp::DerivedProperty(d) => Some(d),
            _ => None,
        }
    }
}

/// A node of the expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: Exp,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    has_parentheses: bool,
    render_alias: Option<String>,
    type_info: Option<TypeInfo>,
    finalized: bool,
}

impl Node {
    fn new(kind: Exp) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            has_parentheses: false,
            render_alias: None,
            type_info: None,
            finalized: false,
        }
    }

    pub fn kind(&self) -> &Exp {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_parentheses(&self) -> bool {
        self.has_parentheses
    }

    pub fn render_alias(&self) -> Option<&str> {
        self.render_alias.as_deref()
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

/// Arena holding one statement's expression tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl ExpTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Add a node owning `children`. Children are re-parented to the new node.
    pub fn add(&mut self, kind: Exp, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(kind);
        node.children = children.into_iter().collect();
        for child in &node.children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(node);
        id
    }

    /// Append a child to an existing node
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Node by id. Ids are only ever produced by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &Exp {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut Exp {
        &mut self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Nearest ancestor whose kind satisfies `pred`
    pub fn find_ancestor(&self, id: NodeId, pred: impl Fn(&Exp) -> bool) -> Option<NodeId> {
        self.ancestors(id).find(|&a| pred(self.kind(a)))
    }

    /// First child whose kind satisfies `pred`
    pub fn find_child(&self, id: NodeId, pred: impl Fn(&Exp) -> bool) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| pred(self.kind(c)))
    }

    /// Subtree in pre-order, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn set_parentheses(&mut self, id: NodeId, value: bool) {
        self.nodes[id.index()].has_parentheses = value;
    }

    pub fn type_info(&self, id: NodeId) -> Option<&TypeInfo> {
        self.node(id).type_info.as_ref()
    }

    /// Record the resolved type. Fails if a type was already recorded.
    pub fn set_type(&mut self, id: NodeId, type_info: TypeInfo) -> TreeResult<()> {
        let node = self.nodes.get_mut(id.index()).ok_or(TreeError::InvalidNode(id))?;
        if node.type_info.is_some() {
            return Err(TreeError::TypeAlreadyResolved(id));
        }
        node.type_info = Some(type_info);
        Ok(())
    }

    pub fn render_alias(&self, id: NodeId) -> Option<&str> {
        self.node(id).render_alias.as_deref()
    }

    /// Record the alias used when rendering this node. Fails if already assigned.
    pub fn set_render_alias(&mut self, id: NodeId, alias: impl Into<String>) -> TreeResult<()> {
        let node = self.nodes.get_mut(id.index()).ok_or(TreeError::InvalidNode(id))?;
        if node.render_alias.is_some() {
            return Err(TreeError::AliasAlreadyAssigned(id));
        }
        node.render_alias = Some(alias.into());
        Ok(())
    }

    pub fn is_finalized(&self, id: NodeId) -> bool {
        self.node(id).finalized
    }

    pub fn mark_finalized(&mut self, id: NodeId) {
        self.nodes[id.index()].finalized = true;
    }

    /// Replace `old` among `parent`'s children with `replacement`, in place.
    /// `old` is detached but stays in the arena.
    pub fn splice_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        replacement: Vec<NodeId>,
    ) -> TreeResult<()> {
        let position = self
            .children(parent)
            .iter()
            .position(|&c| c == old)
            .ok_or(TreeError::NotAChild { parent, child: old })?;
        for &child in &replacement {
            self.nodes[child.index()].parent = Some(parent);
        }
        self.nodes[old.index()].parent = None;
        self.nodes[parent.index()]
            .children
            .splice(position..=position, replacement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyPath;

    fn property(tree: &mut ExpTree, path: &str) -> NodeId {
        tree.add(
            Exp::PropertyName(PropertyName::new(PropertyPath::parse(path))),
            [],
        )
    }

    #[test]
    fn test_add_sets_parent_links() {
        let mut tree = ExpTree::new();
        let a = property(&mut tree, "a");
        let b = tree.add(Exp::Literal(Literal::Long(1)), []);
        let cmp = tree.add(Exp::BinaryBoolean(BooleanOperator::Eq), [a, b]);
        let where_clause = tree.add(Exp::Where, [cmp]);

        assert_eq!(tree.parent(a), Some(cmp));
        assert_eq!(tree.children(cmp), &[a, b]);
        assert_eq!(tree.ancestors(a).collect::<Vec<_>>(), vec![cmp, where_clause]);
        assert_eq!(
            tree.find_ancestor(b, |k| matches!(k, Exp::Where)),
            Some(where_clause)
        );
        assert_eq!(tree.descendants(where_clause), vec![where_clause, cmp, a, b]);
    }

    #[test]
    fn test_type_is_write_once() {
        let mut tree = ExpTree::new();
        let a = property(&mut tree, "a");
        tree.set_type(a, TypeInfo::long()).unwrap();
        assert_eq!(
            tree.set_type(a, TypeInfo::double()),
            Err(TreeError::TypeAlreadyResolved(a))
        );
        assert_eq!(tree.type_info(a), Some(&TypeInfo::long()));
    }

    #[test]
    fn test_render_alias_is_write_once() {
        let mut tree = ExpTree::new();
        let a = property(&mut tree, "a");
        tree.set_render_alias(a, "K0").unwrap();
        assert!(tree.set_render_alias(a, "K1").is_err());
        assert_eq!(tree.render_alias(a), Some("K0"));
    }

    #[test]
    fn test_splice_child() {
        let mut tree = ExpTree::new();
        let star = property(&mut tree, "*");
        let last = property(&mut tree, "z");
        let selection = tree.add(Exp::Selection, [star, last]);
        let x = property(&mut tree, "x");
        let y = property(&mut tree, "y");

        tree.splice_child(selection, star, vec![x, y]).unwrap();
        assert_eq!(tree.children(selection), &[x, y, last]);
        assert_eq!(tree.parent(x), Some(selection));
        assert_eq!(tree.parent(star), None);
        assert!(tree.splice_child(selection, star, vec![]).is_err());
    }
}
