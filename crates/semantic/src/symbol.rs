// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Range classes
//!
//! This module defines the symbol type for FROM-list entries that property
//! paths resolve against: class references, subqueries and CTE references.

use ecsql_ir::{ClassMap, ClassRefTarget, Exp, ExpTree, NodeId, RangeScope};
use std::sync::Arc;

/// What a range class reads from
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSource {
    /// A class of the schema
    Class(Arc<ClassMap>),
    /// A FROM subquery; holds the statement node inside it
    Subquery(NodeId),
    /// A reference to a CTE; holds the `CommonTableBlock` node
    CommonTable(NodeId),
}

/// A FROM-list entry visible to property resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RangeClassInfo {
    /// The `ClassName` or `SubqueryRef` node
    pub node: NodeId,

    /// Whether the entry belongs to the statement being finalized or to an
    /// enclosing one
    pub scope: RangeScope,

    /// Class or CTE name as written; empty for subqueries
    pub name: String,

    /// Schema prefix as written
    pub schema: Option<String>,

    /// Range alias (e.g., "a" for "FROM ecsql.PSA a")
    pub alias: Option<String>,

    pub source: RangeSource,
}

impl RangeClassInfo {
    /// Create a local range class
    ///
    /// # Examples
    ///
    /// ```
    /// use ecsql_ir::{ClassKey, ClassMap, ClassNameRef, ExpTree};
    /// use ecsql_semantic::{RangeClassInfo, RangeSource};
    /// use std::sync::Arc;
    ///
    /// let mut tree = ExpTree::new();
    /// let node = tree.class_name(ClassNameRef::new(None, "PSA"));
    /// let class = Arc::new(ClassMap::entity(1, ClassKey::new("ecsql", "PSA"), "ecsql_PSA"));
    ///
    /// let range = RangeClassInfo::new(node, "PSA", RangeSource::Class(class)).with_alias("a");
    /// assert_eq!(range.display_name(), Some("a"));
    /// assert!(range.matches("A"));
    /// assert!(!range.matches("PSA"));
    /// ```
    pub fn new(node: NodeId, name: impl Into<String>, source: RangeSource) -> Self {
        Self {
            node,
            scope: RangeScope::Local,
            name: name.into(),
            schema: None,
            alias: None,
            source,
        }
    }

    /// Set an alias for this range
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Build the range for a resolved `ClassName` or a `SubqueryRef` node
    ///
    /// Returns `None` for other nodes and for unresolved class names.
    pub fn from_node(tree: &ExpTree, node: NodeId) -> Option<Self> {
        match tree.kind(node) {
            Exp::ClassName(class) => {
                let source = match class.resolved.as_ref()? {
                    ClassRefTarget::Class(map) => RangeSource::Class(Arc::clone(map)),
                    ClassRefTarget::CommonTable(block) => RangeSource::CommonTable(*block),
                };
                Some(Self {
                    node,
                    scope: RangeScope::Local,
                    name: class.name.clone(),
                    schema: class.schema.clone(),
                    alias: class.alias.clone(),
                    source,
                })
            }
            Exp::SubqueryRef { alias } => {
                let subquery = tree.child(node, 0)?;
                let statement = tree.child(subquery, 0)?;
                Some(Self {
                    node,
                    scope: RangeScope::Local,
                    name: String::new(),
                    schema: None,
                    alias: alias.clone(),
                    source: RangeSource::Subquery(statement),
                })
            }
            _ => None,
        }
    }

    /// Name that qualifies properties of this range: the alias, else the
    /// class or CTE name. Unaliased subqueries have none.
    pub fn display_name(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .or_else(|| (!self.name.is_empty()).then_some(self.name.as_str()))
    }

    /// Case-insensitive match against the display name
    pub fn matches(&self, qualifier: &str) -> bool {
        self.display_name()
            .is_some_and(|name| name.eq_ignore_ascii_case(qualifier))
    }

    /// Match `schema.Class` against an unaliased class range
    pub fn matches_qualified(&self, schema: &str, name: &str) -> bool {
        if self.alias.is_some() || !self.name.eq_ignore_ascii_case(name) {
            return false;
        }
        let by_key = self
            .class_map()
            .is_some_and(|class| class.key.schema.eq_ignore_ascii_case(schema));
        let as_written = self
            .schema
            .as_deref()
            .is_some_and(|written| written.eq_ignore_ascii_case(schema));
        by_key || as_written
    }

    pub fn class_map(&self) -> Option<&Arc<ClassMap>> {
        match &self.source {
            RangeSource::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.scope == RangeScope::Local
    }

    /// The same range as seen from a nested statement
    pub fn inherited(&self) -> Self {
        Self {
            scope: RangeScope::Inherited,
            ..self.clone()
        }
    }
}
