// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tree builders for tests
//!
//! Tests have no parser, so statements are assembled with the [`ExpTree`]
//! builder methods. [`TreeBuilder`] derefs to the tree and adds shorthands
//! for the parts that are tedious to spell out: class references written as
//! text, SELECT lists from property paths and comparisons.
//!
//! ```rust
//! use ecsql_test_utils::TreeBuilder;
//! use ecsql_ir::{BooleanOperator, SelectClauses};
//!
//! // SELECT I, S FROM ecsql.PSA a WHERE a.L > ?
//! let mut b = TreeBuilder::new();
//! let items = b.items(&["I", "S"]);
//! let from = b.class("ecsql.PSA a");
//! let param = b.parameter(None);
//! let predicate = b.compare("a.L", BooleanOperator::Gt, param);
//! let tree = b.finish_select(SelectClauses::new(items, vec![from]).with_where(predicate));
//! assert!(tree.root().is_some());
//! ```

use ecsql_ir::{BooleanOperator, ClassNameRef, ExpTree, Literal, NodeId, SelectClauses};
use std::ops::{Deref, DerefMut};

/// An [`ExpTree`] with test shorthands
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: ExpTree,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class reference written as `[ONLY] [schema.]Class [alias]`
    pub fn class(&mut self, reference: &str) -> NodeId {
        let class = class_ref(reference);
        self.tree.class_name(class)
    }

    /// One non-aliased SELECT item per property path
    pub fn items(&mut self, paths: &[&str]) -> Vec<NodeId> {
        paths.iter().map(|path| self.item(path, None)).collect()
    }

    /// A SELECT item over a property path
    pub fn item(&mut self, path: &str, alias: Option<&str>) -> NodeId {
        let property = self.tree.property(path);
        self.tree.derived(property, alias)
    }

    /// `path op value`
    pub fn compare(&mut self, path: &str, op: BooleanOperator, value: NodeId) -> NodeId {
        let property = self.tree.property(path);
        self.tree.boolean(property, op, value)
    }

    pub fn long(&mut self, value: i64) -> NodeId {
        self.tree.literal(Literal::Long(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.tree.literal(Literal::String(value.to_string()))
    }

    /// Build a SELECT statement from clauses and make it the root
    pub fn select_statement(&mut self, clauses: SelectClauses) -> NodeId {
        let single = self.tree.single_select(clauses);
        self.tree.select(single)
    }

    /// Make `root` the root and return the tree
    pub fn finish(mut self, root: NodeId) -> ExpTree {
        self.tree.set_root(root);
        self.tree
    }

    /// Build a SELECT statement, make it the root and return the tree
    pub fn finish_select(mut self, clauses: SelectClauses) -> ExpTree {
        let root = self.select_statement(clauses);
        self.finish(root)
    }
}

impl Deref for TreeBuilder {
    type Target = ExpTree;

    fn deref(&self) -> &ExpTree {
        &self.tree
    }
}

impl DerefMut for TreeBuilder {
    fn deref_mut(&mut self) -> &mut ExpTree {
        &mut self.tree
    }
}

/// Parse `[ONLY] [schema.]Class [alias]`
pub fn class_ref(reference: &str) -> ClassNameRef {
    let mut words = reference.split_whitespace().peekable();
    let only = words.next_if(|w| w.eq_ignore_ascii_case("ONLY")).is_some();
    let name = words.next().unwrap_or_default();
    let mut class = match name.split_once('.') {
        Some((schema, class)) => ClassNameRef::new(Some(schema), class),
        None => ClassNameRef::new(None, name),
    };
    if let Some(alias) = words.next() {
        class = class.with_alias(alias);
    }
    if only {
        class = class.only();
    }
    class
}

/// `SELECT paths FROM class`
pub fn simple_select(paths: &[&str], class: &str) -> ExpTree {
    let mut b = TreeBuilder::new();
    let items = b.items(paths);
    let from = b.class(class);
    b.finish_select(SelectClauses::new(items, vec![from]))
}
