// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement and clause payloads
//!
//! Payloads of statement-level and clause-level nodes. As with expressions,
//! sub-clauses are children of the node, not payload fields.
//!
//! ## Compound SELECT
//!
//! A compound statement is a right-leaning chain:
//!
//! ```text
//! SelectStatement(UNION ALL)
//! ├── SingleSelect            -- SELECT a FROM X
//! └── SelectStatement(None)
//!     └── SingleSelect        -- SELECT b FROM Y ORDER BY a
//! ```
//!
//! The ORDER BY and LIMIT of the last branch apply to the whole compound
//! result; intermediate branches may not carry an ORDER BY.
//!
//! ## Relationship joins
//!
//! ```sql
//! SELECT * FROM ecsql.PSA JOIN ecsql.P USING ecsql.PSAHasP FORWARD
//! ```
//!
//! is a `RelationshipJoin` with children `[from, to, relationship]`. Which end
//! plays source and which plays target is fixed during analysis and recorded
//! in [`RelationshipJoin::resolved`].

use crate::metadata::ClassMap;
use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// UNION, INTERSECT, EXCEPT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompoundOperator {
    Union,
    Intersect,
    Except,
}

/// `ALL`/`DISTINCT` quantifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetQuantifier {
    #[default]
    NotSpecified,
    All,
    Distinct,
}

/// Payload of a `SelectStatement` node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSelect {
    /// Operator joining the first child to the second, when present
    pub operator: Option<CompoundOperator>,
    pub all: bool,
}

/// One `name(cols) AS (select)` block of a WITH clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonTableBlock {
    pub name: String,
    pub columns: Vec<String>,
}

impl CommonTableBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Builder method: declared column list
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// A SELECT-list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedProperty {
    pub alias: Option<String>,
}

/// What a class name in a FROM clause turned out to denote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassRefTarget {
    Class(Arc<ClassMap>),
    /// A CTE block visible from the reference
    CommonTable(NodeId),
}

/// A class reference: `[ONLY] [schema.]Class [alias]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNameRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub polymorphic: bool,
    pub resolved: Option<ClassRefTarget>,
}

impl ClassNameRef {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
            alias: None,
            polymorphic: true,
            resolved: None,
        }
    }

    /// Builder method: range alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Builder method: `ONLY`
    pub fn only(mut self) -> Self {
        self.polymorphic = false;
        self
    }

    /// Name other clauses use to qualify properties of this range
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn class_map(&self) -> Option<&Arc<ClassMap>> {
        match &self.resolved {
            Some(ClassRefTarget::Class(class)) => Some(class),
            _ => None,
        }
    }
}

/// Join kinds of ordinary joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

/// Direction written after `USING relationship`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JoinDirection {
    #[default]
    Implied,
    Forward,
    Backward,
}

/// Range nodes that play the relationship's source and target ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEnds {
    pub source: NodeId,
    pub target: NodeId,
}

/// Payload of a `RelationshipJoin` node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipJoin {
    pub direction: JoinDirection,
    pub resolved: Option<RelationshipEnds>,
}

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    NotSpecified,
    Ascending,
    Descending,
}

/// One `name[=value]` entry of an `ECSQLOPTIONS` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub name: String,
    pub value: Option<String>,
}

impl OptionEntry {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// Frame units of a window frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameUnits {
    Rows,
    Range,
    Groups,
}

/// Window frame bound. `Preceding` and `Following` take an offset child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding,
    CurrentRow,
    Following,
    UnboundedFollowing,
}

impl FrameBound {
    pub fn has_offset(self) -> bool {
        matches!(self, Self::Preceding | Self::Following)
    }
}

/// `ROWS BETWEEN start AND end`, or `ROWS start` when `end` is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

/// Payload of a `WindowFunction` node: `fn(...) OVER name` or `OVER (spec)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub window_name: Option<String>,
}
