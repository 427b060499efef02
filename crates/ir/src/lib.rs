// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL - Expression Tree
//!
//! This crate provides the tree that an ECSQL parser produces and that the
//! semantic analyzer and renderers operate on:
//! - An arena of expression nodes with write-once type and alias slots
//! - The EC type model and its comparability rules
//! - Property paths and their resolved form
//! - Class-map metadata describing how classes map onto backing tables

pub mod builder;
pub mod error;
pub mod expr;
pub mod metadata;
pub mod path;
pub mod query;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use builder::SelectClauses;
pub use error::{TreeError, TreeResult};
pub use expr::{
    BinaryValueOperator, BooleanOperator, DateTimeKind, FunctionCall, Literal, Parameter,
    PropertyName, UnaryValueOperator,
};
pub use metadata::{
    ClassKey, ClassKind, ClassMap, ECCLASSID, ECINSTANCEID, PropertyMap, RelationshipConstraint,
    RelationshipMap, SOURCE_ECCLASSID, SOURCE_ECINSTANCEID, TARGET_ECCLASSID, TARGET_ECINSTANCEID,
};
pub use path::{PropertyPath, PropertyTarget, RangeScope, ResolvedProperty};
pub use query::{
    ClassNameRef, ClassRefTarget, CommonTableBlock, CompoundOperator, CompoundSelect,
    DerivedProperty, FrameBound, FrameUnits, JoinDirection, JoinKind, OptionEntry,
    RelationshipEnds, RelationshipJoin, SetQuantifier, SortDirection, WindowFrame,
    WindowFunction,
};
pub use tree::{Exp, ExpTree, Node, NodeId};
pub use types::{MemberLayout, PrimitiveType, StructMember, StructType, TypeInfo};
