// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # ECSQL - Semantic Analysis Layer
//!
//! This crate turns the unresolved expression tree of a parsed ECSQL
//! statement into a finalized one that the renderers can translate.
//!
//! ## Overview
//!
//! Semantic analysis builds on the IR layer to provide:
//! - **Class binding**: FROM entries bound to class maps, CTE blocks or subqueries
//! - **Property resolution**: dotted paths matched against the range classes in scope
//! - **Type checking**: operator, assignment and clause-shape rules
//! - **Parameters**: 1-based indexes and types inferred from their position
//!
//! ## Core Concepts
//!
//! ### Range classes and scopes
//!
//! Every FROM entry becomes a [`RangeClassInfo`]. While a SELECT is being
//! finalized its ranges, plus those of the enclosing statement, form the top
//! [`ScopeArg`] of the [`ResolutionContext`]; nested subqueries see the outer
//! ranges as inherited ones.
//!
//! ```rust
//! use ecsql_ir::{ClassKey, ClassMap, ClassNameRef, ExpTree};
//! use ecsql_semantic::{RangeClassInfo, RangeSource, ScopeArg};
//! use std::sync::Arc;
//!
//! let mut tree = ExpTree::new();
//! let node = tree.class_name(ClassNameRef::new(None, "PSA").with_alias("a"));
//! let class = Arc::new(ClassMap::entity(1, ClassKey::new("ecsql", "PSA"), "ecsql_PSA"));
//! let range = RangeClassInfo::new(node, "PSA", RangeSource::Class(class)).with_alias("a");
//!
//! let scope = ScopeArg::ranges(vec![range]);
//! assert!(scope.find_range("A").is_some());
//! ```
//!
//! ### Analysis
//!
//! ```rust
//! use ecsql_catalog::InMemoryClassMapRepository;
//! use ecsql_ir::{
//!     BooleanOperator, ClassKey, ClassMap, ClassNameRef, ExpTree, PrimitiveType, PropertyMap,
//!     SelectClauses, TypeInfo,
//! };
//! use ecsql_semantic::{AnalyzerConfig, SemanticAnalyzer};
//! use std::sync::Arc;
//!
//! let psa = ClassMap::entity(100, ClassKey::new("ecsql", "PSA"), "ecsql_PSA")
//!     .with_property(PropertyMap::primitive("I", PrimitiveType::Integer));
//! let repository = InMemoryClassMapRepository::new().with_class(psa).unwrap();
//! let analyzer = SemanticAnalyzer::new(Arc::new(repository), AnalyzerConfig::default());
//!
//! // SELECT I FROM ecsql.PSA WHERE I = :i
//! let mut tree = ExpTree::new();
//! let i = tree.property("I");
//! let item = tree.derived(i, None);
//! let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "PSA"));
//! let lhs = tree.property("I");
//! let param = tree.parameter(Some("i"));
//! let predicate = tree.boolean(lhs, BooleanOperator::Eq, param);
//! let single = tree.single_select(SelectClauses::new(vec![item], vec![from]).with_where(predicate));
//! let root = tree.select(single);
//! tree.set_root(root);
//!
//! let analysis = analyzer.analyze(&mut tree).unwrap();
//! assert_eq!(analysis.parameters[0].type_info, TypeInfo::primitive(PrimitiveType::Integer));
//! ```

pub mod analyzer;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
mod finalize;
pub mod join;
pub mod resolution;
pub mod scope;
pub mod symbol;
pub mod typecheck;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use analyzer::{Analysis, SemanticAnalyzer};
pub use config::AnalyzerConfig;
pub use context::{ConstraintClasses, ResolutionContext, TrackedParameter};
pub use diagnostics::{Diagnostics, Issue, IssueCategory, Severity};
pub use error::{SemanticError, SemanticResult};
pub use finalize::params::ParameterInfo;
pub use join::resolve_relationship_join;
pub use resolution::{OutputColumn, PropertyMatch, resolve_link, resolve_property};
pub use scope::{ScopeArg, ScopeGuard};
pub use symbol::{RangeClassInfo, RangeSource};
pub use typecheck::{Operand, check_assignment, check_operator};
