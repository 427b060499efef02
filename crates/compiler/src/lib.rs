// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL Compiler
//!
//! Compiles the expression tree of a parsed ECSQL statement into SQL for the
//! backing engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Parser (external, ExpTree)       │
//! └──────────────┬──────────────────────────┘
//!                │
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │        EcsqlCompiler (this crate)       │
//! ├─────────────────────────────────────────┤
//! │  • semantic analysis (ecsql-semantic)   │
//! │  • parameter layout   (ecsql-codegen)   │
//! │  • native SQL / ECSQL (ecsql-codegen)   │
//! └──────────────┬──────────────────────────┘
//!                │
//!         ┌──────┴──────┐
//!         ↓             ↓
//! ┌──────────────┐ ┌──────────────┐
//! │ ClassMap     │ │ Function     │
//! │ Repository   │ │ Registry     │
//! └──────────────┘ └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use ecsql_catalog::InMemoryClassMapRepository;
//! use ecsql_compiler::{CompileOptions, EcsqlCompiler};
//! use ecsql_ir::{ClassKey, ClassMap, ClassNameRef, ExpTree, PrimitiveType, PropertyMap, SelectClauses};
//! use std::sync::Arc;
//!
//! let p = ClassMap::entity(101, ClassKey::new("ecsql", "P"), "ecsql_P")
//!     .with_property(PropertyMap::primitive("I", PrimitiveType::Integer));
//! let repository = InMemoryClassMapRepository::new().with_class(p).unwrap();
//! let compiler = EcsqlCompiler::new(Arc::new(repository), CompileOptions::default());
//!
//! // UPDATE ecsql.P SET I = ?
//! let mut tree = ExpTree::new();
//! let class = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
//! let target = tree.property("I");
//! let value = tree.parameter(None);
//! let root = tree.update(class, vec![(target, value)], None, vec![]);
//! tree.set_root(root);
//!
//! let compiled = compiler.compile(tree).unwrap();
//! assert_eq!(compiled.native_sql, "UPDATE [ecsql_P] SET [I] = ?1");
//! assert_eq!(compiled.parameters[0].sql_indices, vec![1]);
//! ```

pub mod compiler;
pub mod error;
pub mod options;
pub mod statement;

pub use compiler::EcsqlCompiler;
pub use error::{CompileError, CompileResult};
pub use options::{CompileOptions, StatementOptions};
pub use statement::{CompiledStatement, ParameterBinding};

pub use ecsql_semantic::{AnalyzerConfig, Diagnostics, Issue, IssueCategory, Severity};
