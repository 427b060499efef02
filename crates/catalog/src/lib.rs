// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL - Class-Map Repository
//!
//! This crate defines the interface through which the ECSQL compiler consumes
//! compiled class-to-table mappings:
//!
//! - **[`ClassMapRepository`]**: class lookup by (schema, name), property lists,
//!   relationship constraints and the class hierarchy
//! - **[`InMemoryClassMapRepository`]**: a repository over a fixed set of class
//!   maps registered in code
//!
//! The metadata types themselves ([`ClassMap`], [`PropertyMap`], ...) live in
//! `ecsql-ir` so that resolved trees can carry them; they are re-exported here.
//!
//! ## Implementing the repository
//!
//! ```rust,ignore
//! use ecsql_catalog::{CatalogResult, ClassMapRepository};
//! use ecsql_ir::{ClassKey, ClassMap};
//! use std::sync::Arc;
//!
//! struct MyRepository;
//!
//! impl ClassMapRepository for MyRepository {
//!     fn resolve_class(&self, schema: Option<&str>, name: &str) -> CatalogResult<Arc<ClassMap>> {
//!         // Your implementation here
//!     }
//!
//!     fn derived_classes(&self, class: &ClassKey) -> CatalogResult<Vec<Arc<ClassMap>>> {
//!         // Your implementation here
//!     }
//! }
//! ```

pub mod error;
pub mod memory;
pub mod r#trait;

// Re-exports
pub use ecsql_ir::{
    ClassKey, ClassKind, ClassMap, PropertyMap, RelationshipConstraint, RelationshipMap,
};
pub use error::{CatalogError, CatalogResult};
pub use memory::InMemoryClassMapRepository;
pub use r#trait::ClassMapRepository;
