// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for the ECSQL compiler
//!
//! This crate provides common testing components including:
//! - The standard `ecsql` test schema as a YAML fixture
//! - Mock class-map repository builders
//! - Expression tree builders (there is no parser in the workspace)
//! - Compile-and-check assertions

pub mod assertions;
pub mod fixtures;
pub mod mock_repository;
pub mod trees;

// Re-exports for convenience
pub use assertions::{
    assert_compiles, assert_fails_with, assert_native_sql, parameter_types, selection_paths,
};
pub use fixtures::{FixtureError, STANDARD_SCHEMA, load_classes};
pub use mock_repository::{MockRepositoryBuilder, standard_compiler, standard_repository};
pub use trees::{TreeBuilder, class_ref, simple_select};
