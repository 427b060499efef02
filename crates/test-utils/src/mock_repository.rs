// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock class-map repositories for testing
//!
//! Provides a builder over [`InMemoryClassMapRepository`] for easy test setup.

use crate::fixtures::{STANDARD_SCHEMA, load_classes};
use ecsql_catalog::InMemoryClassMapRepository;
use ecsql_compiler::{CompileOptions, EcsqlCompiler};
use ecsql_ir::ClassMap;
use std::sync::Arc;

/// Builder for creating mock repositories with a fluent API
#[derive(Debug, Default)]
pub struct MockRepositoryBuilder {
    classes: Vec<ClassMap>,
    aliases: Vec<(String, String)>,
}

impl MockRepositoryBuilder {
    /// Create a new, empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the standard `ecsql` test schema
    pub fn with_standard_schema(mut self) -> Self {
        let (alias, classes) =
            load_classes(STANDARD_SCHEMA).unwrap_or_else(|e| panic!("bad schema fixture: {e}"));
        self.aliases.extend(alias);
        self.classes.extend(classes);
        self
    }

    /// Add a single class
    pub fn with_class(mut self, class: ClassMap) -> Self {
        self.classes.push(class);
        self
    }

    /// Build the repository
    ///
    /// Panics if a class is registered twice.
    pub fn build(self) -> Arc<InMemoryClassMapRepository> {
        let mut repository = InMemoryClassMapRepository::new();
        for (alias, schema) in self.aliases {
            repository = repository.with_schema_alias(alias, schema);
        }
        for class in self.classes {
            if let Err(e) = repository.register(class) {
                panic!("bad mock repository: {e}");
            }
        }
        Arc::new(repository)
    }

    /// Build a compiler over the repository with default options
    pub fn build_compiler(self) -> EcsqlCompiler {
        EcsqlCompiler::new(self.build(), CompileOptions::default())
    }
}

/// Repository holding the standard `ecsql` test schema
pub fn standard_repository() -> Arc<InMemoryClassMapRepository> {
    MockRepositoryBuilder::new().with_standard_schema().build()
}

/// Compiler over the standard `ecsql` test schema
pub fn standard_compiler() -> EcsqlCompiler {
    MockRepositoryBuilder::new().with_standard_schema().build_compiler()
}
