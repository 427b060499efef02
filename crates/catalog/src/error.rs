// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for class-map repository operations

use serde::Serialize;
use thiserror::Error;

/// Result type alias for repository operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while looking up class maps
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum CatalogError {
    /// No class of that name in the requested schema (or in any schema)
    #[error("Class '{}' not found", qualified(.schema, .name))]
    ClassNotFound { schema: Option<String>, name: String },

    /// Unqualified class name present in several schemas
    #[error("Class '{name}' is ambiguous, it exists in schemas {schemas:?}")]
    AmbiguousClass { name: String, schemas: Vec<String> },

    /// Relationship constraints requested for a non-relationship class
    #[error("Class '{0}' is not a relationship class")]
    NotARelationship(String),

    /// Inconsistent schema data handed to the repository
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

fn qualified(schema: &Option<String>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{schema}.{name}"),
        None => name.to_string(),
    }
}
