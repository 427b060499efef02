// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::{FunctionMetadata, builtin};

/// Function registry for ECSQL functions
///
/// Holds the builtin functions plus any functions the host registers.
/// Lookup is case-insensitive; a host function shadows a builtin of the
/// same name.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionMetadata>,
}

impl FunctionRegistry {
    /// Create a new function registry with all builtin functions loaded
    pub fn new() -> Self {
        Self {
            functions: builtin::ecsql::all_functions(),
        }
    }

    /// Builder method: register a host function
    pub fn with_function(mut self, function: FunctionMetadata) -> Self {
        self.functions.insert(0, function);
        self
    }

    /// All known functions
    pub fn functions(&self) -> &[FunctionMetadata] {
        &self.functions
    }

    /// Lookup a single function by name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let registry = FunctionRegistry::new();
    /// let count_func = registry.get_function("COUNT");
    /// assert_eq!(count_func.unwrap().name, "COUNT");
    /// ```
    pub fn get_function(&self, name: &str) -> Option<&FunctionMetadata> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Check if a function exists (case-insensitive)
    pub fn has_function(&self, name: &str) -> bool {
        self.get_function(name).is_some()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
