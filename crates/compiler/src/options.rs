// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Compiler Configuration
//!
//! [`CompileOptions`] controls one [`EcsqlCompiler`](crate::EcsqlCompiler):
//! the analyzer limits and whether canonical ECSQL is rendered next to the
//! native SQL.
//!
//! Hosts usually keep the options in a JSON settings file. Missing fields
//! take their defaults:
//!
//! ```rust
//! use ecsql_compiler::CompileOptions;
//!
//! let options = CompileOptions::from_json(r#"{ "analyzer": { "max_depth": 32 } }"#).unwrap();
//! assert_eq!(options.analyzer.max_depth, 32);
//! assert!(options.render_ecsql);
//! ```
//!
//! [`StatementOptions`] are the per-statement `ECSQLOPTIONS` entries carried
//! on the tree; they are opaque to the compiler and handed to the executor.

use ecsql_ir::OptionEntry;
use ecsql_semantic::AnalyzerConfig;
use serde::{Deserialize, Serialize};

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub analyzer: AnalyzerConfig,
    /// Render canonical ECSQL into [`CompiledStatement::ecsql`](crate::CompiledStatement::ecsql)
    pub render_ecsql: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            render_ecsql: true,
        }
    }
}

impl CompileOptions {
    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Builder method: replace the analyzer settings
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Builder method: enable or disable canonical ECSQL output
    pub fn with_render_ecsql(mut self, render_ecsql: bool) -> Self {
        self.render_ecsql = render_ecsql;
        self
    }
}

/// `ECSQLOPTIONS` of a compiled statement
///
/// Entries keep declaration order. A name given twice (compared ASCII
/// case-insensitively) keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementOptions {
    entries: Vec<OptionEntry>,
}

impl StatementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, overwriting the value of an earlier entry with the same name
    pub fn insert(&mut self, entry: OptionEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(&entry.name))
        {
            Some(existing) => existing.value = entry.value,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<OptionEntry> for StatementOptions {
    fn from_iter<I: IntoIterator<Item = OptionEntry>>(iter: I) -> Self {
        let mut options = Self::new();
        for entry in iter {
            options.insert(entry);
        }
        options
    }
}
