// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Semantic Analyzer
//!
//! Entry point of semantic analysis. The analyzer takes the expression tree
//! of one parsed statement and, in place:
//!
//! - binds class references to class maps or CTE blocks
//! - resolves every property path and records what it refers to
//! - types every value expression and checks operators and clause shapes
//! - indexes and types the statement's parameters
//!
//! A tree is analyzed at most once. Afterwards it is marked finalized and
//! ready for the renderers in `ecsql-codegen`.

use std::sync::Arc;

use ecsql_catalog::ClassMapRepository;
use ecsql_function_registry::FunctionRegistry;
use ecsql_ir::ExpTree;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::AnalyzerConfig;
use crate::context::ResolutionContext;
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::finalize::finalize;
use crate::finalize::params::{ParameterInfo, index_parameters, infer_parameter_types};

/// Result of a successful analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Parameters ordered by index
    pub parameters: Vec<ParameterInfo>,
}

/// Semantic analyzer for ECSQL statements
///
/// The analyzer is cheap to clone and holds no per-statement state; every
/// call to [`SemanticAnalyzer::analyze`] starts from a fresh
/// [`ResolutionContext`].
#[derive(Clone)]
pub struct SemanticAnalyzer {
    /// Class-map source for class lookups
    repository: Arc<dyn ClassMapRepository>,

    /// Functions known to the compiler
    functions: Arc<FunctionRegistry>,

    config: AnalyzerConfig,
}

impl SemanticAnalyzer {
    /// Create a new semantic analyzer with the built-in function registry
    ///
    /// # Arguments
    ///
    /// * `repository` - Class-map repository for class lookups
    /// * `config` - Analysis limits and naming
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use ecsql_semantic::{AnalyzerConfig, SemanticAnalyzer};
    ///
    /// let analyzer = SemanticAnalyzer::new(repository, AnalyzerConfig::default());
    /// ```
    pub fn new(repository: Arc<dyn ClassMapRepository>, config: AnalyzerConfig) -> Self {
        Self {
            repository,
            functions: Arc::new(FunctionRegistry::new()),
            config,
        }
    }

    /// Builder method: use a custom function registry
    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a statement tree in place
    ///
    /// This is the main entry point for semantic analysis. It:
    /// 1. Indexes the parameters in pre-order
    /// 2. Finalizes the tree from its root: class binding, property
    ///    resolution, typing and clause checks
    /// 3. Infers the type of every parameter from its position
    ///
    /// # Errors
    ///
    /// Returns the collected [`Diagnostics`] when the statement is invalid.
    /// Analysis stops at the first error, so the diagnostics hold exactly one
    /// error issue.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let analysis = analyzer.analyze(&mut tree)?;
    /// for parameter in &analysis.parameters {
    ///     println!("{}: {}", parameter.index, parameter.type_info);
    /// }
    /// ```
    #[instrument(skip_all, fields(nodes = tree.len()))]
    pub fn analyze(&self, tree: &mut ExpTree) -> Result<Analysis, Diagnostics> {
        let mut ctx = ResolutionContext::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.functions),
            self.config.clone(),
        );

        let Some(root) = tree.root() else {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push((&SemanticError::AlreadyFinalized).into());
            return Err(diagnostics);
        };
        if tree.is_finalized(root) {
            warn!(%root, "statement already analyzed");
            let err = SemanticError::AlreadyFinalized;
            ctx.error_at(tree, root, err);
            return Err(ctx.into_diagnostics());
        }

        // Step 1: Parameter indexes
        index_parameters(tree, &mut ctx, root);

        // Step 2: Names, types and clause rules
        let mut result = finalize(tree, &mut ctx, root, 0);

        // Step 3: Parameter types
        let parameters = match result {
            Ok(()) => match infer_parameter_types(tree, &mut ctx) {
                Ok(parameters) => parameters,
                Err(err) => {
                    result = Err(err);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        if let Err(err) = result {
            // Errors raised below the recorded ones (tree or catalog
            // failures) have not been reported yet
            if !ctx.diagnostics().has_errors() {
                ctx.error_at(tree, root, err);
            }
            let diagnostics = ctx.into_diagnostics();
            debug!(issues = diagnostics.len(), "analysis failed");
            return Err(diagnostics);
        }

        info!(parameters = parameters.len(), "statement analyzed");
        Ok(Analysis { parameters })
    }
}

impl std::fmt::Debug for SemanticAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticAnalyzer")
            .field("functions", &self.functions.functions().len())
            .field("config", &self.config)
            .finish()
    }
}
