// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Resolution context
//!
//! Per-statement state threaded through the finalize walk:
//!
//! - a class-map cache in front of the repository
//! - the scope stack (see [`crate::scope`])
//! - the parameter registry that hands out 1-based parameter indexes
//! - the generated-alias counter
//! - the diagnostics sink
//!
//! A context belongs to exactly one statement analysis and is never shared.

use crate::config::AnalyzerConfig;
use crate::diagnostics::{Diagnostics, Issue};
use crate::error::{SemanticError, SemanticResult};
use crate::scope::{ScopeArg, ScopeGuard};
use crate::symbol::RangeClassInfo;
use ecsql_catalog::ClassMapRepository;
use ecsql_codegen::render_ecsql;
use ecsql_function_registry::FunctionRegistry;
use ecsql_ir::{ClassMap, ExpTree, NodeId, RelationshipConstraint};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A parameter known to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedParameter {
    /// 1-based index
    pub index: u32,
    pub name: Option<String>,
    /// Parameter nodes sharing this index, in tracking order
    pub occurrences: Vec<NodeId>,
}

/// Classes eligible for one end of a relationship
#[derive(Debug, Clone, Default)]
pub struct ConstraintClasses {
    pub classes: Vec<Arc<ClassMap>>,
    /// The end accepts any class
    pub any_class: bool,
}

impl ConstraintClasses {
    pub fn contains(&self, class: &ClassMap) -> bool {
        self.any_class || self.classes.iter().any(|c| c.key.same_as(&class.key))
    }
}

/// State of one statement analysis
pub struct ResolutionContext {
    repository: Arc<dyn ClassMapRepository>,
    functions: Arc<FunctionRegistry>,
    config: AnalyzerConfig,
    class_cache: HashMap<(String, String), Arc<ClassMap>>,
    scopes: Vec<ScopeArg>,
    parameters: Vec<TrackedParameter>,
    next_alias: usize,
    diagnostics: Diagnostics,
}

impl ResolutionContext {
    pub fn new(
        repository: Arc<dyn ClassMapRepository>,
        functions: Arc<FunctionRegistry>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            repository,
            functions,
            config,
            class_cache: HashMap::new(),
            scopes: Vec::new(),
            parameters: Vec::new(),
            next_alias: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Look up a class, memoized per lower-cased `(schema, name)`
    ///
    /// Repeated lookups return the same handle.
    ///
    /// # Errors
    ///
    /// `UnknownClass` and `AmbiguousClass` for lookup failures, `Catalog`
    /// for anything else the repository reports.
    #[instrument(skip(self))]
    pub fn resolve_class(
        &mut self,
        schema: Option<&str>,
        name: &str,
    ) -> SemanticResult<Arc<ClassMap>> {
        let key = (
            schema.unwrap_or_default().to_ascii_lowercase(),
            name.to_ascii_lowercase(),
        );
        if let Some(class) = self.class_cache.get(&key) {
            debug!(class = %class.key, "class cache hit");
            return Ok(Arc::clone(class));
        }

        let class = self
            .repository
            .resolve_class(schema, name)
            .map_err(SemanticError::from_class_lookup)?;
        self.class_cache.insert(key, Arc::clone(&class));
        Ok(class)
    }

    /// Source and target constraints of a relationship class
    pub fn relationship_constraints(
        &self,
        relationship: &ClassMap,
    ) -> SemanticResult<(RelationshipConstraint, RelationshipConstraint)> {
        Ok(self.repository.get_relationship_constraints(relationship)?)
    }

    /// Expand a relationship constraint into its eligible classes
    ///
    /// Polymorphic constraints include every subclass, transitively.
    pub fn constraint_classes(
        &mut self,
        constraint: &RelationshipConstraint,
    ) -> SemanticResult<ConstraintClasses> {
        let mut expanded = ConstraintClasses {
            classes: Vec::new(),
            any_class: constraint.any_class,
        };

        let mut queue = VecDeque::new();
        for key in &constraint.classes {
            queue.push_back(self.resolve_class(Some(&key.schema), &key.name)?);
        }
        while let Some(class) = queue.pop_front() {
            if expanded.classes.iter().any(|c| c.key.same_as(&class.key)) {
                continue;
            }
            if constraint.polymorphic {
                queue.extend(self.repository.derived_classes(&class.key)?);
            }
            expanded.classes.push(class);
        }

        debug!(
            classes = expanded.classes.len(),
            any_class = expanded.any_class,
            "expanded relationship constraint"
        );
        Ok(expanded)
    }

    /// Push a scope; it is popped when the guard drops
    pub fn push_scope(&mut self, scope: ScopeArg) -> ScopeGuard<'_> {
        self.scopes.push(scope);
        ScopeGuard::new(self)
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Innermost scope
    pub fn scope(&self) -> Option<&ScopeArg> {
        self.scopes.last()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Ranges a nested statement inherits: every range class of the innermost
    /// range scope, marked inherited
    pub fn inherited_ranges(&self) -> Vec<RangeClassInfo> {
        self.scopes
            .iter()
            .rev()
            .find(|s| matches!(s, ScopeArg::RangeClasses { .. }))
            .map(|s| s.range_classes().iter().map(RangeClassInfo::inherited).collect())
            .unwrap_or_default()
    }

    /// Assign the index of a parameter occurrence
    ///
    /// The first occurrence of a name allocates the next index and later
    /// occurrences reuse it. Unnamed parameters always get a fresh index.
    pub fn track_parameter(&mut self, name: Option<&str>, node: NodeId) -> u32 {
        let existing = name.and_then(|name| {
            self.parameters
                .iter_mut()
                .find(|p| p.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        });
        if let Some(tracked) = existing {
            tracked.occurrences.push(node);
            return tracked.index;
        }

        let index = self.parameters.len() as u32 + 1;
        self.parameters.push(TrackedParameter {
            index,
            name: name.map(str::to_string),
            occurrences: vec![node],
        });
        index
    }

    pub fn parameters(&self) -> &[TrackedParameter] {
        &self.parameters
    }

    /// Next synthetic column alias, unique within the statement
    pub fn generate_alias(&mut self) -> String {
        let alias = format!("{}{}", self.config.alias_prefix, self.next_alias);
        self.next_alias += 1;
        debug!(%alias, "generated alias");
        alias
    }

    /// Record `error` against `node` and hand it back for propagation
    pub fn error_at(&mut self, tree: &ExpTree, node: NodeId, error: SemanticError) -> SemanticError {
        let mut issue = Issue::from(&error);
        if let Ok(text) = render_ecsql(tree, node) {
            issue = issue.with_expression(text);
        }
        debug!(code = issue.code, node = %node, "semantic error");
        self.diagnostics.push(issue);
        error
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("cached_classes", &self.class_cache.len())
            .field("scopes", &self.scopes)
            .field("parameters", &self.parameters)
            .field("next_alias", &self.next_alias)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ecsql_ir::ClassKey;

    #[test]
    fn test_resolve_class_is_cached() {
        let mut ctx = testing::context();
        let first = ctx.resolve_class(Some("ecsql"), "PSA").unwrap();
        let second = ctx.resolve_class(Some("ECSQL"), "psa").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_resolve_unknown_class() {
        let mut ctx = testing::context();
        assert_eq!(
            ctx.resolve_class(Some("ecsql"), "Nope").unwrap_err(),
            SemanticError::UnknownClass("ecsql.Nope".into())
        );
    }

    #[test]
    fn test_named_parameters_share_index() {
        let mut tree = ExpTree::new();
        let a = tree.parameter(Some("a"));
        let b = tree.parameter(None);
        let a2 = tree.parameter(Some("A"));
        let c = tree.parameter(None);

        let mut ctx = testing::context();
        assert_eq!(ctx.track_parameter(Some("a"), a), 1);
        assert_eq!(ctx.track_parameter(None, b), 2);
        assert_eq!(ctx.track_parameter(Some("A"), a2), 1);
        assert_eq!(ctx.track_parameter(None, c), 3);
        assert_eq!(ctx.parameters()[0].occurrences, vec![a, a2]);
    }

    #[test]
    fn test_generated_aliases_are_unique() {
        let mut ctx = testing::context();
        assert_eq!(ctx.generate_alias(), "K0");
        assert_eq!(ctx.generate_alias(), "K1");
    }

    #[test]
    fn test_polymorphic_constraint_includes_subclasses() {
        let mut ctx = testing::context();
        let constraint = RelationshipConstraint::new(vec![ClassKey::new("ecsql", "PSA")], true);
        let classes = ctx.constraint_classes(&constraint).unwrap();
        let sub = ctx.resolve_class(Some("ecsql"), "SubPSA").unwrap();
        assert!(classes.contains(&sub));
        assert!(!classes.any_class);

        let exact = RelationshipConstraint::new(vec![ClassKey::new("ecsql", "PSA")], false);
        let classes = ctx.constraint_classes(&exact).unwrap();
        assert!(!classes.contains(&sub));

        let any = ctx.constraint_classes(&RelationshipConstraint::any_class()).unwrap();
        assert!(any.contains(&sub));
    }

    #[test]
    fn test_error_at_records_expression() {
        let mut tree = ExpTree::new();
        let node = tree.property("a.Foo");
        let mut ctx = testing::context();
        let err = ctx.error_at(&tree, node, SemanticError::UnknownProperty("a.Foo".into()));
        assert_eq!(err.code(), "UnknownProperty");
        let issue = ctx.diagnostics().first_error().unwrap();
        assert_eq!(issue.expression.as_deref(), Some("a.Foo"));
    }
}
