// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL Compiler
//!
//! The compile pipeline for one statement:
//!
//! ```text
//! ExpTree (from the parser)
//!    │
//!    ├─ SemanticAnalyzer::analyze   classes, properties, types, parameters
//!    ├─ ParameterLayout::from_tree  ECSQL parameters → native ?N placeholders
//!    ├─ render_native_sql           SQL for the backing engine
//!    └─ render_ecsql                canonical ECSQL (optional)
//!    │
//!    ↓
//! CompiledStatement
//! ```
//!
//! The compiler keeps no per-statement state. One instance can be shared
//! between threads; each call builds its own resolution context.

use std::sync::Arc;

use ecsql_catalog::ClassMapRepository;
use ecsql_codegen::{CodegenError, ParameterLayout, render_ecsql, render_native_sql};
use ecsql_function_registry::FunctionRegistry;
use ecsql_ir::{Exp, ExpTree, NodeId};
use ecsql_semantic::{Analysis, SemanticAnalyzer};
use tracing::{debug, info, instrument};

use crate::error::{CompileError, CompileResult};
use crate::options::{CompileOptions, StatementOptions};
use crate::statement::{CompiledStatement, ParameterBinding};

/// ECSQL compiler
///
/// # Examples
///
/// ```rust,ignore
/// use ecsql_compiler::{CompileOptions, EcsqlCompiler};
///
/// let compiler = EcsqlCompiler::new(repository, CompileOptions::default());
/// let compiled = compiler.compile(tree)?;
/// println!("{}", compiled.native_sql);
/// ```
#[derive(Debug, Clone)]
pub struct EcsqlCompiler {
    analyzer: SemanticAnalyzer,
    options: CompileOptions,
}

impl EcsqlCompiler {
    /// Create a compiler over a class-map repository with the built-in functions
    pub fn new(repository: Arc<dyn ClassMapRepository>, options: CompileOptions) -> Self {
        let analyzer = SemanticAnalyzer::new(repository, options.analyzer.clone());
        Self { analyzer, options }
    }

    /// Builder method: use a custom function registry
    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.analyzer = self.analyzer.with_functions(functions);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.analyzer
    }

    /// Compile a parsed statement
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] carrying the diagnostics of the first
    /// semantic error, or a `Codegen` issue when rendering fails.
    #[instrument(skip_all, fields(nodes = tree.len()))]
    pub fn compile(&self, mut tree: ExpTree) -> CompileResult<CompiledStatement> {
        let analysis = self.analyzer.analyze(&mut tree)?;
        let root = tree
            .root()
            .ok_or_else(|| CompileError::codegen(&CodegenError::MissingRoot, None))?;

        let layout = ParameterLayout::from_tree(&tree);
        let native_sql = render_native_sql(&tree, &layout)
            .map_err(|err| CompileError::codegen_at(&tree, root, &err))?;
        debug!(sql = %native_sql, "generated native SQL");

        let ecsql = if self.options.render_ecsql {
            let text =
                render_ecsql(&tree, root).map_err(|err| CompileError::codegen_at(&tree, root, &err))?;
            Some(text)
        } else {
            None
        };

        let parameters = bind_parameters(&tree, root, &analysis, &layout)?;
        let options = statement_options(&tree, root);

        info!(
            parameters = parameters.len(),
            options = options.len(),
            "statement compiled"
        );
        Ok(CompiledStatement {
            tree,
            native_sql,
            ecsql,
            parameters,
            options,
        })
    }
}

/// Pair inferred parameter types with their native placeholders
fn bind_parameters(
    tree: &ExpTree,
    root: NodeId,
    analysis: &Analysis,
    layout: &ParameterLayout,
) -> CompileResult<Vec<ParameterBinding>> {
    analysis
        .parameters
        .iter()
        .map(|parameter| {
            let slot = layout.slot(parameter.index).ok_or_else(|| {
                let name = parameter
                    .name
                    .clone()
                    .unwrap_or_else(|| parameter.index.to_string());
                CompileError::codegen_at(tree, root, &CodegenError::MissingParameter(name))
            })?;
            Ok(ParameterBinding {
                index: parameter.index,
                name: parameter.name.clone(),
                type_info: parameter.type_info.clone(),
                sql_indices: slot.sql_indices.clone(),
            })
        })
        .collect()
}

/// `ECSQLOPTIONS` of the top-level statement
///
/// Options of subqueries and CTE blocks belong to those statements and are
/// not collected.
fn statement_options(tree: &ExpTree, root: NodeId) -> StatementOptions {
    let mut options = StatementOptions::new();
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        match tree.kind(id) {
            Exp::CommonTable { .. } => pending.extend(tree.children(id).last().copied()),
            // Walk the compound chain right to left so that entries come out in
            // declaration order
            Exp::SelectStatement(_) => pending.extend(tree.children(id).iter().rev().copied()),
            Exp::SingleSelect(_) | Exp::Update | Exp::Delete => {
                for &child in tree.children(id) {
                    if let Exp::Options(entries) = tree.kind(child) {
                        entries.iter().cloned().for_each(|e| options.insert(e));
                    }
                }
            }
            _ => {}
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsql_catalog::InMemoryClassMapRepository;
    use ecsql_ir::{
        BooleanOperator, ClassKey, ClassMap, ClassNameRef, OptionEntry, PrimitiveType, PropertyMap,
        SelectClauses, TypeInfo,
    };

    fn compiler(options: CompileOptions) -> EcsqlCompiler {
        let p = ClassMap::entity(101, ClassKey::new("ecsql", "P"), "ecsql_P")
            .with_property(PropertyMap::primitive("I", PrimitiveType::Integer))
            .with_property(PropertyMap::primitive("S", PrimitiveType::String));
        let repository = InMemoryClassMapRepository::new().with_class(p).unwrap();
        EcsqlCompiler::new(Arc::new(repository), options)
    }

    fn select_with_options(entries: Vec<OptionEntry>) -> ExpTree {
        let mut tree = ExpTree::new();
        let i = tree.property("I");
        let item = tree.derived(i, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let lhs = tree.property("S");
        let param = tree.parameter(Some("s"));
        let predicate = tree.boolean(lhs, BooleanOperator::Eq, param);
        let mut clauses = SelectClauses::new(vec![item], vec![from]).with_where(predicate);
        for entry in entries {
            clauses = clauses.with_option(&entry.name, entry.value.as_deref());
        }
        let single = tree.single_select(clauses);
        let root = tree.select(single);
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_compile_select() {
        let compiled = compiler(CompileOptions::default())
            .compile(select_with_options(vec![]))
            .unwrap();

        assert_eq!(
            compiled.native_sql,
            "SELECT [P].[I] FROM [ecsql_P] [P] WHERE [P].[S] = ?1"
        );
        assert_eq!(
            compiled.ecsql.as_deref(),
            Some("SELECT I FROM ecsql.P WHERE S = :s")
        );
        assert_eq!(
            compiled.parameters,
            vec![ParameterBinding {
                index: 1,
                name: Some("s".into()),
                type_info: TypeInfo::string(),
                sql_indices: vec![1],
            }]
        );
        assert!(compiled.named_parameter("S").is_some());
        assert_eq!(compiled.native_parameter_count(), 1);
    }

    #[test]
    fn test_ecsql_output_can_be_disabled() {
        let options = CompileOptions::default().with_render_ecsql(false);
        let compiled = compiler(options).compile(select_with_options(vec![])).unwrap();
        assert!(compiled.ecsql.is_none());
    }

    #[test]
    fn test_unknown_property_fails_atomically() {
        let mut tree = ExpTree::new();
        let missing = tree.property("Missing");
        let item = tree.derived(missing, None);
        let from = tree.class_name(ClassNameRef::new(Some("ecsql"), "P"));
        let single = tree.single_select(SelectClauses::new(vec![item], vec![from]));
        let root = tree.select(single);
        tree.set_root(root);

        let err = compiler(CompileOptions::default()).compile(tree).unwrap_err();
        assert_eq!(err.code(), Some("UnknownProperty"));
        assert!(err.diagnostics.has_errors());
    }

    #[test]
    fn test_statement_options_are_collected() {
        let tree = select_with_options(vec![
            OptionEntry::new("NoECClassIdFilter", None),
            OptionEntry::new("Timeout", Some("1")),
            OptionEntry::new("timeout", Some("5")),
        ]);
        let compiled = compiler(CompileOptions::default()).compile(tree).unwrap();
        let entries: Vec<(&str, Option<&str>)> = compiled
            .options
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_deref()))
            .collect();
        assert_eq!(entries, [("NoECClassIdFilter", None), ("Timeout", Some("5"))]);
    }

    #[test]
    fn test_compiler_is_shareable_between_threads() {
        let compiler = compiler(CompileOptions::default());
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| compiler.compile(select_with_options(vec![]))))
                .collect();
            for handle in handles {
                let compiled = handle.join().unwrap().unwrap();
                assert_eq!(compiled.parameters.len(), 1);
            }
        });
    }
}
