// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Property path resolution
//!
//! Resolves a [`PropertyPath`] against the innermost scope of the resolution
//! context.
//!
//! ## Matching
//!
//! Every range class of the scope is tried three ways:
//!
//! - qualified by the range's alias or name (`a.I`), confidence 0
//! - qualified by schema and class name (`ecsql.PSA.I`), confidence 0
//! - unqualified (`I`), confidence 1
//!
//! SELECT aliases of the statement also match, with confidence 0. A class
//! range matches when the first remaining component names one of its
//! properties and any further components are members of that property. A
//! subquery or CTE range matches on its output column names.
//!
//! ## Choosing a match
//!
//! 1. An unqualified name that matches both a SELECT alias and a different
//!    local property is ambiguous.
//! 2. Within one scope (local or inherited), matches with a higher confidence
//!    value than the best are dropped, then matches with a longer resolved
//!    path than the shortest.
//! 3. Exactly one local match wins; with no local match, exactly one
//!    inherited match wins. Anything else is an error.
//!
//! Matches that go through a subquery, CTE or compound column are links to a
//! derived property. [`resolve_link`] gives that derived property the render
//! alias its references use.

use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use crate::scope::ScopeArg;
use crate::symbol::{RangeClassInfo, RangeSource};
use ecsql_ir::{
    Exp, ExpTree, NodeId, PropertyPath, PropertyTarget, RangeScope, ResolvedProperty, TypeInfo,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Confidence of a qualified or alias match
const QUALIFIED: u8 = 0;
/// Confidence of an unqualified match
const UNQUALIFIED: u8 = 1;

/// A candidate resolution of a property path
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMatch {
    pub resolved: ResolvedProperty,
    /// Type of the addressed value, members applied
    pub type_info: TypeInfo,
    /// 0 for qualified and alias matches, 1 for unqualified ones
    pub confidence: u8,
    /// Owner label used in ambiguity messages
    pub origin: String,
}

impl PropertyMatch {
    fn is_alias(&self) -> bool {
        matches!(self.resolved.target, PropertyTarget::SelectAlias { .. })
    }

    fn same_target(&self, other: &PropertyMatch) -> bool {
        self.resolved.range == other.resolved.range && self.resolved.path.same_as(&other.resolved.path)
    }
}

/// One output column of a subquery or CTE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub position: usize,
    /// Declared CTE column, alias, or the last component of a plain property
    pub name: Option<String>,
    pub derived: NodeId,
}

/// The `Selection` of the first branch of a statement
pub fn leading_selection(tree: &ExpTree, statement: NodeId) -> Option<NodeId> {
    match tree.kind(statement) {
        Exp::SelectStatement(_) => {
            let single = tree.child(statement, 0)?;
            tree.find_child(single, |k| matches!(k, Exp::Selection))
        }
        Exp::CommonTable { .. } => leading_selection(tree, *tree.children(statement).last()?),
        _ => None,
    }
}

/// Name a SELECT-list item is referenced by from outside its statement
pub fn derived_column_name(tree: &ExpTree, derived: NodeId) -> Option<String> {
    if let Some(alias) = tree
        .kind(derived)
        .as_derived_property()
        .and_then(|d| d.alias.clone())
    {
        return Some(alias);
    }
    let value = tree.child(derived, 0)?;
    let property = tree.kind(value).as_property_name()?;
    property.path.last().map(str::to_string)
}

/// Output columns of a subquery or CTE range; empty for class ranges
pub fn output_columns(tree: &ExpTree, range: &RangeClassInfo) -> Vec<OutputColumn> {
    let (statement, declared) = match &range.source {
        RangeSource::Class(_) => return Vec::new(),
        RangeSource::Subquery(statement) => (Some(*statement), Vec::new()),
        RangeSource::CommonTable(block) => {
            let declared = match tree.kind(*block) {
                Exp::CommonTableBlock(b) => b.columns.clone(),
                _ => Vec::new(),
            };
            (tree.child(*block, 0), declared)
        }
    };
    let Some(selection) = statement.and_then(|s| leading_selection(tree, s)) else {
        return Vec::new();
    };

    tree.children(selection)
        .iter()
        .enumerate()
        .map(|(position, &derived)| OutputColumn {
            position,
            name: declared
                .get(position)
                .cloned()
                .or_else(|| derived_column_name(tree, derived)),
            derived,
        })
        .collect()
}

/// Resolve the path of a `PropertyName` node against the innermost scope
#[instrument(skip(tree, ctx), fields(path))]
pub fn resolve_property(
    tree: &ExpTree,
    ctx: &ResolutionContext,
    node: NodeId,
) -> SemanticResult<PropertyMatch> {
    let Some(property) = tree.kind(node).as_property_name() else {
        return Err(SemanticError::UnknownProperty(
            tree.kind(node).kind_name().to_string(),
        ));
    };
    let path = &property.path;
    tracing::Span::current().record("path", tracing::field::display(path));

    let found = match ctx.scope() {
        Some(ScopeArg::RangeClasses {
            ranges,
            select_aliases,
        }) => resolve_in_ranges(tree, ranges, select_aliases, path),
        Some(ScopeArg::UnionBranches(branches)) => resolve_compound_column(tree, branches, path),
        None => Err(SemanticError::UnknownProperty(path.to_string())),
    }?;
    debug!(origin = %found.origin, scope = ?found.resolved.scope, "resolved property");
    Ok(found)
}

fn resolve_in_ranges(
    tree: &ExpTree,
    ranges: &[RangeClassInfo],
    select_aliases: &[NodeId],
    path: &PropertyPath,
) -> SemanticResult<PropertyMatch> {
    let Some(first) = path.first() else {
        return Err(SemanticError::UnknownProperty(path.to_string()));
    };
    let mut matches = Vec::new();

    for &derived in select_aliases {
        let Some(alias) = tree
            .kind(derived)
            .as_derived_property()
            .and_then(|d| d.alias.as_deref())
        else {
            continue;
        };
        if !alias.eq_ignore_ascii_case(first) {
            continue;
        }
        let type_info = tree.type_info(derived).cloned().unwrap_or(TypeInfo::Unconstrained);
        if let Some(layout) = type_info.member_path(&path.parts()[1..]) {
            matches.push(PropertyMatch {
                resolved: ResolvedProperty {
                    range: derived,
                    scope: RangeScope::Local,
                    path: path.clone(),
                    target: PropertyTarget::SelectAlias { derived },
                },
                type_info: layout.type_info,
                confidence: QUALIFIED,
                origin: format!("alias {alias}"),
            });
        }
    }

    for range in ranges {
        if path.len() >= 2 && range.matches(first) {
            matches.extend(match_in_range(tree, range, path.skip(1), QUALIFIED));
        }
        if path.len() >= 3 && range.matches_qualified(first, &path.parts()[1]) {
            matches.extend(match_in_range(tree, range, path.skip(2), QUALIFIED));
        }
        matches.extend(match_in_range(tree, range, path.clone(), UNQUALIFIED));
    }

    let matches = merge_alias_matches(tree, matches, path)?;
    choose(matches, path)
}

/// Apply the alias clash rule. An alias whose expression is the clashing
/// property absorbs that property's match.
fn merge_alias_matches(
    tree: &ExpTree,
    matches: Vec<PropertyMatch>,
    path: &PropertyPath,
) -> SemanticResult<Vec<PropertyMatch>> {
    let aliases: Vec<&PropertyMatch> = matches.iter().filter(|m| m.is_alias()).collect();
    if aliases.is_empty() {
        return Ok(matches);
    }

    let mut kept = Vec::new();
    for candidate in &matches {
        let clashes = !candidate.is_alias()
            && candidate.confidence == UNQUALIFIED
            && candidate.resolved.scope == RangeScope::Local;
        if !clashes {
            kept.push(candidate.clone());
            continue;
        }
        let absorbed = aliases
            .iter()
            .any(|alias| alias_expression(tree, alias).is_some_and(|inner| inner.same_target(candidate)));
        if !absorbed {
            return Err(SemanticError::AmbiguousProperty {
                path: path.to_string(),
                candidates: aliases
                    .iter()
                    .map(|a| a.origin.clone())
                    .chain(std::iter::once(candidate.origin.clone()))
                    .collect(),
            });
        }
    }
    Ok(kept)
}

/// The resolution of an alias's expression, when it is a plain property
fn alias_expression(tree: &ExpTree, alias: &PropertyMatch) -> Option<PropertyMatch> {
    let PropertyTarget::SelectAlias { derived } = alias.resolved.target else {
        return None;
    };
    let value = tree.child(derived, 0)?;
    let resolved = tree.kind(value).as_property_name()?.resolved.clone()?;
    Some(PropertyMatch {
        resolved,
        type_info: TypeInfo::Unconstrained,
        confidence: UNQUALIFIED,
        origin: alias.origin.clone(),
    })
}

fn match_in_range(
    tree: &ExpTree,
    range: &RangeClassInfo,
    rest: PropertyPath,
    confidence: u8,
) -> Option<PropertyMatch> {
    let name = rest.first()?;
    let owner = range.display_name().unwrap_or("subquery").to_string();
    match &range.source {
        RangeSource::Class(class) => {
            let property = class.find_property(name)?;
            let layout = property.type_info.member_path(&rest.parts()[1..])?;
            Some(PropertyMatch {
                origin: format!("{owner}.{}", property.name),
                resolved: ResolvedProperty {
                    range: range.node,
                    scope: range.scope,
                    path: rest,
                    target: PropertyTarget::Class {
                        class: Arc::clone(class),
                        property: property.name.clone(),
                    },
                },
                type_info: layout.type_info,
                confidence,
            })
        }
        RangeSource::Subquery(_) | RangeSource::CommonTable(_) => {
            let column = output_columns(tree, range)
                .into_iter()
                .find(|c| c.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))?;
            let type_info = tree
                .type_info(column.derived)
                .cloned()
                .unwrap_or(TypeInfo::Unconstrained);
            let layout = type_info.member_path(&rest.parts()[1..])?;
            Some(PropertyMatch {
                origin: format!("{owner}.{name}"),
                resolved: ResolvedProperty {
                    range: range.node,
                    scope: range.scope,
                    path: rest,
                    target: PropertyTarget::Derived {
                        derived: column.derived,
                    },
                },
                type_info: layout.type_info,
                confidence,
            })
        }
    }
}

/// Pick the single surviving match, local scope first
fn choose(matches: Vec<PropertyMatch>, path: &PropertyPath) -> SemanticResult<PropertyMatch> {
    for scope in [RangeScope::Local, RangeScope::Inherited] {
        let mut candidates: Vec<PropertyMatch> = matches
            .iter()
            .filter(|m| m.resolved.scope == scope)
            .cloned()
            .collect();
        let Some(best) = candidates.iter().map(|m| m.confidence).min() else {
            continue;
        };
        candidates.retain(|m| m.confidence == best);
        let shortest = candidates
            .iter()
            .map(|m| m.resolved.path.len())
            .min()
            .unwrap_or_default();
        candidates.retain(|m| m.resolved.path.len() == shortest);

        let mut distinct: Vec<PropertyMatch> = Vec::new();
        for candidate in candidates {
            if !distinct.iter().any(|d| d.same_target(&candidate)) {
                distinct.push(candidate);
            }
        }
        return match distinct.len() {
            1 => Ok(distinct.remove(0)),
            _ => Err(SemanticError::AmbiguousProperty {
                path: path.to_string(),
                candidates: distinct.into_iter().map(|m| m.origin).collect(),
            }),
        };
    }
    Err(SemanticError::UnknownProperty(path.to_string()))
}

/// Resolve an ORDER BY key of a compound SELECT against the branch SELECT lists
fn resolve_compound_column(
    tree: &ExpTree,
    branches: &[NodeId],
    path: &PropertyPath,
) -> SemanticResult<PropertyMatch> {
    let mut positions = BTreeSet::new();
    for &selection in branches {
        for (position, &derived) in tree.children(selection).iter().enumerate() {
            if column_matches(tree, derived, path) {
                positions.insert(position);
            }
        }
    }

    let position = match positions.len() {
        0 => return Err(SemanticError::UnknownProperty(path.to_string())),
        1 => positions.into_iter().next().unwrap_or_default(),
        _ => {
            return Err(SemanticError::AmbiguousProperty {
                path: path.to_string(),
                candidates: positions.iter().map(|p| format!("column {}", p + 1)).collect(),
            });
        }
    };
    let first_branch = branches
        .first()
        .copied()
        .ok_or_else(|| SemanticError::UnknownProperty(path.to_string()))?;
    let derived = tree
        .child(first_branch, position)
        .ok_or_else(|| SemanticError::UnknownProperty(path.to_string()))?;

    Ok(PropertyMatch {
        resolved: ResolvedProperty {
            range: first_branch,
            scope: RangeScope::Local,
            path: path.clone(),
            target: PropertyTarget::CompoundColumn { position, derived },
        },
        type_info: tree.type_info(derived).cloned().unwrap_or(TypeInfo::Unconstrained),
        confidence: QUALIFIED,
        origin: format!("column {}", position + 1),
    })
}

/// Whether a branch SELECT-list item answers to `path`, by alias or by
/// written or resolved property path
fn column_matches(tree: &ExpTree, derived: NodeId, path: &PropertyPath) -> bool {
    let by_alias = path.len() == 1
        && tree
            .kind(derived)
            .as_derived_property()
            .and_then(|d| d.alias.as_deref())
            .zip(path.first())
            .is_some_and(|(alias, name)| alias.eq_ignore_ascii_case(name));
    if by_alias {
        return true;
    }
    let Some(property) = tree
        .child(derived, 0)
        .and_then(|value| tree.kind(value).as_property_name())
    else {
        return false;
    };
    property.path.same_as(path)
        || property
            .resolved
            .as_ref()
            .is_some_and(|r| r.path.same_as(path))
}

/// Give the derived property behind a link its render alias
///
/// The alias is the declared CTE column name, else the item's own alias, else
/// a generated one. Resolving an already resolved link returns the existing
/// alias.
pub fn resolve_link(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    derived: NodeId,
) -> SemanticResult<String> {
    if let Some(alias) = tree.render_alias(derived) {
        debug!(%derived, alias, "link already resolved");
        return Ok(alias.to_string());
    }

    let alias = match declared_cte_column(tree, derived) {
        Some(name) => name,
        None => match tree
            .kind(derived)
            .as_derived_property()
            .and_then(|d| d.alias.clone())
        {
            Some(alias) => alias,
            None => ctx.generate_alias(),
        },
    };
    tree.set_render_alias(derived, alias.clone())?;
    Ok(alias)
}

/// Declared column name of a CTE for an item of the CTE's leading SELECT list
fn declared_cte_column(tree: &ExpTree, derived: NodeId) -> Option<String> {
    let selection = tree.parent(derived)?;
    let position = tree.children(selection).iter().position(|&d| d == derived)?;
    let block = tree.find_ancestor(selection, |k| matches!(k, Exp::CommonTableBlock(_)))?;
    let statement = tree.child(block, 0)?;
    if leading_selection(tree, statement) != Some(selection) {
        return None;
    }
    match tree.kind(block) {
        Exp::CommonTableBlock(b) => b.columns.get(position).cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ecsql_ir::{ClassNameRef, ClassRefTarget, CommonTableBlock, PrimitiveType, SelectClauses};

    fn class_range(
        tree: &mut ExpTree,
        ctx: &mut ResolutionContext,
        name: &str,
        alias: Option<&str>,
    ) -> RangeClassInfo {
        let class = ctx.resolve_class(Some("ecsql"), name).unwrap();
        let mut reference = ClassNameRef::new(Some("ecsql"), name);
        if let Some(alias) = alias {
            reference = reference.with_alias(alias);
        }
        let node = tree.class_name(reference);
        if let Exp::ClassName(c) = tree.kind_mut(node) {
            c.resolved = Some(ClassRefTarget::Class(class));
        }
        RangeClassInfo::from_node(tree, node).unwrap()
    }

    fn resolve(
        tree: &ExpTree,
        ctx: &mut ResolutionContext,
        scope: ScopeArg,
        node: NodeId,
    ) -> SemanticResult<PropertyMatch> {
        let guard = ctx.push_scope(scope);
        resolve_property(tree, &guard, node)
    }

    #[test]
    fn test_unqualified_property_in_single_range() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let node = tree.property("i");

        let found = resolve(&tree, &mut ctx, ScopeArg::ranges(vec![psa.clone()]), node).unwrap();
        assert_eq!(found.resolved.range, psa.node);
        assert_eq!(found.type_info, TypeInfo::primitive(PrimitiveType::Integer));
        assert_eq!(found.confidence, UNQUALIFIED);
        match found.resolved.target {
            PropertyTarget::Class { property, .. } => assert_eq!(property, "I"),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_same_name_in_two_ranges_is_ambiguous() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let p = class_range(&mut tree, &mut ctx, "P", None);
        let node = tree.property("I");

        let err = resolve(&tree, &mut ctx, ScopeArg::ranges(vec![psa, p]), node).unwrap_err();
        assert_eq!(err.code(), "AmbiguousProperty");
    }

    #[test]
    fn test_qualifier_disambiguates() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", Some("a"));
        let p = class_range(&mut tree, &mut ctx, "P", None);
        let by_alias = tree.property("A.I");
        let by_schema = tree.property("ecsql.P.I");

        let scope = ScopeArg::ranges(vec![psa.clone(), p.clone()]);
        let found = resolve(&tree, &mut ctx, scope.clone(), by_alias).unwrap();
        assert_eq!(found.resolved.range, psa.node);
        assert_eq!(found.resolved.path.to_string(), "I");

        let found = resolve(&tree, &mut ctx, scope, by_schema).unwrap();
        assert_eq!(found.resolved.range, p.node);
    }

    #[test]
    fn test_member_paths() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let point = tree.property("P2D.X");
        let nested = tree.property("SAStructProp.PStructProp.l");
        let missing = tree.property("I.X");
        let scope = ScopeArg::ranges(vec![psa]);

        let found = resolve(&tree, &mut ctx, scope.clone(), point).unwrap();
        assert_eq!(found.type_info, TypeInfo::double());
        assert_eq!(found.resolved.member_path(), &["X".to_string()]);

        let found = resolve(&tree, &mut ctx, scope.clone(), nested).unwrap();
        assert_eq!(found.type_info, TypeInfo::long());

        let err = resolve(&tree, &mut ctx, scope, missing).unwrap_err();
        assert_eq!(err.code(), "UnknownProperty");
    }

    #[test]
    fn test_local_match_shadows_inherited() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let inner = class_range(&mut tree, &mut ctx, "P", None);
        let outer = class_range(&mut tree, &mut ctx, "PSA", None).inherited();
        let shared = tree.property("I");
        let outer_only = tree.property("L");
        let scope = ScopeArg::ranges(vec![inner.clone(), outer.clone()]);

        let found = resolve(&tree, &mut ctx, scope.clone(), shared).unwrap();
        assert_eq!(found.resolved.range, inner.node);
        assert_eq!(found.resolved.scope, RangeScope::Local);

        let found = resolve(&tree, &mut ctx, scope, outer_only).unwrap();
        assert_eq!(found.resolved.range, outer.node);
        assert_eq!(found.resolved.scope, RangeScope::Inherited);
    }

    #[test]
    fn test_alias_clash_with_other_property_is_ambiguous() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let value = tree.property("S");
        let item = tree.derived(value, Some("I"));
        tree.set_type(item, TypeInfo::string()).unwrap();
        let key = tree.property("I");

        let scope = ScopeArg::ranges(vec![psa]).with_select_aliases(vec![item]);
        let err = resolve(&tree, &mut ctx, scope, key).unwrap_err();
        assert_eq!(err.code(), "AmbiguousProperty");
    }

    #[test]
    fn test_alias_of_same_property_counts_once() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let scope = ScopeArg::ranges(vec![psa.clone()]);
        let value = tree.property("I");
        let resolved = resolve(&tree, &mut ctx, scope.clone(), value).unwrap();
        if let Exp::PropertyName(p) = tree.kind_mut(value) {
            p.resolved = Some(resolved.resolved);
        }
        let item = tree.derived(value, Some("I"));
        tree.set_type(item, TypeInfo::primitive(PrimitiveType::Integer)).unwrap();
        let key = tree.property("i");

        let found = resolve(&tree, &mut ctx, scope.with_select_aliases(vec![item]), key).unwrap();
        assert_eq!(found.resolved.target, PropertyTarget::SelectAlias { derived: item });
    }

    #[test]
    fn test_cte_columns_use_declared_names_and_links_are_idempotent() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let psa = class_range(&mut tree, &mut ctx, "PSA", None);
        let value = tree.property("I");
        let item = tree.derived(value, None);
        tree.set_type(item, TypeInfo::primitive(PrimitiveType::Integer)).unwrap();
        let single = tree.single_select(SelectClauses::new(vec![item], vec![psa.node]));
        let inner = tree.select(single);
        let reference = tree.class_name(ClassNameRef::new(None, "cte"));
        let one = tree.literal(ecsql_ir::Literal::Long(1));
        let outer_item = tree.derived(one, None);
        let outer_single = tree.single_select(SelectClauses::new(vec![outer_item], vec![reference]));
        let outer = tree.select(outer_single);
        let with = tree.common_table(
            false,
            vec![(CommonTableBlock::new("cte").with_columns(["x"]), inner)],
            outer,
        );
        let block = tree.child(with, 0).unwrap();
        if let Exp::ClassName(c) = tree.kind_mut(reference) {
            c.resolved = Some(ClassRefTarget::CommonTable(block));
        }
        let range = RangeClassInfo::from_node(&tree, reference).unwrap();
        let key = tree.property("cte.X");

        let found = resolve(&tree, &mut ctx, ScopeArg::ranges(vec![range]), key).unwrap();
        assert_eq!(found.resolved.target, PropertyTarget::Derived { derived: item });

        assert_eq!(resolve_link(&mut tree, &mut ctx, item).unwrap(), "x");
        assert_eq!(resolve_link(&mut tree, &mut ctx, item).unwrap(), "x");
        assert_eq!(ctx.generate_alias(), "K0");
    }

    #[test]
    fn test_compound_column_by_alias_or_path() {
        let mut tree = ExpTree::new();
        let mut ctx = testing::context();
        let a = tree.property("a");
        let first = tree.derived(a, None);
        let left = tree.add(Exp::Selection, [first]);
        let b = tree.property("b");
        let second = tree.derived(b, Some("a"));
        let right = tree.add(Exp::Selection, [second]);
        let key = tree.property("a");
        let unknown = tree.property("c");
        let scope = ScopeArg::UnionBranches(vec![left, right]);

        let found = resolve(&tree, &mut ctx, scope.clone(), key).unwrap();
        assert_eq!(
            found.resolved.target,
            PropertyTarget::CompoundColumn {
                position: 0,
                derived: first
            }
        );
        let err = resolve(&tree, &mut ctx, scope, unknown).unwrap_err();
        assert_eq!(err.code(), "UnknownProperty");
    }
}
