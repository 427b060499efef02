// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SELECT statements
//!
//! Order of work for one SELECT:
//!
//! 1. FROM: class references are resolved (CTE names first, then the
//!    repository) and FROM subqueries are finalized. The entries become the
//!    statement's local range classes.
//! 2. A scope with the local ranges plus the ranges of the enclosing
//!    statement is pushed. Join conditions and relationship joins are
//!    resolved in it.
//! 3. Wildcards in the select list are expanded, then the select list and
//!    WHERE are finalized.
//! 4. A second scope that also exposes the select list's aliases is pushed
//!    for GROUP BY, HAVING, WINDOW, ORDER BY and LIMIT.
//!
//! A compound SELECT finalizes each branch this way, except that the ORDER BY
//! of the last branch sorts the compound result and resolves against the
//! branch select lists instead.

use super::{fail, finalize};
use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use crate::join::resolve_relationship_join;
use crate::resolution::{output_columns, resolve_link};
use crate::scope::ScopeArg;
use crate::symbol::{RangeClassInfo, RangeSource};
use ecsql_ir::{
    ClassRefTarget, Exp, ExpTree, NodeId, PropertyName, PropertyPath, PropertyTarget, RangeScope,
    ResolvedProperty,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Finalize a (possibly compound) `SelectStatement`
#[instrument(skip(tree, ctx))]
pub(super) fn finalize_select(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    statement: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    let (chain, branches) = compound_chain(tree, statement);
    let compound = branches.len() > 1;

    for &branch in &branches[..branches.len().saturating_sub(1)] {
        if let Some(order_by) = tree.find_child(branch, |k| matches!(k, Exp::OrderBy)) {
            let err = SemanticError::InvalidOrderByForCompoundQuery(
                "only the last SELECT of a compound statement may have ORDER BY".to_string(),
            );
            return fail(tree, ctx, order_by, err);
        }
    }

    for (position, &branch) in branches.iter().enumerate() {
        let defer_order_by = compound && position + 1 == branches.len();
        finalize_single(tree, ctx, branch, depth + 1, defer_order_by)?;
    }

    if compound {
        check_branch_columns(tree, ctx, &branches)?;
        if let Some(last) = branches.last().copied() {
            finalize_compound_order_by(tree, ctx, &branches, last, depth + 1)?;
        }
    }
    for node in chain {
        tree.mark_finalized(node);
    }
    Ok(())
}

/// `SelectStatement` nodes of a compound chain and their `SingleSelect` branches
fn compound_chain(tree: &ExpTree, statement: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut chain = Vec::new();
    let mut branches = Vec::new();
    let mut current = Some(statement);
    while let Some(node) = current {
        chain.push(node);
        branches.extend(tree.child(node, 0));
        current = tree
            .child(node, 1)
            .filter(|&next| matches!(tree.kind(next), Exp::SelectStatement(_)));
    }
    (chain, branches)
}

fn selection_of(tree: &ExpTree, single: NodeId) -> Option<NodeId> {
    tree.find_child(single, |k| matches!(k, Exp::Selection))
}

fn check_branch_columns(
    tree: &ExpTree,
    ctx: &mut ResolutionContext,
    branches: &[NodeId],
) -> SemanticResult<()> {
    let selections: Vec<NodeId> = branches.iter().filter_map(|&b| selection_of(tree, b)).collect();
    let Some((&first, rest)) = selections.split_first() else {
        return Ok(());
    };
    let left = tree.children(first);
    for &other in rest {
        let right = tree.children(other);
        if left.len() != right.len() {
            let err = SemanticError::SetOperationColumnCountMismatch {
                left: left.len(),
                right: right.len(),
            };
            return fail(tree, ctx, other, err);
        }
        for (&l, &r) in left.iter().zip(right) {
            let (Some(lt), Some(rt)) = (tree.type_info(l), tree.type_info(r)) else {
                continue;
            };
            if !lt.can_compare(rt) {
                let err = SemanticError::TypeMismatch {
                    left: lt.to_string(),
                    right: rt.to_string(),
                };
                return fail(tree, ctx, r, err);
            }
        }
    }
    Ok(())
}

/// ORDER BY of the last branch, resolved against every branch's select list
fn finalize_compound_order_by(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    branches: &[NodeId],
    last: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    let Some(order_by) = tree.find_child(last, |k| matches!(k, Exp::OrderBy)) else {
        return Ok(());
    };
    for &spec in tree.children(order_by) {
        let Some(key) = tree.child(spec, 0) else {
            continue;
        };
        if !matches!(tree.kind(key), Exp::PropertyName(_) | Exp::FunctionCall(_)) {
            let err = SemanticError::InvalidOrderByForCompoundQuery(format!(
                "sort key must name a result column, found {}",
                tree.kind(key).kind_name()
            ));
            return fail(tree, ctx, key, err);
        }
    }

    let selections = branches.iter().filter_map(|&b| selection_of(tree, b)).collect();
    let mut scope = ctx.push_scope(ScopeArg::UnionBranches(selections));
    finalize(tree, &mut scope, order_by, depth + 1)
}

/// Finalize one `SingleSelect`
pub(super) fn finalize_single(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    single: NodeId,
    depth: usize,
    defer_order_by: bool,
) -> SemanticResult<()> {
    let mut ranges = Vec::new();
    let mut joins = Vec::new();
    if let Some(from) = tree.find_child(single, |k| matches!(k, Exp::From)) {
        for entry in tree.children(from).to_vec() {
            collect_ranges(tree, ctx, entry, depth + 2, &mut ranges, &mut joins)?;
        }
        check_duplicate_ranges(tree, ctx, &ranges)?;
        tree.mark_finalized(from);
    }

    let mut visible = ranges.clone();
    visible.extend(ctx.inherited_ranges());
    let mut scope = ctx.push_scope(ScopeArg::ranges(visible.clone()));

    for join in joins {
        match tree.kind(join) {
            Exp::RelationshipJoin(_) => {
                if let Err(err) = resolve_relationship_join(tree, &mut scope, join, &ranges) {
                    return fail(tree, &mut scope, join, err);
                }
            }
            _ => {
                if let Some(on) = tree.child(join, 2) {
                    finalize(tree, &mut scope, on, depth + 3)?;
                }
            }
        }
        tree.mark_finalized(join);
    }

    let Some(selection) = selection_of(tree, single) else {
        return Ok(());
    };
    expand_wildcards(tree, &mut scope, selection, &ranges)?;
    finalize(tree, &mut scope, selection, depth + 1)?;
    if let Some(where_clause) = tree.find_child(single, |k| matches!(k, Exp::Where)) {
        finalize(tree, &mut scope, where_clause, depth + 1)?;
    }

    let aliases: Vec<NodeId> = tree
        .children(selection)
        .iter()
        .copied()
        .filter(|&d| {
            tree.kind(d)
                .as_derived_property()
                .is_some_and(|p| p.alias.is_some())
        })
        .collect();
    let mut scope = scope.push_scope(ScopeArg::ranges(visible).with_select_aliases(aliases));
    for clause in tree.children(single).to_vec() {
        let deferred = defer_order_by && matches!(tree.kind(clause), Exp::OrderBy);
        if !deferred {
            finalize(tree, &mut scope, clause, depth + 1)?;
        }
    }
    tree.mark_finalized(single);
    Ok(())
}

/// Resolve the ranges of one FROM entry; join nodes are queued for later
fn collect_ranges(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    entry: NodeId,
    depth: usize,
    ranges: &mut Vec<RangeClassInfo>,
    joins: &mut Vec<NodeId>,
) -> SemanticResult<()> {
    match tree.kind(entry) {
        Exp::ClassName(_) => {
            resolve_class_name(tree, ctx, entry)?;
            ranges.extend(RangeClassInfo::from_node(tree, entry));
        }
        Exp::SubqueryRef { .. } => {
            if let Some(subquery) = tree.child(entry, 0) {
                finalize(tree, ctx, subquery, depth + 1)?;
            }
            tree.mark_finalized(entry);
            ranges.extend(RangeClassInfo::from_node(tree, entry));
        }
        Exp::Join(_) => {
            for side in tree.children(entry).iter().take(2).copied().collect::<Vec<_>>() {
                collect_ranges(tree, ctx, side, depth + 1, ranges, joins)?;
            }
            joins.push(entry);
        }
        Exp::RelationshipJoin(_) => {
            for side in tree.children(entry).to_vec() {
                collect_ranges(tree, ctx, side, depth + 1, ranges, joins)?;
            }
            joins.push(entry);
        }
        other => {
            let err = SemanticError::UnknownClass(other.kind_name().to_string());
            return fail(tree, ctx, entry, err);
        }
    }
    Ok(())
}

/// Bind a `ClassName` to a CTE in scope or to a repository class
pub(super) fn resolve_class_name(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    node: NodeId,
) -> SemanticResult<()> {
    let Some(class) = tree.kind(node).as_class_name() else {
        return Ok(());
    };
    if class.resolved.is_some() {
        return Ok(());
    }
    let (schema, name) = (class.schema.clone(), class.name.clone());

    let target = match schema.as_deref().map_or_else(|| find_common_table(tree, node, &name), |_| None) {
        Some(block) => ClassRefTarget::CommonTable(block),
        None => match ctx.resolve_class(schema.as_deref(), &name) {
            Ok(class) => ClassRefTarget::Class(class),
            Err(err) => return fail(tree, ctx, node, err),
        },
    };
    debug!(%node, class = %name, "resolved class reference");
    if let Exp::ClassName(class) = tree.kind_mut(node) {
        class.resolved = Some(target);
    }
    tree.mark_finalized(node);
    Ok(())
}

/// CTE block named `name` in a WITH clause enclosing `node`
fn find_common_table(tree: &ExpTree, node: NodeId, name: &str) -> Option<NodeId> {
    tree.ancestors(node)
        .filter(|&a| matches!(tree.kind(a), Exp::CommonTable { .. }))
        .find_map(|with| {
            tree.children(with).iter().copied().find(|&block| {
                matches!(tree.kind(block), Exp::CommonTableBlock(b) if b.name.eq_ignore_ascii_case(name))
            })
        })
}

fn check_duplicate_ranges(
    tree: &ExpTree,
    ctx: &mut ResolutionContext,
    ranges: &[RangeClassInfo],
) -> SemanticResult<()> {
    for (position, range) in ranges.iter().enumerate() {
        let Some(name) = range.display_name() else {
            continue;
        };
        if ranges[..position].iter().any(|earlier| earlier.matches(name)) {
            return fail(
                tree,
                ctx,
                range.node,
                SemanticError::DuplicateRangeAlias(name.to_string()),
            );
        }
    }
    Ok(())
}

/// Replace `*` and `alias.*` items with one item per visible column
fn expand_wildcards(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    selection: NodeId,
    ranges: &[RangeClassInfo],
) -> SemanticResult<()> {
    for derived in tree.children(selection).to_vec() {
        let Some(value) = tree.child(derived, 0) else {
            continue;
        };
        let Some(path) = tree
            .kind(value)
            .as_property_name()
            .map(|p| p.path.clone())
            .filter(PropertyPath::is_wildcard)
        else {
            continue;
        };

        let expanded_ranges: Vec<&RangeClassInfo> = match path.wildcard_qualifier() {
            None => ranges.iter().collect(),
            Some(qualifier) => match ranges.iter().find(|r| r.matches(qualifier)) {
                Some(range) => vec![range],
                None => {
                    let err = SemanticError::UnknownProperty(path.to_string());
                    return fail(tree, ctx, value, err);
                }
            },
        };

        let mut items = Vec::new();
        for range in expanded_ranges {
            items.extend(expand_range(tree, ctx, range)?);
        }
        debug!(%path, columns = items.len(), "expanded wildcard");
        tree.splice_child(selection, derived, items)?;
    }
    Ok(())
}

/// Select-list items for every column of one range
fn expand_range(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    range: &RangeClassInfo,
) -> SemanticResult<Vec<NodeId>> {
    let qualifier = range.display_name().map(str::to_string);
    let qualified = |name: &str| {
        let mut parts: Vec<String> = qualifier.iter().cloned().collect();
        parts.push(name.to_string());
        PropertyPath::from_parts(parts)
    };

    let mut columns = Vec::new();
    match &range.source {
        RangeSource::Class(class) => {
            for property in class.visible_properties() {
                let resolved = ResolvedProperty {
                    range: range.node,
                    scope: RangeScope::Local,
                    path: PropertyPath::from_parts(vec![property.name.clone()]),
                    target: PropertyTarget::Class {
                        class: Arc::clone(class),
                        property: property.name.clone(),
                    },
                };
                columns.push((qualified(&property.name), resolved, property.type_info.clone()));
            }
        }
        RangeSource::Subquery(_) | RangeSource::CommonTable(_) => {
            for column in output_columns(tree, range) {
                let alias = resolve_link(tree, ctx, column.derived)?;
                let name = column.name.unwrap_or(alias);
                let resolved = ResolvedProperty {
                    range: range.node,
                    scope: RangeScope::Local,
                    path: PropertyPath::from_parts(vec![name.clone()]),
                    target: PropertyTarget::Derived {
                        derived: column.derived,
                    },
                };
                let type_info = tree
                    .type_info(column.derived)
                    .cloned()
                    .unwrap_or(ecsql_ir::TypeInfo::Unconstrained);
                columns.push((qualified(&name), resolved, type_info));
            }
        }
    }

    let mut items = Vec::with_capacity(columns.len());
    for (path, resolved, type_info) in columns {
        let property = tree.add(
            Exp::PropertyName(PropertyName {
                path,
                resolved: Some(resolved),
            }),
            [],
        );
        tree.set_type(property, type_info)?;
        tree.mark_finalized(property);
        items.push(tree.derived(property, None));
    }
    Ok(items)
}
