// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Finalization walk
//!
//! Depth-first walk over the expression tree that resolves names, assigns
//! types and validates clause shapes. Each node goes through three steps:
//!
//! 1. [`before_children`]: statements take over their whole subtree (they
//!    need to push scopes in a particular order); property names are resolved
//!    against the current scope.
//! 2. The children are finalized, one nesting level deeper.
//! 3. [`after_children`]: the node's type is derived from its children and
//!    clause rules are checked.
//!
//! A finalized node is skipped on later visits, so statement handlers can
//! finalize parts of their subtree ahead of the generic order.
//!
//! Every error is recorded in the context's diagnostics at the node it was
//! detected on before it propagates.

mod clauses;
mod expressions;
pub(crate) mod params;
mod select;
mod statements;

use crate::context::ResolutionContext;
use crate::error::{SemanticError, SemanticResult};
use ecsql_ir::{Exp, ExpTree, NodeId};

/// What `before_children` left to the generic walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Finalize the children, then run `after_children`
    Descend,
    /// The node's subtree is done
    Handled,
}

/// Finalize `id` and everything below it
pub(crate) fn finalize(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    id: NodeId,
    depth: usize,
) -> SemanticResult<()> {
    if tree.is_finalized(id) {
        return Ok(());
    }
    let max_depth = ctx.config().max_depth;
    if depth > max_depth {
        return Err(ctx.error_at(tree, id, SemanticError::NestingTooDeep(max_depth)));
    }

    if before_children(tree, ctx, id, depth)? == Walk::Descend {
        for child in tree.children(id).to_vec() {
            finalize(tree, ctx, child, depth + 1)?;
        }
        after_children(tree, ctx, id)?;
    }
    tree.mark_finalized(id);
    Ok(())
}

fn before_children(
    tree: &mut ExpTree,
    ctx: &mut ResolutionContext,
    id: NodeId,
    depth: usize,
) -> SemanticResult<Walk> {
    match tree.kind(id) {
        Exp::SelectStatement(_) => select::finalize_select(tree, ctx, id, depth)?,
        Exp::CommonTable { .. } => statements::finalize_common_table(tree, ctx, id, depth)?,
        Exp::Update => statements::finalize_update(tree, ctx, id, depth)?,
        Exp::Insert => statements::finalize_insert(tree, ctx, id, depth)?,
        Exp::Delete => statements::finalize_delete(tree, ctx, id, depth)?,
        Exp::PropertyName(_) => expressions::resolve_property_name(tree, ctx, id)?,
        _ => return Ok(Walk::Descend),
    }
    Ok(Walk::Handled)
}

fn after_children(tree: &mut ExpTree, ctx: &mut ResolutionContext, id: NodeId) -> SemanticResult<()> {
    let checked = match tree.kind(id) {
        Exp::GroupBy => clauses::check_group_by(tree, id),
        Exp::Having => clauses::check_having(tree, id),
        Exp::OrderBy => clauses::check_order_by(tree, id),
        Exp::LimitOffset => clauses::check_limit_offset(tree, id),
        Exp::WindowFrame(_) => clauses::check_window_frame(tree, id),
        Exp::WindowFunction(_) => clauses::check_window_function(tree, ctx, id),
        _ => Ok(()),
    };
    // Clause errors carry the offending child when they know it
    checked.map_err(|(node, err)| ctx.error_at(tree, node, err))?;
    expressions::assign_type(tree, ctx, id)
}

/// Attach `err` to `node` in the diagnostics and return it as an `Err`
pub(crate) fn fail<T>(
    tree: &ExpTree,
    ctx: &mut ResolutionContext,
    node: NodeId,
    err: SemanticError,
) -> SemanticResult<T> {
    Err(ctx.error_at(tree, node, err))
}
