// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Scope management
//!
//! The resolution context keeps a stack of [`ScopeArg`]s. The top entry is
//! what property resolution searches: the range classes of the statement
//! being finalized (its own plus those inherited from enclosing statements),
//! or, for the ORDER BY of a compound SELECT, the SELECT lists of all
//! branches.
//!
//! Entries are pushed through [`ResolutionContext::push_scope`], which hands
//! back a [`ScopeGuard`]. The guard dereferences to the context and pops the
//! entry when dropped, so early returns through `?` keep the stack balanced.

use crate::context::ResolutionContext;
use crate::symbol::RangeClassInfo;
use ecsql_ir::NodeId;
use std::ops::{Deref, DerefMut};

/// One entry of the scope stack
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeArg {
    /// Range classes of a statement, local entries first
    RangeClasses {
        ranges: Vec<RangeClassInfo>,
        /// Aliased SELECT-list items that ORDER BY, GROUP BY and HAVING may name
        select_aliases: Vec<NodeId>,
    },
    /// `Selection` nodes of every branch of a compound SELECT
    UnionBranches(Vec<NodeId>),
}

impl ScopeArg {
    /// Create a range-class scope
    ///
    /// # Arguments
    ///
    /// * `ranges` - Local range classes followed by inherited ones
    pub fn ranges(ranges: Vec<RangeClassInfo>) -> Self {
        ScopeArg::RangeClasses {
            ranges,
            select_aliases: Vec::new(),
        }
    }

    /// Make aliased SELECT-list items resolvable. No effect on branch scopes.
    pub fn with_select_aliases(self, aliases: Vec<NodeId>) -> Self {
        match self {
            ScopeArg::RangeClasses { ranges, .. } => ScopeArg::RangeClasses {
                ranges,
                select_aliases: aliases,
            },
            other => other,
        }
    }

    /// Range classes of this scope; empty for branch scopes
    pub fn range_classes(&self) -> &[RangeClassInfo] {
        match self {
            ScopeArg::RangeClasses { ranges, .. } => ranges,
            ScopeArg::UnionBranches(_) => &[],
        }
    }

    pub fn select_aliases(&self) -> &[NodeId] {
        match self {
            ScopeArg::RangeClasses { select_aliases, .. } => select_aliases,
            ScopeArg::UnionBranches(_) => &[],
        }
    }

    /// Ranges declared by the statement that pushed this scope
    pub fn local_ranges(&self) -> impl Iterator<Item = &RangeClassInfo> {
        self.range_classes().iter().filter(|r| r.is_local())
    }

    /// Find a range by alias or name. Local ranges shadow inherited ones.
    pub fn find_range(&self, qualifier: &str) -> Option<&RangeClassInfo> {
        self.local_ranges()
            .find(|r| r.matches(qualifier))
            .or_else(|| self.range_classes().iter().find(|r| r.matches(qualifier)))
    }
}

/// Pops its scope from the context when dropped
pub struct ScopeGuard<'a> {
    context: &'a mut ResolutionContext,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn new(context: &'a mut ResolutionContext) -> Self {
        Self { context }
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = ResolutionContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.context.pop_scope();
    }
}
