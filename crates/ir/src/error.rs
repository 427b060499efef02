// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::tree::NodeId;
use thiserror::Error;

/// Errors raised by expression tree mutation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {0} does not exist")]
    InvalidNode(NodeId),

    #[error("Type of node {0} is already resolved")]
    TypeAlreadyResolved(NodeId),

    #[error("Render alias of node {0} is already assigned")]
    AliasAlreadyAssigned(NodeId),

    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}

pub type TreeResult<T> = Result<T, TreeError>;
