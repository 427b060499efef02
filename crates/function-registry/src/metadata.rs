// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Function signatures

use ecsql_ir::TypeInfo;
use serde::{Deserialize, Serialize};

/// Function classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionType {
    Scalar,
    Aggregate,
    /// Usable only with an OVER clause
    Window,
}

/// How the result type of a call is determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnType {
    Fixed(TypeInfo),
    /// Type of the argument at this position
    SameAsArgument(usize),
}

/// A declared function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    /// Expected type; `None` accepts anything
    pub type_info: Option<TypeInfo>,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>, type_info: Option<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            type_info,
        }
    }
}

/// Signature of a function known to the compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Function name
    pub name: String,
    pub return_type: ReturnType,
    pub parameters: Vec<FunctionParameter>,
    pub function_type: FunctionType,
    pub description: Option<String>,
}

impl FunctionMetadata {
    /// Create a scalar function with a fixed return type
    pub fn new(name: impl Into<String>, return_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            return_type: ReturnType::Fixed(return_type),
            parameters: Vec::new(),
            function_type: FunctionType::Scalar,
            description: None,
        }
    }

    /// Create a scalar function returning the type of argument `index`
    pub fn returning_argument(name: impl Into<String>, index: usize) -> Self {
        Self {
            return_type: ReturnType::SameAsArgument(index),
            ..Self::new(name, TypeInfo::Unconstrained)
        }
    }

    /// Builder method: add parameters
    pub fn with_parameters(mut self, params: Vec<FunctionParameter>) -> Self {
        self.parameters = params;
        self
    }

    /// Builder method: set function type
    pub fn with_type(mut self, function_type: FunctionType) -> Self {
        self.function_type = function_type;
        self
    }

    /// Builder method: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn is_aggregate(&self) -> bool {
        self.function_type == FunctionType::Aggregate
    }

    /// Result type given the resolved argument types
    pub fn result_type(&self, args: &[Option<&TypeInfo>]) -> TypeInfo {
        match &self.return_type {
            ReturnType::Fixed(ty) => ty.clone(),
            ReturnType::SameAsArgument(index) => args
                .get(*index)
                .copied()
                .flatten()
                .cloned()
                .unwrap_or(TypeInfo::Unconstrained),
        }
    }

    /// Declared type of the parameter at `index`
    pub fn parameter_type(&self, index: usize) -> Option<&TypeInfo> {
        self.parameters.get(index)?.type_info.as_ref()
    }
}
