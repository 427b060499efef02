// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL Function Registry
//!
//! This crate provides the registry of functions the ECSQL compiler knows the
//! signatures of.
//!
//! ## Features
//!
//! - Scalar, aggregate and window functions of the backing engine
//! - Return-type rules (fixed, or the type of an argument)
//! - Parameter types used to infer the type of `?` arguments
//! - Host-registered functions on top of the builtins
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecsql_function_registry::{FunctionRegistry, FunctionType};
//!
//! let registry = FunctionRegistry::new();
//! let count = registry.get_function("count").unwrap();
//! assert_eq!(count.function_type, FunctionType::Aggregate);
//! ```

pub mod builtin;
pub mod metadata;
pub mod registry;

pub use metadata::{FunctionMetadata, FunctionParameter, FunctionType, ReturnType};
pub use registry::FunctionRegistry;
