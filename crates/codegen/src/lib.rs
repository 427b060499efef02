// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ECSQL Code Generation
//!
//! Renderers over an [`ExpTree`](ecsql_ir::ExpTree):
//!
//! - [`render_ecsql`] reproduces canonical ECSQL text. It accepts unresolved
//!   trees and is used for diagnostics and display.
//! - [`render_native_sql`] produces SQL for the backing engine. It requires a
//!   finalized tree and a [`ParameterLayout`] mapping each ECSQL parameter to
//!   its native `?N` placeholders.
//!
//! ```text
//! ExpTree → Semantic Analysis → ParameterLayout → Native SQL
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecsql_codegen::{ParameterLayout, render_ecsql, render_native_sql};
//!
//! let ecsql = render_ecsql(&tree, root)?;
//! let layout = ParameterLayout::from_tree(&tree);
//! let sql = render_native_sql(&tree, &layout)?;
//! ```

pub mod builder;
pub mod ecsql;
pub mod error;
pub mod layout;
pub mod native;
pub mod tokens;

pub use builder::SqlBuilder;
pub use ecsql::{EcsqlRenderer, render_ecsql};
pub use error::{CodegenError, CodegenResult};
pub use layout::{ParameterLayout, ParameterSlot};
pub use native::{NativeSqlRenderer, column_names, render_native_sql};
pub use tokens::{Keyword, quote_identifier, quote_string};
