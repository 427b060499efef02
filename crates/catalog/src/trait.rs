// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Class-map repository trait
//!
//! The compiler consumes class maps; it never builds or stores them. Lookups
//! are synchronous calls, and an implementation shared between concurrent
//! compilations must be `Send + Sync`.

use crate::error::{CatalogError, CatalogResult};
use ecsql_ir::{ClassKey, ClassMap, PropertyMap, RelationshipConstraint};
use std::sync::Arc;

/// Source of class-to-table mappings
///
/// # Examples
///
/// ```rust,ignore
/// use ecsql_catalog::ClassMapRepository;
///
/// fn print_columns(repo: &dyn ClassMapRepository) -> ecsql_catalog::CatalogResult<()> {
///     let class = repo.resolve_class(Some("ecsql"), "PSA")?;
///     for property in repo.get_properties(&class)? {
///         println!("{} -> {:?}", property.name, property.columns);
///     }
///     Ok(())
/// }
/// ```
pub trait ClassMapRepository: Send + Sync {
    /// Look up a class by name.
    ///
    /// `schema` may be a schema name or a schema alias. Without it, the name
    /// must be unique across schemas.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ClassNotFound` if no class matches, and
    /// `CatalogError::AmbiguousClass` if an unqualified name matches in
    /// several schemas.
    fn resolve_class(&self, schema: Option<&str>, name: &str) -> CatalogResult<Arc<ClassMap>>;

    /// Properties of a class in declaration order, system properties included
    fn get_properties(&self, class: &ClassMap) -> CatalogResult<Vec<PropertyMap>> {
        Ok(class.properties.clone())
    }

    /// Source and target constraints of a relationship class
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotARelationship` for entity classes.
    fn get_relationship_constraints(
        &self,
        relationship: &ClassMap,
    ) -> CatalogResult<(RelationshipConstraint, RelationshipConstraint)> {
        relationship
            .relationship
            .as_ref()
            .map(|r| (r.source.clone(), r.target.clone()))
            .ok_or_else(|| CatalogError::NotARelationship(relationship.key.to_string()))
    }

    /// Direct subclasses of a class
    fn derived_classes(&self, class: &ClassKey) -> CatalogResult<Vec<Arc<ClassMap>>>;
}
