// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # In-memory repository
//!
//! A [`ClassMapRepository`] backed by a fixed set of class maps registered up
//! front.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecsql_catalog::{ClassMapRepository, InMemoryClassMapRepository};
//! use ecsql_ir::{ClassKey, ClassMap};
//!
//! let repo = InMemoryClassMapRepository::new()
//!     .with_schema_alias("ts", "TestSchema")
//!     .with_class(ClassMap::entity(1, ClassKey::new("TestSchema", "Foo"), "ts_Foo"))?;
//! let foo = repo.resolve_class(Some("ts"), "Foo")?;
//! ```

use crate::error::{CatalogError, CatalogResult};
use crate::r#trait::ClassMapRepository;
use ecsql_ir::{ClassKey, ClassMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Class-map repository holding all class maps in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassMapRepository {
    classes: Vec<Arc<ClassMap>>,
    /// Lower-cased alias -> schema name
    schema_aliases: HashMap<String, String>,
}

impl InMemoryClassMapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: accept `alias` as a prefix for `schema`
    pub fn with_schema_alias(mut self, alias: impl Into<String>, schema: impl Into<String>) -> Self {
        self.schema_aliases
            .insert(alias.into().to_ascii_lowercase(), schema.into());
        self
    }

    /// Builder method: register a class
    pub fn with_class(mut self, class: ClassMap) -> CatalogResult<Self> {
        self.register(class)?;
        Ok(self)
    }

    /// Register a class. Fails if a class with the same key exists.
    pub fn register(&mut self, class: ClassMap) -> CatalogResult<()> {
        if self.classes.iter().any(|c| c.key.same_as(&class.key)) {
            return Err(CatalogError::InvalidSchema(format!(
                "class '{}' registered twice",
                class.key
            )));
        }
        self.classes.push(Arc::new(class));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn schema_matches(&self, class: &ClassMap, prefix: &str) -> bool {
        if class.key.schema.eq_ignore_ascii_case(prefix) {
            return true;
        }
        self.schema_aliases
            .get(&prefix.to_ascii_lowercase())
            .is_some_and(|schema| class.key.schema.eq_ignore_ascii_case(schema))
    }
}

impl ClassMapRepository for InMemoryClassMapRepository {
    fn resolve_class(&self, schema: Option<&str>, name: &str) -> CatalogResult<Arc<ClassMap>> {
        let matches: Vec<&Arc<ClassMap>> = self
            .classes
            .iter()
            .filter(|c| c.key.name.eq_ignore_ascii_case(name))
            .filter(|c| schema.is_none_or(|prefix| self.schema_matches(c, prefix)))
            .collect();

        debug!(?schema, name, matches = matches.len(), "resolving class");
        match matches.as_slice() {
            [] => Err(CatalogError::ClassNotFound {
                schema: schema.map(str::to_string),
                name: name.to_string(),
            }),
            [class] => Ok(Arc::clone(class)),
            many => Err(CatalogError::AmbiguousClass {
                name: name.to_string(),
                schemas: many.iter().map(|c| c.key.schema.clone()).collect(),
            }),
        }
    }

    fn derived_classes(&self, class: &ClassKey) -> CatalogResult<Vec<Arc<ClassMap>>> {
        Ok(self
            .classes
            .iter()
            .filter(|c| c.base_class.as_ref().is_some_and(|base| base.same_as(class)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsql_ir::{PrimitiveType, PropertyMap, RelationshipConstraint};

    fn repo() -> InMemoryClassMapRepository {
        InMemoryClassMapRepository::new()
            .with_schema_alias("ts", "TestSchema")
            .with_class(
                ClassMap::entity(1, ClassKey::new("TestSchema", "Foo"), "ts_Foo")
                    .with_property(PropertyMap::primitive("I", PrimitiveType::Integer)),
            )
            .unwrap()
            .with_class(
                ClassMap::entity(2, ClassKey::new("TestSchema", "SubFoo"), "ts_Foo")
                    .with_base_class(ClassKey::new("TestSchema", "Foo")),
            )
            .unwrap()
            .with_class(ClassMap::entity(3, ClassKey::new("Other", "Foo"), "o_Foo"))
            .unwrap()
    }

    #[test]
    fn test_resolve_by_schema_and_alias() {
        let repo = repo();
        assert_eq!(repo.resolve_class(Some("TestSchema"), "foo").unwrap().id, 1);
        assert_eq!(repo.resolve_class(Some("ts"), "Foo").unwrap().id, 1);
        assert_eq!(repo.resolve_class(Some("other"), "Foo").unwrap().id, 3);
    }

    #[test]
    fn test_resolve_unqualified() {
        let repo = repo();
        assert_eq!(repo.resolve_class(None, "SubFoo").unwrap().id, 2);
        assert!(matches!(
            repo.resolve_class(None, "Foo"),
            Err(CatalogError::AmbiguousClass { .. })
        ));
        assert!(matches!(
            repo.resolve_class(Some("ts"), "Bar"),
            Err(CatalogError::ClassNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = repo().with_class(ClassMap::entity(9, ClassKey::new("testschema", "FOO"), "x"));
        assert!(matches!(result, Err(CatalogError::InvalidSchema(_))));
    }

    #[test]
    fn test_derived_classes() {
        let derived = repo()
            .derived_classes(&ClassKey::new("TestSchema", "Foo"))
            .unwrap();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].name(), "SubFoo");
    }

    #[test]
    fn test_relationship_constraints() {
        let repo = repo()
            .with_class(ClassMap::relationship(
                4,
                ClassKey::new("TestSchema", "FooHasFoo"),
                "ts_FooHasFoo",
                RelationshipConstraint::new(vec![ClassKey::new("TestSchema", "Foo")], true),
                RelationshipConstraint::any_class(),
            ))
            .unwrap();
        let rel = repo.resolve_class(Some("ts"), "FooHasFoo").unwrap();
        let (source, target) = repo.get_relationship_constraints(&rel).unwrap();
        assert!(source.polymorphic);
        assert!(target.any_class);

        let foo = repo.resolve_class(Some("ts"), "Foo").unwrap();
        assert!(matches!(
            repo.get_relationship_constraints(&foo),
            Err(CatalogError::NotARelationship(_))
        ));
    }
}
