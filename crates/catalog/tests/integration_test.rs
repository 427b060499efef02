// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the catalog crate

use ecsql_catalog::{
    CatalogError, ClassKey, ClassMap, ClassMapRepository, InMemoryClassMapRepository,
};
use ecsql_ir::{PrimitiveType, PropertyMap, TypeInfo};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_registered_class_resolves_through_alias() {
    init_tracing();
    let class = ClassMap::entity(7, ClassKey::new("ecsql", "P"), "ecsql_P")
        .with_property(PropertyMap::primitive("L", PrimitiveType::Long))
        .with_property(PropertyMap::new("Parent", TypeInfo::navigation("ecsql.P")));
    let repo = InMemoryClassMapRepository::new()
        .with_schema_alias("e", "ecsql")
        .with_class(class)
        .unwrap();

    let resolved = repo.resolve_class(Some("e"), "p").unwrap();
    assert_eq!(resolved.id, 7);

    let properties = repo.get_properties(&resolved).unwrap();
    let names: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ECInstanceId", "ECClassId", "L", "Parent"]);
    assert_eq!(
        properties[3].columns,
        vec!["Parent_Id".to_string(), "Parent_RelECClassId".to_string()]
    );
}

#[test]
fn test_unknown_schema_alias_is_not_found() {
    let repo = InMemoryClassMapRepository::new()
        .with_class(ClassMap::entity(1, ClassKey::new("ecsql", "P"), "ecsql_P"))
        .unwrap();
    assert!(matches!(
        repo.resolve_class(Some("zz"), "P"),
        Err(CatalogError::ClassNotFound { .. })
    ));
}

#[test]
fn test_repository_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InMemoryClassMapRepository>();

    let repo: std::sync::Arc<dyn ClassMapRepository> =
        std::sync::Arc::new(InMemoryClassMapRepository::new());
    assert!(repo.resolve_class(None, "Missing").is_err());
}
