// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Small schema shared by the unit tests of this crate

use crate::analyzer::SemanticAnalyzer;
use crate::config::AnalyzerConfig;
use crate::context::ResolutionContext;
use ecsql_catalog::InMemoryClassMapRepository;
use ecsql_function_registry::FunctionRegistry;
use ecsql_ir::{
    ClassKey, ClassMap, PrimitiveType, PropertyMap, RelationshipConstraint, StructType, TypeInfo,
};
use std::sync::Arc;

pub(crate) fn pstruct() -> StructType {
    StructType::new("PStruct")
        .with_member("i", TypeInfo::primitive(PrimitiveType::Integer))
        .with_member("l", TypeInfo::long())
        .with_member("p2d", TypeInfo::primitive(PrimitiveType::Point2d))
}

pub(crate) fn entity(name: &str) -> Arc<ClassMap> {
    Arc::new(ClassMap::entity(1, ClassKey::new("ecsql", name), format!("ecsql_{name}")))
}

fn key(name: &str) -> ClassKey {
    ClassKey::new("ecsql", name)
}

pub(crate) fn repository() -> Arc<InMemoryClassMapRepository> {
    let sa_struct = StructType::new("SAStruct").with_member("PStructProp", TypeInfo::Struct(pstruct()));
    let psa = ClassMap::entity(100, key("PSA"), "ecsql_PSA")
        .with_property(PropertyMap::primitive("I", PrimitiveType::Integer))
        .with_property(PropertyMap::primitive("L", PrimitiveType::Long))
        .with_property(PropertyMap::primitive("S", PrimitiveType::String))
        .with_property(PropertyMap::primitive("D", PrimitiveType::Double))
        .with_property(PropertyMap::primitive("B", PrimitiveType::Boolean))
        .with_property(PropertyMap::primitive("P2D", PrimitiveType::Point2d))
        .with_property(PropertyMap::new("PStructProp", TypeInfo::Struct(pstruct())))
        .with_property(PropertyMap::new("SAStructProp", TypeInfo::Struct(sa_struct.clone())))
        .with_property(PropertyMap::new(
            "PStruct_Array",
            TypeInfo::StructArray(pstruct()),
        ))
        .with_property(PropertyMap::new("Parent", TypeInfo::navigation("ecsql.PSA")));
    let sub_psa = ClassMap::entity(101, key("SubPSA"), "ecsql_PSA")
        .with_base_class(key("PSA"))
        .with_property(PropertyMap::primitive("I", PrimitiveType::Integer))
        .with_property(PropertyMap::primitive("Sub1", PrimitiveType::String));
    let p = ClassMap::entity(102, key("P"), "ecsql_P")
        .with_property(PropertyMap::primitive("I", PrimitiveType::Integer))
        .with_property(PropertyMap::primitive("S", PrimitiveType::String));
    let psa_has_p = ClassMap::relationship(
        200,
        key("PSAHasP"),
        "ecsql_PSAHasP",
        RelationshipConstraint::new(vec![key("PSA")], true),
        RelationshipConstraint::new(vec![key("P")], true),
    );
    let psa_has_psa = ClassMap::relationship(
        201,
        key("PSAHasPSA"),
        "ecsql_PSAHasPSA",
        RelationshipConstraint::new(vec![key("PSA")], true),
        RelationshipConstraint::new(vec![key("PSA")], true),
    );

    let mut repository = InMemoryClassMapRepository::new();
    for class in [psa, sub_psa, p, psa_has_p, psa_has_psa] {
        repository.register(class).unwrap();
    }
    Arc::new(repository)
}

pub(crate) fn context() -> ResolutionContext {
    ResolutionContext::new(
        repository(),
        Arc::new(FunctionRegistry::new()),
        AnalyzerConfig::default(),
    )
}

/// Route analyzer logs to the test output, filtered by `RUST_LOG`
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn analyzer() -> SemanticAnalyzer {
    init_tracing();
    SemanticAnalyzer::new(repository(), AnalyzerConfig::default())
}
