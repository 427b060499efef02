// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin functions available in ECSQL statements

use crate::{FunctionMetadata, FunctionParameter, FunctionType};
use ecsql_ir::{PrimitiveType, TypeInfo};

fn any(name: &str) -> FunctionParameter {
    FunctionParameter::new(name, None)
}

fn long(name: &str) -> FunctionParameter {
    FunctionParameter::new(name, Some(TypeInfo::long()))
}

fn string(name: &str) -> FunctionParameter {
    FunctionParameter::new(name, Some(TypeInfo::string()))
}

fn double(name: &str) -> FunctionParameter {
    FunctionParameter::new(name, Some(TypeInfo::double()))
}

/// Get all builtin functions
pub fn all_functions() -> Vec<FunctionMetadata> {
    let mut functions = aggregate_functions();
    functions.extend(scalar_functions());
    functions.extend(window_functions());
    functions
}

fn aggregate_functions() -> Vec<FunctionMetadata> {
    vec![
        FunctionMetadata::new("COUNT", TypeInfo::long())
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![any("value")])
            .with_description("Count the number of rows"),
        FunctionMetadata::new("SUM", TypeInfo::double())
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![double("value")])
            .with_description("Sum of values"),
        FunctionMetadata::new("TOTAL", TypeInfo::double())
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![double("value")])
            .with_description("Sum of values, 0.0 for no rows"),
        FunctionMetadata::new("AVG", TypeInfo::double())
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![double("value")])
            .with_description("Average of values"),
        FunctionMetadata::returning_argument("MIN", 0)
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![any("value")])
            .with_description("Minimum value"),
        FunctionMetadata::returning_argument("MAX", 0)
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![any("value")])
            .with_description("Maximum value"),
        FunctionMetadata::new("GROUP_CONCAT", TypeInfo::string())
            .with_type(FunctionType::Aggregate)
            .with_parameters(vec![any("value"), string("separator")])
            .with_description("Concatenate values from multiple rows"),
    ]
}

fn scalar_functions() -> Vec<FunctionMetadata> {
    vec![
        FunctionMetadata::returning_argument("ABS", 0)
            .with_parameters(vec![double("value")])
            .with_description("Absolute value"),
        FunctionMetadata::new("ROUND", TypeInfo::double())
            .with_parameters(vec![double("value"), long("digits")])
            .with_description("Round to the given number of digits"),
        FunctionMetadata::new("LENGTH", TypeInfo::long())
            .with_parameters(vec![any("value")])
            .with_description("String length in characters"),
        FunctionMetadata::new("UPPER", TypeInfo::string())
            .with_parameters(vec![string("value")])
            .with_description("Convert to uppercase"),
        FunctionMetadata::new("LOWER", TypeInfo::string())
            .with_parameters(vec![string("value")])
            .with_description("Convert to lowercase"),
        FunctionMetadata::new("TRIM", TypeInfo::string())
            .with_parameters(vec![string("value"), string("characters")])
            .with_description("Remove leading/trailing characters"),
        FunctionMetadata::new("SUBSTR", TypeInfo::string())
            .with_parameters(vec![string("value"), long("start"), long("length")])
            .with_description("Extract substring"),
        FunctionMetadata::new("INSTR", TypeInfo::long())
            .with_parameters(vec![string("value"), string("search")])
            .with_description("Position of the first occurrence"),
        FunctionMetadata::new("REPLACE", TypeInfo::string())
            .with_parameters(vec![string("value"), string("search"), string("replacement")])
            .with_description("Replace all occurrences"),
        FunctionMetadata::returning_argument("COALESCE", 0)
            .with_parameters(vec![any("value"), any("fallback")])
            .with_description("Return first non-null value"),
        FunctionMetadata::returning_argument("IFNULL", 0)
            .with_parameters(vec![any("value"), any("fallback")])
            .with_description("Return alternative if null"),
        FunctionMetadata::returning_argument("NULLIF", 0)
            .with_parameters(vec![any("value"), any("other")])
            .with_description("NULL if both arguments are equal"),
        FunctionMetadata::new("TYPEOF", TypeInfo::string())
            .with_parameters(vec![any("value")])
            .with_description("Storage class of a value"),
        FunctionMetadata::new("HEX", TypeInfo::string())
            .with_parameters(vec![any("value")])
            .with_description("Hexadecimal rendering"),
        FunctionMetadata::new("RANDOM", TypeInfo::long()).with_description("Pseudo-random integer"),
        FunctionMetadata::new("DATE", TypeInfo::string())
            .with_parameters(vec![any("time"), string("modifier")])
            .with_description("Date as YYYY-MM-DD"),
        FunctionMetadata::new("JULIANDAY", TypeInfo::double())
            .with_parameters(vec![any("time")])
            .with_description("Julian day number"),
        FunctionMetadata::new("STRFTIME", TypeInfo::string())
            .with_parameters(vec![string("format"), any("time")])
            .with_description("Formatted date/time"),
        FunctionMetadata::new(
            "CURRENT_TIMESTAMP",
            TypeInfo::primitive(PrimitiveType::DateTime),
        )
        .with_description("Current date and time"),
    ]
}

fn window_functions() -> Vec<FunctionMetadata> {
    let ranking = |name: &str, description: &str| {
        FunctionMetadata::new(name, TypeInfo::long())
            .with_type(FunctionType::Window)
            .with_description(description)
    };
    vec![
        ranking("ROW_NUMBER", "Number of the row within its partition"),
        ranking("RANK", "Rank with gaps"),
        ranking("DENSE_RANK", "Rank without gaps"),
        FunctionMetadata::new("PERCENT_RANK", TypeInfo::double())
            .with_type(FunctionType::Window)
            .with_description("Relative rank between 0 and 1"),
        FunctionMetadata::new("CUME_DIST", TypeInfo::double())
            .with_type(FunctionType::Window)
            .with_description("Cumulative distribution"),
        ranking("NTILE", "Bucket number").with_parameters(vec![long("buckets")]),
        FunctionMetadata::returning_argument("LAG", 0)
            .with_type(FunctionType::Window)
            .with_parameters(vec![any("value"), long("offset"), any("default")])
            .with_description("Value of a preceding row"),
        FunctionMetadata::returning_argument("LEAD", 0)
            .with_type(FunctionType::Window)
            .with_parameters(vec![any("value"), long("offset"), any("default")])
            .with_description("Value of a following row"),
        FunctionMetadata::returning_argument("FIRST_VALUE", 0)
            .with_type(FunctionType::Window)
            .with_parameters(vec![any("value")])
            .with_description("Value of the first row of the frame"),
        FunctionMetadata::returning_argument("LAST_VALUE", 0)
            .with_type(FunctionType::Window)
            .with_parameters(vec![any("value")])
            .with_description("Value of the last row of the frame"),
        FunctionMetadata::returning_argument("NTH_VALUE", 0)
            .with_type(FunctionType::Window)
            .with_parameters(vec![any("value"), long("n")])
            .with_description("Value of the n-th row of the frame"),
    ]
}
