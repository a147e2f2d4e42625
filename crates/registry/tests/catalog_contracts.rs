use std::collections::HashSet;

use datasets_registry::{EnvelopeShape, OperationDescriptor, OperationRegistry, RequestPlan};
use datasets_types::{FieldKind, FieldSchema, UpstreamRequest};
use serde_json::{Map, Value, json};

fn sample_scalar(field: &FieldSchema, kind: FieldKind) -> Value {
    match kind {
        FieldKind::String => match field.allowed_values.first() {
            Some(allowed) => json!(allowed),
            None => json!("sample"),
        },
        FieldKind::Integer => json!(field.minimum.unwrap_or(1.0) as i64),
        FieldKind::Number => json!(field.minimum.unwrap_or(0.0)),
        FieldKind::Boolean => json!(true),
        FieldKind::StringArray | FieldKind::IntegerArray => unreachable!("arrays are sampled per item"),
    }
}

fn sample_value(field: &FieldSchema) -> Value {
    match field.kind {
        FieldKind::StringArray | FieldKind::IntegerArray => {
            let item_kind = if field.kind == FieldKind::IntegerArray { FieldKind::Integer } else { FieldKind::String };
            let count = field.min_items.unwrap_or(1).max(1);
            Value::Array((0..count).map(|_| sample_scalar(field, item_kind)).collect())
        }
        kind => sample_scalar(field, kind),
    }
}

/// Required fields plus the first alternative of every precondition.
fn minimal_bundle(descriptor: &OperationDescriptor) -> Map<String, Value> {
    let mut bundle = Map::new();
    for field in descriptor.schema.fields.iter().filter(|field| field.required) {
        bundle.insert(field.name.to_string(), sample_value(field));
    }
    for precondition in &descriptor.schema.preconditions {
        let datasets_types::Precondition::AnyOf(groups) = precondition;
        for name in groups.first().into_iter().flatten() {
            let field = descriptor.schema.field(name).expect("precondition names a declared field");
            bundle.insert(field.name.to_string(), sample_value(field));
        }
    }
    bundle
}

fn assert_resolved(operation: &str, request: &UpstreamRequest) {
    assert!(request.path.starts_with('/'), "{operation}: path {}", request.path);
    assert!(!request.path.contains('{'), "{operation}: unresolved placeholder in {}", request.path);
}

#[test]
fn operation_names_are_unique_and_described() {
    let registry = OperationRegistry::builtin();
    let mut seen = HashSet::new();
    for descriptor in registry.iter() {
        assert!(seen.insert(descriptor.name), "duplicate operation {}", descriptor.name);
        assert!(!descriptor.description.is_empty(), "{} has no description", descriptor.name);
        assert!(!descriptor.title.is_empty(), "{} has no title", descriptor.name);
    }
    assert_eq!(seen.len(), 31);
}

#[test]
fn defaults_satisfy_their_own_schema() {
    for descriptor in OperationRegistry::builtin().iter() {
        let validated = descriptor.validate(&minimal_bundle(descriptor)).unwrap_or_else(|error| {
            panic!("{}: minimal bundle rejected: {error}", descriptor.name);
        });
        for field in descriptor.schema.fields.iter().filter(|field| field.default.is_some()) {
            assert_eq!(
                validated.get(field.name),
                field.default.as_ref(),
                "{}: default for `{}` not applied",
                descriptor.name,
                field.name
            );
        }
    }
}

#[test]
fn every_minimal_bundle_maps_to_a_request() {
    for descriptor in OperationRegistry::builtin().iter() {
        let validated = descriptor.validate(&minimal_bundle(descriptor)).expect("valid");
        let arguments = descriptor
            .parse(validated)
            .unwrap_or_else(|error| panic!("{}: typed parse failed: {error}", descriptor.name));
        match arguments.plan() {
            RequestPlan::Direct(request) => assert_resolved(descriptor.name, &request),
            RequestPlan::Lookup(lookup) => assert_resolved(descriptor.name, &lookup.request),
        }
    }
}

#[test]
fn search_operations_are_paginated() {
    for descriptor in OperationRegistry::builtin().iter() {
        if !matches!(descriptor.envelope, EnvelopeShape::Search { .. }) {
            continue;
        }
        assert!(descriptor.schema.field("max_results").is_some(), "{} lacks max_results", descriptor.name);
        assert!(descriptor.schema.field("page_token").is_some(), "{} lacks page_token", descriptor.name);
    }
}

/// One value per declared constraint of `field` that breaks only that constraint.
fn violations(field: &FieldSchema) -> Vec<(&'static str, Value)> {
    let mut cases = Vec::new();
    let wrong_type = match field.kind {
        FieldKind::String => json!(42),
        FieldKind::Integer | FieldKind::Number => json!("seven"),
        FieldKind::Boolean => json!("yes"),
        FieldKind::StringArray | FieldKind::IntegerArray => json!("not-a-list"),
    };
    cases.push(("wrong type", wrong_type));

    if !field.allowed_values.is_empty() && field.kind == FieldKind::String {
        cases.push(("enum", json!("NOT-AN-OPTION")));
    }

    let item = sample_scalar_for_items(field);
    if field.kind.is_array() {
        if let Some(max_items) = field.max_items {
            cases.push(("max_items", Value::Array(vec![item.clone(); max_items + 1])));
        }
        if let Some(min_items) = field.min_items.filter(|min_items| *min_items > 0) {
            cases.push(("min_items", Value::Array(vec![item.clone(); min_items - 1])));
        }
        if let Some(minimum) = field.minimum.filter(|_| field.kind == FieldKind::IntegerArray) {
            let mut items = vec![item; field.min_items.unwrap_or(1).max(1)];
            items[0] = json!(minimum as i64 - 1);
            cases.push(("item minimum", Value::Array(items)));
        }
    } else {
        if let Some(maximum) = field.maximum {
            cases.push(("maximum", json!(maximum + 1.0)));
        }
        if let Some(minimum) = field.minimum {
            cases.push(("minimum", json!(minimum - 1.0)));
        }
    }
    cases
}

#[test]
fn single_field_violations_cite_that_field() {
    for descriptor in OperationRegistry::builtin().iter() {
        let bundle = minimal_bundle(descriptor);
        for field in &descriptor.schema.fields {
            for (constraint, bad) in violations(field) {
                let mut arguments = bundle.clone();
                arguments.insert(field.name.to_string(), bad.clone());
                let Err(error) = descriptor.validate(&arguments) else {
                    panic!("{}: `{}` {constraint} violation {bad} accepted", descriptor.name, field.name);
                };
                assert_eq!(error.field, field.name, "{}: {constraint}", descriptor.name);
            }
        }
    }
}

#[test]
fn every_declared_constraint_kind_is_exercised() {
    let mut seen = HashSet::new();
    for descriptor in OperationRegistry::builtin().iter() {
        for field in &descriptor.schema.fields {
            seen.extend(violations(field).into_iter().map(|(constraint, _)| constraint));
        }
    }
    for constraint in ["wrong type", "enum", "maximum", "minimum", "max_items", "min_items", "item minimum"] {
        assert!(seen.contains(constraint), "no descriptor declares a {constraint} constraint");
    }
}

fn sample_scalar_for_items(field: &FieldSchema) -> Value {
    match field.kind {
        FieldKind::IntegerArray => sample_scalar(field, FieldKind::Integer),
        _ => sample_scalar(field, FieldKind::String),
    }
}

#[test]
fn published_schemas_list_every_field() {
    for descriptor in OperationRegistry::builtin().iter() {
        let schema = descriptor.schema.to_json_schema();
        assert_eq!(schema.get("type"), Some(&json!("object")));
        let properties = schema.get("properties").and_then(Value::as_object).expect("properties");
        assert_eq!(properties.len(), descriptor.schema.fields.len(), "{}", descriptor.name);
    }
}
