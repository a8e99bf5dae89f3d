use super::candidate_resolver::CandidateConcretePropertyResolver;
use super::generator::ArbitraryGenerator;
use super::introspector::{ArbitraryIntrospectorResult, ArbitraryTypeIntrospectDelegator};
use super::manipulator::{ArbitraryManipulator, NodeManipulator};
use crate::config::{CandidateSelection, GenerationSettings};
use crate::domain::error::GenerationError;
use crate::domain::property::{Metadata, Property, TypeRef};
use crate::domain::types::{FieldDefinition, TypeDefinition, TypeRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            "Season",
            TypeDefinition::Enum {
                values: vec![
                    "spring".to_string(),
                    "summer".to_string(),
                    "autumn".to_string(),
                    "winter".to_string(),
                ],
            },
        )
        .with(
            "Item",
            TypeDefinition::Object {
                fields: vec![
                    FieldDefinition::new("name", "string"),
                    FieldDefinition::new("price", "number"),
                ],
            },
        )
        .with(
            "Circle",
            TypeDefinition::Object {
                fields: vec![FieldDefinition::new("radius", "number")],
            },
        )
        .with(
            "Square",
            TypeDefinition::Object {
                fields: vec![FieldDefinition::new("side", "number")],
            },
        )
        .with(
            "Shape",
            TypeDefinition::Interface {
                implementations: vec![TypeRef::new("Circle"), TypeRef::new("Square")],
            },
        )
        .with(
            "Sample",
            TypeDefinition::Object {
                fields: vec![
                    FieldDefinition::new("id", "uuid")
                        .with_metadata(Metadata::new().with("not_null", true)),
                    FieldDefinition::new("nickname", "string"),
                    FieldDefinition::new("season", "list<Season>")
                        .with_metadata(Metadata::new().with("size", 3)),
                    FieldDefinition::new("items", "list<Item>")
                        .with_metadata(Metadata::new().with("size", 2)),
                    FieldDefinition::new("shape", "Shape")
                        .with_metadata(Metadata::new().with("not_null", true)),
                ],
            },
        )
}

fn settings(null_inject: f64) -> GenerationSettings {
    GenerationSettings {
        seed: Some(42),
        null_inject,
        ..Default::default()
    }
}

fn generator(null_inject: f64) -> ArbitraryGenerator {
    ArbitraryGenerator::new(Arc::new(registry()), settings(null_inject))
}

fn manipulator(expression: &str, manipulator: NodeManipulator) -> ArbitraryManipulator {
    ArbitraryManipulator::expression(expression, manipulator).unwrap()
}

#[test]
fn test_sample_shape() {
    let value = generator(0.0).sample("Sample").unwrap();

    assert!(value["id"].is_string());
    assert!(value["nickname"].is_string());
    assert_eq!(value["season"].as_array().unwrap().len(), 3);
    assert_eq!(value["items"].as_array().unwrap().len(), 2);
    assert!(value["items"][0]["price"].is_number());
    // First candidate by default
    assert!(value["shape"]["radius"].is_number());
}

#[test]
fn test_seeded_generators_are_deterministic() {
    let first = generator(0.3).sample("Sample").unwrap();
    let second = generator(0.3).sample("Sample").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_null_inject_spares_not_null_and_containers() {
    let value = generator(1.0).sample("Sample").unwrap();

    assert!(value["id"].is_string());
    assert!(value["nickname"].is_null());
    let seasons = value["season"].as_array().unwrap();
    assert!(seasons.iter().all(|season| season.is_string()));
    assert!(value["items"][0]["name"].is_null());
}

#[test]
fn test_set_element_value() {
    let value = generator(0.0)
        .sample_with(
            "Sample",
            &[manipulator("season[1]", NodeManipulator::Set(json!("winter")))],
        )
        .unwrap();
    assert_eq!(value["season"][1], json!("winter"));
}

#[test]
fn test_set_all_nested_fields() {
    let value = generator(1.0)
        .sample_with(
            "Sample",
            &[manipulator("$.items[*].name", NodeManipulator::Set(json!("fixed")))],
        )
        .unwrap();

    for item in value["items"].as_array().unwrap() {
        assert_eq!(item["name"], json!("fixed"));
    }
}

#[test]
fn test_set_null_and_not_null() {
    let value = generator(0.0)
        .sample_with("Sample", &[manipulator("id", NodeManipulator::SetNull)])
        .unwrap();
    assert!(value["id"].is_null());

    let value = generator(1.0)
        .sample_with("Sample", &[manipulator("nickname", NodeManipulator::NotNull)])
        .unwrap();
    assert!(value["nickname"].is_string());
}

#[test]
fn test_null_inject_manipulator() {
    let value = generator(0.0)
        .sample_with("Sample", &[manipulator("nickname", NodeManipulator::NullInject(1.0))])
        .unwrap();
    assert!(value["nickname"].is_null());
}

#[test]
fn test_size_manipulator_runs_before_element_customization() {
    let value = generator(0.0)
        .sample_with(
            "Sample",
            &[
                manipulator("season[4]", NodeManipulator::Set(json!("spring"))),
                manipulator("season", NodeManipulator::Size(5)),
            ],
        )
        .unwrap();

    let seasons = value["season"].as_array().unwrap();
    assert_eq!(seasons.len(), 5);
    assert_eq!(seasons[4], json!("spring"));
}

#[test]
fn test_size_on_non_container_fails() {
    let err = generator(0.0)
        .sample_with("Sample", &[manipulator("nickname", NodeManipulator::Size(2))])
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidStructure { .. }));
}

#[test]
fn test_candidate_manipulator_switches_implementation() {
    let value = generator(0.0)
        .sample_with("Sample", &[manipulator("shape", NodeManipulator::Candidate(1))])
        .unwrap();

    assert!(value["shape"]["side"].is_number());
    assert!(value["shape"].get("radius").is_none());
}

#[test]
fn test_candidate_manipulator_errors() {
    let err = generator(0.0)
        .sample_with("Sample", &[manipulator("shape", NodeManipulator::Candidate(2))])
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::CandidateOutOfRange { index: 2, available: 2, .. }
    ));

    let err = generator(0.0)
        .sample_with("Sample", &[manipulator("nickname", NodeManipulator::Candidate(0))])
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidStructure { .. }));
}

#[test]
fn test_tree_keeps_candidates_in_declaration_order() {
    let generator = generator(0.0);
    let tree = generator.build_tree(&TypeRef::new("Sample")).unwrap();
    let shape = tree.children(tree.root())[4];

    let candidates: Vec<_> = tree
        .node(shape)
        .candidates()
        .iter()
        .map(|candidate| candidate.type_ref().to_string())
        .collect();
    assert_eq!(candidates, vec!["Circle", "Square"]);
    assert_eq!(tree.node(shape).property().field_name(), Some("shape"));
}

#[test]
fn test_random_candidate_selection_stays_within_candidates() {
    let settings = GenerationSettings {
        candidate_selection: CandidateSelection::Random,
        ..settings(0.0)
    };
    let generator = ArbitraryGenerator::new(Arc::new(registry()), settings);

    for _ in 0..10 {
        let shape = generator.sample("Sample").unwrap()["shape"].clone();
        assert!(shape.get("radius").is_some() || shape.get("side").is_some());
    }
}

struct NoCandidates;

impl CandidateConcretePropertyResolver for NoCandidates {
    fn resolve(&self, _property: &Arc<Property>) -> Vec<Arc<Property>> {
        Vec::new()
    }
}

struct OnlySquare;

impl CandidateConcretePropertyResolver for OnlySquare {
    fn resolve(&self, property: &Arc<Property>) -> Vec<Arc<Property>> {
        vec![Arc::new(Property::reinterpreted(
            property.clone(),
            TypeRef::new("Square"),
        ))]
    }
}

#[test]
fn test_custom_candidate_resolver() {
    let value = generator(0.0)
        .with_candidate_resolver("Shape", Arc::new(OnlySquare))
        .sample("Sample")
        .unwrap();
    assert!(value["shape"]["side"].is_number());

    let err = generator(0.0)
        .with_candidate_resolver("Shape", Arc::new(NoCandidates))
        .sample("Sample")
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::NoCandidateImplementation { type_name, .. } if type_name == "Shape"
    ));
}

#[test]
fn test_custom_introspector_precedes_built_ins() {
    let generator = generator(0.0).with_introspector(Arc::new(
        ArbitraryTypeIntrospectDelegator::new(
            |context| context.property().field_name() == Some("nickname"),
            |_| ArbitraryIntrospectorResult::new(json!("custom")),
        ),
    ));

    let value = generator.sample("Sample").unwrap();
    assert_eq!(value["nickname"], json!("custom"));
    assert!(value["id"].is_string());
}

#[test]
fn test_unknown_root_type() {
    let err = generator(0.0).sample("Missing").unwrap_err();
    assert!(matches!(err, GenerationError::UnknownType(name) if name == "Missing"));
}

#[test]
fn test_regeneration_only_touches_stale_nodes() {
    let generator = generator(0.0);
    let mut tree = generator.build_tree(&TypeRef::new("Sample")).unwrap();
    let before = generator.generate(&mut tree).unwrap();

    generator
        .manipulate(
            &mut tree,
            &[manipulator("season[0]", NodeManipulator::Set(json!("autumn")))],
        )
        .unwrap();
    let after = generator.generate(&mut tree).unwrap();

    assert_eq!(after["season"][0], json!("autumn"));
    assert_eq!(after["season"][1], before["season"][1]);
    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["items"], before["items"]);
}

#[test]
fn test_max_depth_cuts_recursion() {
    let registry = recursive_registry();
    let settings = GenerationSettings {
        max_depth: 3,
        ..settings(0.0)
    };

    let value = ArbitraryGenerator::new(Arc::new(registry), settings)
        .sample("Node")
        .unwrap();

    assert!(value["next"]["next"]["value"].is_number());
    assert_eq!(value["next"]["next"]["next"], Value::Null);
}

fn unique_registry(min: i64, max: i64, size: usize) -> TypeRegistry {
    TypeRegistry::new().with(
        "Bag",
        TypeDefinition::Object {
            fields: vec![FieldDefinition::new("numbers", "list<integer>").with_metadata(
                Metadata::new()
                    .with("size", size)
                    .with("unique", true)
                    .with("element", json!({ "min": min, "max": max })),
            )],
        },
    )
}

#[test]
fn test_unique_container_has_distinct_elements() {
    let value = ArbitraryGenerator::new(Arc::new(unique_registry(0, 3, 3)), settings(0.0))
        .sample("Bag")
        .unwrap();

    let numbers = value["numbers"].as_array().unwrap();
    assert_eq!(numbers.len(), 3);
    for (i, number) in numbers.iter().enumerate() {
        assert!(!numbers[..i].contains(number));
        assert!((0..=3).contains(&number.as_i64().unwrap()));
    }
}

#[test]
fn test_unique_container_gives_up() {
    let err = ArbitraryGenerator::new(Arc::new(unique_registry(1, 1, 2)), settings(0.0))
        .sample("Bag")
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::UniqueElementsExhausted { attempts: 16, .. }
    ));
}

#[test]
fn test_unique_container_keeps_fixed_element() {
    for seed in 0..16 {
        let settings = GenerationSettings {
            seed: Some(seed),
            ..settings(0.0)
        };
        let generator = ArbitraryGenerator::new(Arc::new(unique_registry(0, 1, 2)), settings);
        let mut tree = generator.build_tree(&TypeRef::new("Bag")).unwrap();
        generator
            .manipulate(&mut tree, &[manipulator("numbers[1]", NodeManipulator::Set(json!(0)))])
            .unwrap();

        let value = generator.generate(&mut tree).unwrap();
        assert_eq!(value["numbers"], json!([1, 0]), "seed {}", seed);

        // Element caches agree with the container value
        let numbers = tree.children(tree.root())[0];
        let cached: Vec<_> = tree
            .children(numbers)
            .iter()
            .map(|id| tree.node(*id).arbitrary().cloned().unwrap())
            .collect();
        assert_eq!(cached, vec![json!(1), json!(0)]);
    }
}

#[test]
fn test_unique_container_with_colliding_fixed_elements_fails() {
    let err = ArbitraryGenerator::new(Arc::new(unique_registry(0, 5, 2)), settings(0.0))
        .sample_with("Bag", &[manipulator("numbers[*]", NodeManipulator::Set(json!(3)))])
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::UniqueElementsExhausted { attempts: 0, .. }
    ));
}

fn recursive_registry() -> TypeRegistry {
    TypeRegistry::new().with(
        "Node",
        TypeDefinition::Object {
            fields: vec![
                FieldDefinition::new("value", "integer"),
                FieldDefinition::new("next", "Node"),
            ],
        },
    )
}

#[test]
fn test_depth_limit_survives_not_null() {
    let settings = GenerationSettings {
        max_depth: 3,
        ..settings(0.0)
    };
    let generator = ArbitraryGenerator::new(Arc::new(recursive_registry()), settings);

    let value = generator
        .sample_with("Node", &[manipulator("next.next.next", NodeManipulator::NotNull)])
        .unwrap();
    assert_eq!(value["next"]["next"]["next"], Value::Null);

    let value = generator
        .sample_with(
            "Node",
            &[manipulator("next.next.next", NodeManipulator::Set(json!({ "value": 1 })))],
        )
        .unwrap();
    assert_eq!(value["next"]["next"]["next"], json!({ "value": 1 }));
}

#[test]
fn test_interface_cycle_is_rejected() {
    let registry = TypeRegistry::new()
        .with(
            "A",
            TypeDefinition::Interface {
                implementations: vec![TypeRef::new("B")],
            },
        )
        .with(
            "B",
            TypeDefinition::Interface {
                implementations: vec![TypeRef::new("A")],
            },
        );

    let err = ArbitraryGenerator::new(Arc::new(registry), settings(0.0))
        .sample("A")
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::CyclicCandidate { type_name, .. } if type_name == "A"
    ));
}
