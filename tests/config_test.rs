use fixture_forge::config::{CandidateSelection, Settings};
use fixture_forge::domain::property::TypeRef;
use fixture_forge::domain::types::TypeDefinition;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_external_configs() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("config/types"))?;

    let fixture_toml = r#"
[generation]
null_inject = 0.5
container_max_size = 5
seed = 99
candidate_selection = "random"

[[types]]
name = "Season"
kind = "enum"
values = ["spring", "summer", "autumn", "winter"]
"#;
    fs::write(root.join("fixture.toml"), fixture_toml)?;

    // Object in JSON
    let sample_json = r#"
{
    "name": "Sample",
    "kind": "object",
    "fields": [
        { "name": "id", "type": "uuid", "metadata": { "not_null": true } },
        { "name": "season", "type": "list<Season>", "metadata": { "size": 2 } },
        { "name": "shape", "type": "Shape" }
    ]
}
"#;
    fs::write(root.join("config/types/sample.json"), sample_json)?;

    // Interface in YAML
    let shape_yaml = r#"
name: Shape
kind: interface
implementations: [Circle]
"#;
    fs::write(root.join("config/types/shape.yaml"), shape_yaml)?;

    // Implementation in TOML
    let circle_toml = r#"
name = "Circle"
kind = "object"

[[fields]]
name = "radius"
type = "number"
metadata = { min = 1.0, max = 2.0 }
"#;
    fs::write(root.join("config/types/circle.toml"), circle_toml)?;

    // Ignored extension
    fs::write(root.join("config/types/notes.txt"), "not a type")?;

    let settings = Settings::from_root(root.to_str().unwrap())?;

    assert_eq!(settings.generation.null_inject, 0.5);
    assert_eq!(settings.generation.container_max_size, 5);
    assert_eq!(settings.generation.container_min_size, 0);
    assert_eq!(settings.generation.max_depth, 8);
    assert_eq!(settings.generation.seed, Some(99));
    assert_eq!(settings.generation.candidate_selection, CandidateSelection::Random);

    assert_eq!(settings.types.len(), 4);
    let names: Vec<&str> = settings.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Season", "Circle", "Sample", "Shape"]);

    let registry = settings.type_registry();
    assert!(matches!(
        registry.definition(&TypeRef::new("Shape"))?,
        TypeDefinition::Interface { .. }
    ));

    Ok(())
}

#[test]
fn test_defaults_without_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::from_root(temp_dir.path().to_str().unwrap())?;

    assert!(settings.types.is_empty());
    assert_eq!(settings.generation.null_inject, 0.2);
    assert_eq!(settings.generation.container_max_size, 3);
    assert_eq!(settings.generation.candidate_selection, CandidateSelection::First);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("config/types"))?;

    fs::write(
        root.join("fixture.toml"),
        "[generation]\nnull_inject = 2.0\n",
    )?;
    fs::write(
        root.join("config/types/sample.yaml"),
        "name: Sample\nkind: object\nfields:\n  - name: owner\n    type: Person\n",
    )?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("generation.null_inject"));
    assert!(message.contains("Person"));
    Ok(())
}
