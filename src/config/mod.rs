use config::{Config, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::domain::types::{TypeDefinition, TypeRegistry};
use crate::domain::property::TypeRef;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Named type definitions, from `fixture.toml` and `config/types/*`
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

/// Knobs of the tree builder and generator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationSettings {
    /// Probability of `null` for nullable nodes
    #[serde(default = "default_null_inject")]
    pub null_inject: f64,
    #[serde(default)]
    pub container_min_size: usize,
    #[serde(default = "default_container_max_size")]
    pub container_max_size: usize,
    /// Nodes at this depth are not expanded and generate `null`
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Fixed RNG seed for reproducible fixtures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub candidate_selection: CandidateSelection,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            null_inject: default_null_inject(),
            container_min_size: 0,
            container_max_size: default_container_max_size(),
            max_depth: default_max_depth(),
            seed: None,
            candidate_selection: CandidateSelection::default(),
        }
    }
}

fn default_null_inject() -> f64 {
    0.2
}

fn default_container_max_size() -> usize {
    3
}

fn default_max_depth() -> usize {
    8
}

/// How a concrete candidate is chosen for an abstract slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSelection {
    /// First registered implementation
    #[default]
    First,
    /// Uniformly random implementation
    Random,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TypeConfig {
    pub name: TypeRef,
    #[serde(flatten)]
    pub definition: TypeDefinition,
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = std::path::Path::new(root).join("fixture");
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("generation.null_inject", default_null_inject())?
            .set_default("generation.container_min_size", 0)?
            .set_default("generation.container_max_size", default_container_max_size() as u64)?
            .set_default("generation.max_depth", default_max_depth() as u64)?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;

        settings.load_types_from_dir(&format!("{}/config/types", root))?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        tracing::debug!(
            "Loaded {} type definition(s) from {}",
            settings.types.len(),
            root
        );
        Ok(settings)
    }

    /// Builds a registry holding the scalar types plus every configured type.
    pub fn type_registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for type_config in &self.types {
            registry.register(type_config.name.clone(), type_config.definition.clone());
        }
        registry
    }

    fn load_types_from_dir(&mut self, path: &str) -> Result<(), anyhow::Error> {
        let pattern = format!("{}/*", path);
        let mut entries: Vec<_> = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Failed to read glob entry: {}", e);
                    None
                }
            })
            .collect();
        entries.sort();

        for path in entries {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if matches!(ext, "json" | "yaml" | "yml" | "toml") {
                    let content = std::fs::read_to_string(&path)?;
                    let type_config: TypeConfig = match ext {
                        "json" => serde_json::from_str(&content)?,
                        "toml" => toml::from_str(&content)?,
                        _ => serde_yaml::from_str(&content)?,
                    };
                    self.types.push(type_config);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.null_inject, 0.2);
        assert_eq!(settings.container_min_size, 0);
        assert_eq!(settings.container_max_size, 3);
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.candidate_selection, CandidateSelection::First);
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_type_config_flattens_definition() {
        let json = r#"{ "name": "Shape", "kind": "interface", "implementations": ["Circle", "Square"] }"#;
        let type_config: TypeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(type_config.name, TypeRef::new("Shape"));
        assert_eq!(
            type_config.definition,
            TypeDefinition::Interface {
                implementations: vec![TypeRef::new("Circle"), TypeRef::new("Square")]
            }
        );
    }

    #[test]
    fn test_type_registry_from_settings() {
        let settings = Settings {
            types: vec![TypeConfig {
                name: TypeRef::new("Season"),
                definition: TypeDefinition::Enum {
                    values: vec!["spring".to_string()],
                },
            }],
            ..Default::default()
        };
        let registry = settings.type_registry();
        assert!(registry.contains(&TypeRef::new("Season")));
        assert!(registry.contains(&TypeRef::new("string")));
    }
}
