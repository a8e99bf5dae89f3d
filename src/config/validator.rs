use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{GenerationSettings, Settings, TypeConfig};
use crate::domain::property::TypeRef;
use crate::domain::types::{TypeDefinition, TypeRegistry};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_generation(&settings.generation) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_types(&settings.types) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_cross_references(settings) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generation(generation: &GenerationSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&generation.null_inject) {
            errors.push(ValidationError::InvalidValue {
                field: "generation.null_inject".to_string(),
                reason: "Must be between 0 and 1".to_string(),
            });
        }

        if generation.container_min_size > generation.container_max_size {
            errors.push(ValidationError::InvalidValue {
                field: "generation.container_min_size".to_string(),
                reason: format!(
                    "Must not exceed container_max_size ({})",
                    generation.container_max_size
                ),
            });
        }

        if generation.max_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generation.max_depth".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_types(types: &[TypeConfig]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_names = HashMap::new();

        for (idx, type_config) in types.iter().enumerate() {
            if let Some(prev_idx) = seen_names.insert(&type_config.name, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Type name '{}' appears at indices {} and {}",
                    type_config.name, prev_idx, idx
                )));
            }

            if type_config.name.as_str().is_empty() {
                errors.push(ValidationError::MissingField(format!("types[{}].name", idx)));
            }

            match &type_config.definition {
                TypeDefinition::Interface { implementations } if implementations.is_empty() => {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("types[{}].implementations", idx),
                        reason: format!(
                            "Interface '{}' needs at least one implementation",
                            type_config.name
                        ),
                    });
                }
                TypeDefinition::Object { fields } => {
                    let mut seen_fields = HashMap::new();
                    for (field_idx, field) in fields.iter().enumerate() {
                        if field.name.is_empty() {
                            errors.push(ValidationError::MissingField(format!(
                                "types[{}].fields[{}].name",
                                idx, field_idx
                            )));
                        }
                        if let Some(prev_idx) = seen_fields.insert(&field.name, field_idx) {
                            errors.push(ValidationError::Duplicate(format!(
                                "Field '{}' of '{}' appears at indices {} and {}",
                                field.name, type_config.name, prev_idx, field_idx
                            )));
                        }
                    }
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_cross_references(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let registry = settings.type_registry();

        for type_config in &settings.types {
            for reference in type_config.definition.references() {
                if !registry.contains(reference) {
                    errors.push(ValidationError::CrossReference(format!(
                        "Type '{}' refers to unknown type '{}'",
                        type_config.name, reference
                    )));
                }
            }

            if let TypeDefinition::Interface { .. } = type_config.definition {
                if Self::interface_cycle(&registry, &type_config.name) {
                    errors.push(ValidationError::CrossReference(format!(
                        "Interface '{}' resolves back to itself through its implementations",
                        type_config.name
                    )));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether following interface implementations from `start` reaches
    /// `start` again.
    fn interface_cycle(registry: &TypeRegistry, start: &TypeRef) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![start.clone()];
        while let Some(current) = pending.pop() {
            if let Ok(TypeDefinition::Interface { implementations }) = registry.definition(&current) {
                for implementation in implementations {
                    if &implementation == start {
                        return true;
                    }
                    if visited.insert(implementation.clone()) {
                        pending.push(implementation);
                    }
                }
            }
        }
        false
    }
}
