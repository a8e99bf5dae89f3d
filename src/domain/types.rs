//! Type descriptions consumed by the tree builder.
//!
//! This is the boundary where an outside type system hands its shapes to the
//! engine: scalars, objects with named fields, containers, abstract
//! interfaces with concrete implementations, and closed enums.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::error::{GenerationError, GenerationResult};
use crate::domain::property::{Metadata, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    Uuid,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::String,
        ScalarKind::Integer,
        ScalarKind::Number,
        ScalarKind::Boolean,
        ScalarKind::Uuid,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Uuid => "uuid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefinition {
    Scalar { scalar: ScalarKind },
    Object { fields: Vec<FieldDefinition> },
    Container { element: TypeRef },
    Interface { implementations: Vec<TypeRef> },
    Enum { values: Vec<String> },
}

impl TypeDefinition {
    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeDefinition::Interface { .. })
    }

    pub fn scalar(&self) -> Option<ScalarKind> {
        match self {
            TypeDefinition::Scalar { scalar } => Some(*scalar),
            _ => None,
        }
    }

    /// Type names this definition refers to.
    pub fn references(&self) -> Vec<&TypeRef> {
        match self {
            TypeDefinition::Scalar { .. } | TypeDefinition::Enum { .. } => Vec::new(),
            TypeDefinition::Object { fields } => fields.iter().map(|f| &f.type_ref).collect(),
            TypeDefinition::Container { element } => vec![element],
            TypeDefinition::Interface { implementations } => implementations.iter().collect(),
        }
    }
}

/// Named type definitions, pre-populated with the scalar types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    definitions: HashMap<TypeRef, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut definitions = HashMap::new();
        for scalar in ScalarKind::ALL {
            definitions.insert(
                TypeRef::new(scalar.type_name()),
                TypeDefinition::Scalar { scalar },
            );
        }
        Self { definitions }
    }

    pub fn register(&mut self, name: impl Into<TypeRef>, definition: TypeDefinition) -> &mut Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    pub fn with(mut self, name: impl Into<TypeRef>, definition: TypeDefinition) -> Self {
        self.register(name, definition);
        self
    }

    pub fn contains(&self, type_ref: &TypeRef) -> bool {
        self.definitions.contains_key(type_ref)
            || type_ref
                .list_element()
                .is_some_and(|element| self.contains(&element))
    }

    /// Looks up `type_ref`, expanding inline `list<T>` references.
    pub fn definition(&self, type_ref: &TypeRef) -> GenerationResult<TypeDefinition> {
        if let Some(definition) = self.definitions.get(type_ref) {
            return Ok(definition.clone());
        }
        match type_ref.list_element() {
            Some(element) => Ok(TypeDefinition::Container { element }),
            None => Err(GenerationError::UnknownType(type_ref.to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &TypeRef> {
        self.definitions.keys()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_builtin() {
        let registry = TypeRegistry::new();
        for scalar in ScalarKind::ALL {
            let definition = registry.definition(&TypeRef::new(scalar.type_name())).unwrap();
            assert_eq!(definition.scalar(), Some(scalar));
        }
    }

    #[test]
    fn test_inline_list_definition() {
        let registry = TypeRegistry::new().with(
            "Season",
            TypeDefinition::Enum {
                values: vec!["spring".into(), "summer".into()],
            },
        );
        let definition = registry.definition(&TypeRef::new("list<Season>")).unwrap();
        assert_eq!(
            definition,
            TypeDefinition::Container {
                element: TypeRef::new("Season")
            }
        );
        assert!(registry.contains(&TypeRef::new("list<list<Season>>")));
        assert!(!registry.contains(&TypeRef::new("list<Missing>")));
    }

    #[test]
    fn test_unknown_type() {
        let err = TypeRegistry::new()
            .definition(&TypeRef::new("Missing"))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnknownType(name) if name == "Missing"));
    }

    #[test]
    fn test_deserialize_definition() {
        let yaml = r#"
kind: object
fields:
  - name: id
    type: uuid
  - name: tags
    type: list<string>
    metadata:
      max_size: 2
"#;
        let definition: TypeDefinition = serde_yaml::from_str(yaml).unwrap();
        match definition {
            TypeDefinition::Object { fields } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].type_ref, TypeRef::new("list<string>"));
                assert_eq!(fields[1].metadata.get_usize("max_size"), Some(2));
            }
            other => panic!("unexpected definition: {:?}", other),
        }
    }
}
