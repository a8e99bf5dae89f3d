//! Unit of work handed to introspectors.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::cell::RefCell;

use crate::domain::arbitrary::{ArbitraryNode, ArbitraryProperty};
use crate::domain::error::GenerationResult;
use crate::domain::property::Property;
use crate::domain::types::TypeDefinition;

/// Generates a value for a property that has no node in the current tree.
pub type NestedGenerator<'a> = &'a dyn Fn(&ArbitraryProperty) -> GenerationResult<Value>;

/// Everything an introspector needs to turn one node into a value.
///
/// Children are a read-only snapshot whose cached values are already
/// generated.
pub struct ArbitraryGeneratorContext<'a> {
    arbitrary_property: &'a ArbitraryProperty,
    children: Vec<&'a ArbitraryNode>,
    fixed_value: Option<&'a Value>,
    nested: NestedGenerator<'a>,
    definition: Option<&'a TypeDefinition>,
    rng: Option<&'a RefCell<StdRng>>,
}

impl<'a> ArbitraryGeneratorContext<'a> {
    pub fn new(
        arbitrary_property: &'a ArbitraryProperty,
        children: Vec<&'a ArbitraryNode>,
        fixed_value: Option<&'a Value>,
        nested: NestedGenerator<'a>,
    ) -> Self {
        Self {
            arbitrary_property,
            children,
            fixed_value,
            nested,
            definition: None,
            rng: None,
        }
    }

    pub fn with_type_definition(mut self, definition: &'a TypeDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn with_random(mut self, rng: &'a RefCell<StdRng>) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn arbitrary_property(&self) -> &ArbitraryProperty {
        self.arbitrary_property
    }

    pub fn property(&self) -> &Property {
        self.arbitrary_property.property()
    }

    pub fn children(&self) -> &[&'a ArbitraryNode] {
        &self.children
    }

    pub fn fixed_value(&self) -> Option<&Value> {
        self.fixed_value
    }

    pub fn type_definition(&self) -> Option<&TypeDefinition> {
        self.definition
    }

    /// Requests generation of `property` outside the current tree.
    pub fn generate_nested(&self, property: &ArbitraryProperty) -> GenerationResult<Value> {
        (self.nested)(property)
    }

    /// Runs `f` with the generator's RNG, or a fresh entropy-seeded one when
    /// the context was built without it.
    ///
    /// The borrow ends when `f` returns; do not call [`generate_nested`]
    /// from inside `f`.
    ///
    /// [`generate_nested`]: Self::generate_nested
    pub fn random<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        match self.rng {
            Some(rng) => f(&mut rng.borrow_mut()),
            None => f(&mut StdRng::from_entropy()),
        }
    }
}
