//! Built-in introspectors for scalars, enums, objects and containers.
//!
//! Scalar values come from `rand` and the `fake` catalogue, steered by
//! property metadata:
//!
//! | key | applies to | effect |
//! |-----|------------|--------|
//! | `min` / `max` | integer, number | inclusive range (default `0..=100`) |
//! | `faker` | string | named generator, e.g. `email`, `city` |
//! | `pattern` | string | `#` digit, `?` letter, `*` either |
//! | `max_length` | string | truncates the generated text |
//! | `unique` | container | regenerates duplicate elements, keeping fixed ones |

use fake::faker::address::en::{CityName, CountryName, PostCode, StateAbbr, StreetName};
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::adapters::introspector::{
    ArbitraryIntrospector, ArbitraryIntrospectorResult, IntrospectorChain,
};
use crate::domain::context::ArbitraryGeneratorContext;
use crate::domain::error::{GenerationError, GenerationResult};
use crate::domain::types::{ScalarKind, TypeDefinition};

/// Attempts per element before a `unique` container gives up.
pub const MAX_UNIQUE_ATTEMPTS: usize = 16;

/// The default chain, in dispatch order.
pub fn default_introspectors() -> IntrospectorChain {
    IntrospectorChain::new()
        .with(Arc::new(FixedValueIntrospector))
        .with(Arc::new(BooleanIntrospector))
        .with(Arc::new(IntegerIntrospector))
        .with(Arc::new(NumberIntrospector))
        .with(Arc::new(UuidIntrospector))
        .with(Arc::new(StringIntrospector))
        .with(Arc::new(EnumIntrospector))
        .with(Arc::new(ObjectIntrospector))
        .with(Arc::new(ContainerIntrospector))
}

fn scalar_kind(context: &ArbitraryGeneratorContext<'_>) -> Option<ScalarKind> {
    context.type_definition().and_then(TypeDefinition::scalar)
}

/// Returns the externally fixed value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedValueIntrospector;

impl ArbitraryIntrospector for FixedValueIntrospector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        context.fixed_value().is_some()
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        Ok(context
            .fixed_value()
            .cloned()
            .map(ArbitraryIntrospectorResult::new)
            .unwrap_or(ArbitraryIntrospectorResult::EMPTY))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanIntrospector;

impl ArbitraryIntrospector for BooleanIntrospector {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        scalar_kind(context) == Some(ScalarKind::Boolean)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let value: bool = context.random(|rng| rng.gen_bool(0.5));
        Ok(ArbitraryIntrospectorResult::new(json!(value)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerIntrospector;

impl ArbitraryIntrospector for IntegerIntrospector {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        scalar_kind(context) == Some(ScalarKind::Integer)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let metadata = context.property().metadata();
        let min = metadata.get_i64("min").unwrap_or(0);
        let max = metadata.get_i64("max").unwrap_or(100);
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        let value: i64 = context.random(|rng| rng.gen_range(low..=high));
        Ok(ArbitraryIntrospectorResult::new(json!(value)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberIntrospector;

impl ArbitraryIntrospector for NumberIntrospector {
    fn name(&self) -> &'static str {
        "number"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        scalar_kind(context) == Some(ScalarKind::Number)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let metadata = context.property().metadata();
        let min = metadata.get_f64("min").unwrap_or(0.0);
        let max = metadata.get_f64("max").unwrap_or(100.0);
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        let value: f64 = context.random(|rng| rng.gen_range(low..=high));
        Ok(ArbitraryIntrospectorResult::new(json!(value)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIntrospector;

impl ArbitraryIntrospector for UuidIntrospector {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        scalar_kind(context) == Some(ScalarKind::Uuid)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let bytes: [u8; 16] = context.random(|rng| rng.gen());
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Ok(ArbitraryIntrospectorResult::new(json!(uuid.to_string())))
    }
}

/// Named text generators accepted by the `faker` metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakerKind {
    // Personal
    #[serde(alias = "name")]
    FullName,
    FirstName,
    LastName,
    Username,

    // Contact
    Email,
    Phone,

    // Address
    StreetAddress,
    City,
    State,
    Country,
    PostalCode,

    // Text
    Word,
    Sentence,
    Paragraph,
    Lorem,
}

impl FakerKind {
    pub fn generate(self, rng: &mut StdRng) -> String {
        match self {
            FakerKind::FullName => Name().fake_with_rng(rng),
            FakerKind::FirstName => FirstName().fake_with_rng(rng),
            FakerKind::LastName => LastName().fake_with_rng(rng),
            FakerKind::Username => Username().fake_with_rng(rng),
            FakerKind::Email => SafeEmail().fake_with_rng(rng),
            FakerKind::Phone => PhoneNumber().fake_with_rng(rng),
            FakerKind::StreetAddress => StreetName().fake_with_rng(rng),
            FakerKind::City => CityName().fake_with_rng(rng),
            FakerKind::State => StateAbbr().fake_with_rng(rng),
            FakerKind::Country => CountryName().fake_with_rng(rng),
            FakerKind::PostalCode => PostCode().fake_with_rng(rng),
            FakerKind::Word => Word().fake_with_rng(rng),
            FakerKind::Sentence => Sentence(1..10).fake_with_rng(rng),
            FakerKind::Paragraph => Paragraph(1..3).fake_with_rng(rng),
            FakerKind::Lorem => Sentence(1..5).fake_with_rng(rng),
        }
    }
}

/// Generates a string from a simple pattern: `#` digit, `?` lowercase
/// letter, `*` either, anything else copied verbatim.
pub fn generate_from_pattern(pattern: &str, rng: &mut StdRng) -> String {
    let mut result = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '#' => result.push(char::from(b'0' + rng.gen_range(0..10u8))),
            '?' => result.push(char::from(rng.gen_range(b'a'..=b'z'))),
            '*' => {
                if rng.gen_bool(0.5) {
                    result.push(char::from(b'0' + rng.gen_range(0..10u8)))
                } else {
                    result.push(char::from(rng.gen_range(b'a'..=b'z')))
                }
            }
            _ => result.push(c),
        }
    }
    result
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringIntrospector;

impl ArbitraryIntrospector for StringIntrospector {
    fn name(&self) -> &'static str {
        "string"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        scalar_kind(context) == Some(ScalarKind::String)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let metadata = context.property().metadata();

        let faker = metadata.get("faker").and_then(|raw| {
            match serde_json::from_value::<FakerKind>(raw.clone()) {
                Ok(kind) => Some(kind),
                Err(_) => {
                    tracing::warn!("Unknown faker type {} on {}, using word", raw, context.property());
                    None
                }
            }
        });

        let mut text = context.random(|rng| match (faker, metadata.get_str("pattern")) {
            (Some(kind), _) => kind.generate(rng),
            (None, Some(pattern)) => generate_from_pattern(pattern, rng),
            (None, None) => FakerKind::Word.generate(rng),
        });

        if let Some(max_length) = metadata.get_usize("max_length") {
            if let Some((cut, _)) = text.char_indices().nth(max_length) {
                text.truncate(cut);
            }
        }
        Ok(ArbitraryIntrospectorResult::new(Value::String(text)))
    }
}

/// Picks one of a closed set of values. An enum without values yields EMPTY.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumIntrospector;

impl ArbitraryIntrospector for EnumIntrospector {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        matches!(context.type_definition(), Some(TypeDefinition::Enum { .. }))
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let values = match context.type_definition() {
            Some(TypeDefinition::Enum { values }) if !values.is_empty() => values,
            _ => return Ok(ArbitraryIntrospectorResult::EMPTY),
        };
        let idx = context.random(|rng| rng.gen_range(0..values.len()));
        Ok(ArbitraryIntrospectorResult::new(json!(values[idx])))
    }
}

/// Assembles an object from its already generated, named children.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIntrospector;

impl ArbitraryIntrospector for ObjectIntrospector {
    fn name(&self) -> &'static str {
        "object"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        matches!(context.type_definition(), Some(TypeDefinition::Object { .. }))
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let mut object = Map::new();
        for child in context.children() {
            let name = child.property().field_name().ok_or_else(|| {
                GenerationError::invalid_structure("named object field", child.property())
            })?;
            object.insert(
                name.to_string(),
                child.arbitrary().cloned().unwrap_or(Value::Null),
            );
        }
        Ok(ArbitraryIntrospectorResult::new(Value::Object(object)))
    }
}

/// Assembles an array from its elements in sequence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerIntrospector;

impl ArbitraryIntrospector for ContainerIntrospector {
    fn name(&self) -> &'static str {
        "container"
    }

    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        matches!(context.type_definition(), Some(TypeDefinition::Container { .. }))
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let children = context.children();
        let mut values: Vec<Value> = children
            .iter()
            .map(|child| child.arbitrary().cloned().unwrap_or(Value::Null))
            .collect();

        if context.property().metadata().flag("unique") == Some(true) {
            let exhausted = |attempts| GenerationError::UniqueElementsExhausted {
                property: context.property().to_string(),
                attempts,
            };
            let is_fixed: Vec<bool> = children
                .iter()
                .map(|child| child.arbitrary_property().fixed_value().is_some())
                .collect();

            // Fixed elements are never regenerated; they claim their values first.
            let mut taken: Vec<Value> = Vec::with_capacity(values.len());
            for i in (0..values.len()).filter(|i| is_fixed[*i]) {
                if taken.contains(&values[i]) {
                    return Err(exhausted(0));
                }
                taken.push(values[i].clone());
            }

            for i in (0..values.len()).filter(|i| !is_fixed[*i]) {
                let mut attempts = 0;
                while taken.contains(&values[i]) {
                    if attempts == MAX_UNIQUE_ATTEMPTS {
                        return Err(exhausted(attempts));
                    }
                    values[i] = context.generate_nested(children[i].arbitrary_property())?;
                    attempts += 1;
                }
                taken.push(values[i].clone());
            }
        }
        Ok(ArbitraryIntrospectorResult::new(Value::Array(values)))
    }
}
