pub mod arbitrary;
pub mod context;
pub mod error;
pub mod property;
pub mod types;

pub use arbitrary::{ArbitraryNode, ArbitraryProperty, ArbitraryTree, NodeId, NullInject};
pub use context::{ArbitraryGeneratorContext, NestedGenerator};
pub use error::{GenerationError, GenerationResult};
pub use property::{Metadata, Property, TypeRef};
pub use types::{FieldDefinition, ScalarKind, TypeDefinition, TypeRegistry};
