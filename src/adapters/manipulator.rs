//! Customizations applied to the nodes a [`NodeResolver`] selects.

use rand::rngs::StdRng;
use serde_json::Value;

use crate::adapters::expression::ArbitraryExpression;
use crate::adapters::node_resolver::NodeResolver;
use crate::adapters::tree_builder::ArbitraryTreeBuilder;
use crate::domain::arbitrary::{ArbitraryTree, NodeId, NullInject};
use crate::domain::error::{GenerationError, GenerationResult};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeManipulator {
    /// Fix the node to a value; its children are no longer generated.
    Set(Value),
    /// Fix the node to `null`.
    SetNull,
    NotNull,
    /// Replace the node's null probability.
    NullInject(f64),
    /// Rebuild a container with exactly this many elements.
    Size(usize),
    /// Switch an abstract slot to its n-th candidate implementation.
    Candidate(usize),
}

impl NodeManipulator {
    /// Structural manipulators replace subtrees and run before the others.
    pub fn is_structural(&self) -> bool {
        matches!(self, NodeManipulator::Size(_) | NodeManipulator::Candidate(_))
    }

    pub fn apply(
        &self,
        tree: &mut ArbitraryTree,
        id: NodeId,
        builder: &ArbitraryTreeBuilder,
        rng: &mut StdRng,
    ) -> GenerationResult<()> {
        match self {
            NodeManipulator::Set(value) => {
                set_fixed(tree, id, Some(value.clone()));
                tree.require_path(id);
            }
            NodeManipulator::SetNull => {
                set_fixed(tree, id, Some(Value::Null));
                tree.require_path(id);
            }
            NodeManipulator::NotNull => {
                tree.require_element(id);
                tree.require_path(id);
            }
            NodeManipulator::NullInject(weight) => {
                let node = tree.node_mut(id);
                let updated = node
                    .arbitrary_property()
                    .with_null_inject(NullInject::weight(*weight));
                node.set_arbitrary_property(updated);
                tree.invalidate(id);
            }
            NodeManipulator::Size(size) => {
                builder.resize(tree, id, *size, rng)?;
                tree.require_element(id);
                tree.require_path(id);
            }
            NodeManipulator::Candidate(index) => {
                let node = tree.node(id);
                let available = node.candidates().len();
                if available == 0 {
                    return Err(GenerationError::invalid_structure(
                        "abstract property",
                        node.property(),
                    ));
                }
                let candidate = node.candidates().get(*index).cloned().ok_or_else(|| {
                    GenerationError::CandidateOutOfRange {
                        index: *index,
                        available,
                        property: node.property().to_string(),
                    }
                })?;

                let node = tree.node_mut(id);
                let switched = node.arbitrary_property().with_property(candidate, false);
                node.set_arbitrary_property(switched);
                builder.rebuild(tree, id, rng)?;
                tree.require_element(id);
                tree.require_path(id);
            }
        }
        Ok(())
    }
}

fn set_fixed(tree: &mut ArbitraryTree, id: NodeId, value: Option<Value>) {
    let node = tree.node_mut(id);
    let fixed = node.arbitrary_property().with_fixed(value);
    node.set_arbitrary_property(fixed);
    tree.invalidate(id);
}

/// A node query paired with the customization to apply to its result.
#[derive(Debug)]
pub struct ArbitraryManipulator {
    resolver: Box<dyn NodeResolver>,
    manipulator: NodeManipulator,
}

impl ArbitraryManipulator {
    pub fn new(resolver: Box<dyn NodeResolver>, manipulator: NodeManipulator) -> Self {
        Self {
            resolver,
            manipulator,
        }
    }

    /// Targets the nodes addressed by a path expression such as `items[*].name`.
    pub fn expression(expression: &str, manipulator: NodeManipulator) -> GenerationResult<Self> {
        let resolver = ArbitraryExpression::parse(expression)?.to_node_resolver();
        Ok(Self::new(resolver, manipulator))
    }

    pub fn manipulator(&self) -> &NodeManipulator {
        &self.manipulator
    }

    /// Applies the manipulator to every selected node and returns how many
    /// were touched.
    pub fn apply(
        &self,
        tree: &mut ArbitraryTree,
        builder: &ArbitraryTreeBuilder,
        rng: &mut StdRng,
    ) -> GenerationResult<usize> {
        let selected = self.resolver.resolve(tree)?;
        for id in &selected {
            self.manipulator.apply(tree, *id, builder, rng)?;
        }
        tracing::debug!(
            "Applied {:?} to {} node(s) via {:?}",
            self.manipulator,
            selected.len(),
            self.resolver
        );
        Ok(selected.len())
    }
}
