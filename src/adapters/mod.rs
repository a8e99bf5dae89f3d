pub mod candidate_resolver;
pub mod expression;
pub mod generator;
pub mod introspector;
pub mod introspectors;
pub mod manipulator;
pub mod node_resolver;
pub mod tree_builder;

#[cfg(test)]
mod generator_test;
