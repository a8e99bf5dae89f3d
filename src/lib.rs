//! # Fixture Forge - Arbitrary Test Fixtures
//!
//! Fixture Forge generates randomized, structurally valid instances of
//! declared types for tests. Types are described once (objects, containers,
//! enums, interfaces and scalars); each request builds a tree of nodes that
//! can be customized through path expressions before values are generated.
//!
//! ## Features
//!
//! - **Node Trees**: one node per field and container element, with cached values
//! - **Path Expressions**: `season[1]`, `$.items[*].name` select nodes to customize
//! - **Manipulators**: fix values, force or inject nulls, resize containers, pick implementations
//! - **Introspector Chain**: pluggable match/introspect dispatch, first match wins
//! - **Interfaces**: abstract slots resolved to ordered concrete candidates
//! - **Validation**: type definitions are checked before generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fixture_forge::adapters::generator::ArbitraryGenerator;
//! use fixture_forge::adapters::manipulator::{ArbitraryManipulator, NodeManipulator};
//! use fixture_forge::config::Settings;
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load fixture.toml and config/types/*
//!     let settings = Settings::new()?;
//!     let generator = ArbitraryGenerator::from_settings(&settings);
//!
//!     let sample = generator.sample_with(
//!         "Sample",
//!         &[ArbitraryManipulator::expression("season[1]", NodeManipulator::Set(json!("winter")))?],
//!     )?;
//!     println!("{}", sample);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: properties, type definitions, the node arena and errors
//! - **Adapters**: resolvers, introspectors, the tree builder and the generator
//! - **Config**: settings loading and validation

pub mod adapters;
pub mod config;
pub mod domain;
