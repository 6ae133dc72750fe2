//! Shared types for the ChocoPy interpreter.
//!
//! This crate defines the typed AST delivered by the external front-end
//! (parser + type checker) and the source spans attached to every node.
//! The front-end hands the tree over as JSON; every node here deserializes
//! from that wire shape.

mod span;
pub mod ast;

pub use span::Span;
