//! The Context Processing Engine (§4.3): classifies edit intent, resolves
//! ambiguous references against the current wireframe and recent edits,
//! and produces an enhanced prompt plus a confidence score for the
//! downstream generator.
//!
//! This crate is CPU-only (§5: "the context engine is CPU-only and does
//! not suspend") and holds no state of its own; `ContextEngine` is a
//! cheaply-cloneable, stateless classifier built once at startup from
//! `Settings::confidence_threshold`.

pub mod clarification;
pub mod elements;
pub mod engine;
pub mod intent;
pub mod prompt;
pub mod reference;
pub mod vocabulary;

pub use engine::{ContextEngine, ProcessedEdit};
