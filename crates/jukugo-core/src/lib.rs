//! Jukugo Core - Types and rules for the compound-word graph
//!
//! This crate provides the proficiency level ordinal, graph node types,
//! and the admissibility classifier that decides which dictionary forms
//! become compound words for a given import.

pub mod classify;
pub mod compound;
pub mod error;
pub mod level;
pub mod limits;
pub mod node;
pub mod query;
pub mod script;

pub use classify::{Classifier, Rejection, RejectionStats};
pub use compound::CompoundWord;
pub use error::{Error, Result};
pub use level::Level;
pub use node::{CharacterNode, FormsEdge, WordNode};
pub use query::{CharacterChallenge, CoCharacter, CompoundEntry, CompoundValidation, GraphStats};
pub use script::is_kanji;
