//! Insight derivation: rule-based generator, curated templates, executive
//! summary and the LLM refinement with its fallback contract.

pub mod engine;
pub mod rules;
pub mod summary;
pub mod templates;

pub use engine::*;
pub use rules::*;
pub use summary::*;
pub use templates::*;
