//! Prompt Template System
//!
//! Loads the stage system contracts and renders the per-run user prompts from
//! `.pmt` (prompt template) files.
//!
//! Template loading chain:
//! 1. `.agentflow/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! User prompts use Handlebars syntax for variable substitution; system
//! contracts are used verbatim.

pub mod embedded;
mod loader;

pub use loader::{PromptLoader, StagePromptContext};
