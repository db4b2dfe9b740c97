//! Prompt system for the QA Agent.
//!
//! This crate provides structured prompt management with:
//! - YAML prompt definitions (built-in, overridable per workspace)
//! - Handlebars template rendering
//! - A system instruction carried alongside each template

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, load_prompt, SCRIPT_PROMPT_ID, TEST_CASES_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
