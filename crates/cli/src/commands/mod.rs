//! Command handlers for the QA Agent CLI.
//!
//! One submodule per subcommand, plus the helpers they share.

pub mod build;
pub mod reset;
pub mod retrieve;
pub mod script;
pub mod test_cases;

pub use build::BuildCommand;
pub use reset::ResetCommand;
pub use retrieve::RetrieveCommand;
pub use script::ScriptCommand;
pub use test_cases::TestCasesCommand;

use qa_core::{config::AppConfig, AppError, AppResult};
use qa_knowledge::{config as kb_config, KnowledgeBase, KnowledgeBaseState};
use qa_llm::{create_client, Generator};
use std::path::PathBuf;
use std::time::Duration;

/// File the last `test-cases` output is kept in, relative to `.qa/`.
pub const LAST_TEST_CASES_FILE: &str = "last_test_cases.md";

pub fn last_test_cases_path(config: &AppConfig) -> PathBuf {
    config.qa_dir().join(LAST_TEST_CASES_FILE)
}

/// Generator for the configured backend.
pub fn open_generator(config: &AppConfig) -> AppResult<Generator> {
    let settings = &config.generation;
    let client = create_client(
        &settings.provider,
        Some(&settings.endpoint),
        Duration::from_secs(settings.timeout_secs),
    )?;
    Ok(Generator::new(client, settings.model.clone())
        .with_sampling(settings.temperature, settings.max_tokens))
}

/// Open the knowledge base, refusing one that was never built.
pub fn open_built(config: &AppConfig) -> AppResult<(KnowledgeBase, KnowledgeBaseState)> {
    let collection = &config.knowledge.collection;
    let Some(state) = kb_config::load_state(&config.workspace, collection)? else {
        return Err(AppError::Input(format!(
            "Knowledge base '{}' is empty; build the knowledge base first with `qa build --doc <path>`",
            collection
        )));
    };
    let kb = KnowledgeBase::open(config)?;
    Ok((kb, state))
}
