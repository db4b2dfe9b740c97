//! Reset command handler.

use clap::Args;
use qa_core::{config::AppConfig, AppResult};
use qa_knowledge::{config as kb_config, SqliteCollection};

/// Drop every indexed chunk and the stored page-under-test
#[derive(Args, Debug)]
pub struct ResetCommand {}

impl ResetCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let collection = &config.knowledge.collection;
        tracing::info!("Executing reset command for '{}'", collection);

        let removed = SqliteCollection::drop_collection(&config.index_dir(), collection)?;
        kb_config::clear_state(&config.workspace, collection)?;

        println!("Knowledge base '{}' reset ({} chunks removed)", collection, removed);
        Ok(())
    }
}
