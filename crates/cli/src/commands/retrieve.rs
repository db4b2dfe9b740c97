//! Retrieve command handler.

use super::open_built;
use clap::Args;
use qa_core::{config::AppConfig, AppResult};

/// Show the chunks most relevant to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: configured top-k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let top_k = self.top_k.unwrap_or(config.knowledge.top_k);
        tracing::info!("Executing retrieve command (top_k={})", top_k);

        let (kb, _) = open_built(config)?;
        let hits = kb.retrieve(&self.query, top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No matching chunks");
        }
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. {} (distance {:.4})",
                rank + 1,
                hit.metadata.source_document,
                hit.distance
            );
            println!("   {}", hit.text.replace('\n', "\n   "));
        }
        Ok(())
    }
}
