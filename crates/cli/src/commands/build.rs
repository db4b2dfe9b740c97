//! Build command handler.

use clap::Args;
use qa_core::{config::AppConfig, AppResult};
use qa_knowledge::{load_documents, KnowledgeBase};
use std::path::PathBuf;

/// Ingest documents and an optional page-under-test
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("inputs")
        .required(true)
        .multiple(true)
        .args(["docs", "page"])
))]
pub struct BuildCommand {
    /// Document files or directories (md, txt, json, pdf, html)
    #[arg(long = "doc")]
    pub docs: Vec<PathBuf>,

    /// HTML page the generated scripts will drive
    #[arg(long)]
    pub page: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command with {} paths", self.docs.len());

        let documents = load_documents(&self.docs)?;
        let page = match &self.page {
            Some(path) => load_documents(std::slice::from_ref(path))?.into_iter().next(),
            None => None,
        };

        let mut kb = KnowledgeBase::open(config)?;
        let stats = kb.build(&documents, page.as_ref()).await?;
        kb.save_state(config, &documents, self.page.as_deref())?;

        if self.json {
            let output = serde_json::json!({
                "collection": config.knowledge.collection,
                "documents": stats.documents,
                "chunks": stats.chunks,
                "page": stats.page,
                "degraded": stats.degraded,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks) in {:.2}s",
                stats.documents, stats.chunks, stats.duration_secs
            );
            if let Some(page) = &stats.page {
                println!("Page under test: {}", page);
            }
            for name in &stats.degraded {
                println!("  degraded parse: {}", name);
            }
        }

        Ok(())
    }
}
