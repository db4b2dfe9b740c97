//! Test-cases command handler.

use super::{last_test_cases_path, open_built, open_generator};
use clap::Args;
use qa_agents::{generate_test_cases, parse_markdown_table, AgentContext};
use qa_core::{config::AppConfig, AppError, AppResult};

/// Generate test cases grounded in the knowledge base
#[derive(Args, Debug)]
pub struct TestCasesCommand {
    /// What to test, e.g. "discount code validation"
    pub query: String,

    /// Print the cases found in the output as JSON
    #[arg(long)]
    pub json: bool,
}

impl TestCasesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing test-cases command");

        let (kb, _) = open_built(config)?;
        let generator = open_generator(config)?;
        let ctx = AgentContext::new(&kb, &generator, &config.workspace)
            .with_top_k(config.knowledge.top_k);

        let output = generate_test_cases(&self.query, &ctx).await?;

        config.ensure_qa_dir()?;
        let path = last_test_cases_path(config);
        std::fs::write(&path, &output)
            .map_err(|e| AppError::Other(format!("Failed to write {:?}: {}", path, e)))?;
        tracing::debug!("Saved test cases to {:?}", path);

        if self.json {
            let cases = parse_markdown_table(&output);
            if cases.is_empty() {
                tracing::warn!("No test-case table found in the output; printing it as is");
                println!("{}", output);
            } else {
                println!("{}", serde_json::to_string_pretty(&cases)?);
            }
        } else {
            println!("{}", output);
        }
        Ok(())
    }
}
