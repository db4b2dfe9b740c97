//! Script command handler.

use super::{last_test_cases_path, open_built, open_generator};
use clap::Args;
use qa_agents::{generate_script, page_file_url, parse_markdown_table, AgentContext, TestCase};
use qa_core::{config::AppConfig, AppError, AppResult};
use qa_knowledge::{config as kb_config, KnowledgeBaseState};
use std::path::{Path, PathBuf};

const NO_PAGE_URL: &str = "about:blank";

/// Generate a Selenium script for one test case
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("case")
        .required(true)
        .args(["test_case", "pick"])
))]
pub struct ScriptCommand {
    /// Test case as a JSON object
    #[arg(long)]
    pub test_case: Option<String>,

    /// Row of the last generated test-case table (1-based)
    #[arg(long)]
    pub pick: Option<usize>,

    /// Directory to write `<Test_ID>.py` into (default: print to stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl ScriptCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing script command");

        let test_case = self.resolve_test_case(config)?;
        let (kb, state) = open_built(config)?;
        let generator = open_generator(config)?;
        let ctx = AgentContext::new(&kb, &generator, &config.workspace);

        let page_url = page_url(config, &state);
        let page_html = kb.get_html().unwrap_or_default();
        if page_html.is_empty() {
            tracing::warn!("No page under test; selectors will not be grounded in real ids");
        }

        let script = generate_script(&test_case, page_html, &page_url, &ctx).await?;

        match &self.out {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = dir.join(test_case.script_file_name());
                std::fs::write(&path, &script)?;
                println!("Wrote {}", path.display());
            }
            None => println!("{}", script),
        }
        Ok(())
    }

    fn resolve_test_case(&self, config: &AppConfig) -> AppResult<TestCase> {
        if let Some(json) = &self.test_case {
            return TestCase::from_json(json);
        }

        let n = self.pick.unwrap_or(1);
        let path = last_test_cases_path(config);
        let text = std::fs::read_to_string(&path).map_err(|_| {
            AppError::Input("No generated test cases yet; run `qa test-cases <query>` first".to_string())
        })?;
        pick_case(&text, n)
    }
}

/// Row `n` (1-based) of the first test-case table in `text`.
fn pick_case(text: &str, n: usize) -> AppResult<TestCase> {
    let mut cases = parse_markdown_table(text);
    if n == 0 || n > cases.len() {
        return Err(AppError::Input(format!(
            "Test case {} not found; the last output has {} test cases",
            n,
            cases.len()
        )));
    }
    Ok(cases.swap_remove(n - 1))
}

/// URL of the page-under-test: its original file when still present, else
/// the copy stored with the knowledge base.
fn page_url(config: &AppConfig, state: &KnowledgeBaseState) -> String {
    if state.page_filename.is_none() {
        return NO_PAGE_URL.to_string();
    }
    let stored = kb_config::get_page_path(&config.workspace, &config.knowledge.collection);
    let path: &Path = match &state.page_path {
        Some(original) if original.exists() => original,
        _ => &stored,
    };
    page_file_url(path)
}
