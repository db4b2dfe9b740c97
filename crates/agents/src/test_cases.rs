//! Test-case generation agent.

use crate::context::{format_context, AgentContext};
use qa_core::AppResult;
use qa_prompt::{build_prompt, load_prompt, TEST_CASES_PROMPT_ID};
use std::collections::HashMap;
use tracing::info;

/// Generate test cases for `query`, grounded in the most relevant chunks.
///
/// The generator's output is returned as is; it is usually a Markdown table
/// or JSON but nothing checks that.
pub async fn generate_test_cases(query: &str, ctx: &AgentContext<'_>) -> AppResult<String> {
    let chunks = ctx.knowledge.retrieve(query, ctx.top_k).await?;
    let context = format_context(&chunks);

    let definition = load_prompt(ctx.workspace, TEST_CASES_PROMPT_ID)?;
    let variables = HashMap::from([
        ("query".to_string(), query.to_string()),
        ("context".to_string(), context),
    ]);
    let prompt = build_prompt(&definition, variables)?;

    info!(
        "Generating test cases from {} chunks with '{}'",
        chunks.len(),
        ctx.generator.provider_name()
    );
    Ok(ctx
        .generator
        .generate(&prompt.user, prompt.system.as_deref())
        .await)
}
