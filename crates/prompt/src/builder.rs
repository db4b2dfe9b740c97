//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use qa_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the template and the system instruction are rendered with the same
/// variables. Missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use qa_prompt::{build_prompt, builtin_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt("qa.test_cases")?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "discount code".to_string());
/// vars.insert("context".to_string(), "[Source: specs.md] SAVE15 gives 15% off".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|s| render_template(s, &variables))
        .transpose()?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        definition.output.format.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
