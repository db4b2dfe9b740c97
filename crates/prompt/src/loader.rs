//! Prompt loader for built-in and workspace YAML prompt definitions.

use crate::types::PromptDefinition;
use qa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the test-case generation prompt.
pub const TEST_CASES_PROMPT_ID: &str = "qa.test_cases";

/// Identifier of the script generation prompt.
pub const SCRIPT_PROMPT_ID: &str = "qa.script";

const BUILTIN_PROMPTS: [(&str, &str); 2] = [
    (
        TEST_CASES_PROMPT_ID,
        include_str!("../prompts/qa.test_cases.yml"),
    ),
    (SCRIPT_PROMPT_ID, include_str!("../prompts/qa.script.yml")),
];

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in the workspace's `.qa/prompts/` directory takes
/// precedence over the built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use qa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "qa.test_cases")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_definition(&contents, &prompt_file.display().to_string())?;
        tracing::info!("Loaded workspace prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id)
}

/// Load a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_definition(source, prompt_id)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".qa").join("prompts")
}

fn parse_definition(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts = dir.join(".qa/prompts");
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_builtins_parse() {
        let cases = builtin_prompt(TEST_CASES_PROMPT_ID).unwrap();
        assert!(cases.system.unwrap().starts_with("You are a QA Test Case generation agent."));

        let script = builtin_prompt(SCRIPT_PROMPT_ID).unwrap();
        assert!(script.system.unwrap().contains("Selenium"));
        assert_eq!(script.output.format, "python");
    }

    #[test]
    fn test_workspace_prompt_overrides_builtin() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            TEST_CASES_PROMPT_ID,
            "id: qa.test_cases\ntitle: Custom\napiVersion: \"1.1\"\ntemplate: \"Q: {{query}}\"\noutput:\n  format: json\n",
        );

        let def = load_prompt(temp.path(), TEST_CASES_PROMPT_ID).unwrap();
        assert_eq!(def.title, "Custom");
        assert_eq!(def.output.format, "json");
    }

    #[test]
    fn test_load_unknown_prompt() {
        let temp = TempDir::new().unwrap();
        assert!(load_prompt(temp.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        write_prompt(temp.path(), "broken", "invalid: yaml: content:");
        assert!(load_prompt(temp.path(), "broken").is_err());
    }
}
