//! Browser-automation script generation agent.
//!
//! The prompt lists the element ids and names found in the page-under-test,
//! its file URL, the selected test case and a few retrieved documentation
//! chunks. The reply is reduced to a runnable script, or replaced by a
//! fixed Selenium template when it carries nothing usable.

use crate::context::{format_context, AgentContext};
use crate::test_case::TestCase;
use qa_core::AppResult;
use qa_knowledge::html::scan_markup;
use qa_llm::is_fallback_output;
use qa_prompt::{build_prompt, load_prompt, SCRIPT_PROMPT_ID};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Replies shorter than this (after trimming) are treated as empty.
pub const MIN_SCRIPT_CHARS: usize = 40;

/// Documentation chunks added to the script prompt.
pub const SCRIPT_CONTEXT_CHUNKS: usize = 4;

const FENCE: &str = "```";

/// Generate a script exercising `test_case` against the page at `page_url`.
///
/// `page_html` is the page-under-test markup; it may be empty when no page
/// was supplied, in which case no ids are offered to the model.
pub async fn generate_script(
    test_case: &TestCase,
    page_html: &str,
    page_url: &str,
    ctx: &AgentContext<'_>,
) -> AppResult<String> {
    let scan = scan_markup(page_html);
    let scenario = test_case.scenario_or_default();

    let chunks = ctx
        .knowledge
        .retrieve(scenario, SCRIPT_CONTEXT_CHUNKS)
        .await?;

    let mut variables = HashMap::from([
        ("url".to_string(), page_url.to_string()),
        ("scenario".to_string(), scenario.to_string()),
        ("feature".to_string(), test_case.feature_or_default().to_string()),
        ("ids".to_string(), scan.ids.join(", ")),
        ("names".to_string(), scan.names.join(", ")),
        ("docs".to_string(), format_context(&chunks)),
    ]);
    if let Some(expected) = test_case.expected_result() {
        variables.insert("expected".to_string(), expected.to_string());
    }

    let definition = load_prompt(ctx.workspace, SCRIPT_PROMPT_ID)?;
    let prompt = build_prompt(&definition, variables)?;

    info!(
        "Generating script for '{}' with {} page ids",
        test_case.id_or_default(),
        scan.ids.len()
    );
    let output = ctx
        .generator
        .generate(&prompt.user, prompt.system.as_deref())
        .await;

    Ok(select_script(&output, page_url))
}

/// Reduce a model reply to a script.
///
/// Canned or near-empty replies yield the template; fenced replies yield the
/// extracted block (or the template if no block looks like code); anything
/// else is returned as is.
pub fn select_script(output: &str, page_url: &str) -> String {
    let trimmed = output.trim();
    if is_fallback_output(trimmed) || trimmed.chars().count() < MIN_SCRIPT_CHARS {
        debug!("Reply unusable, using template script");
        return fallback_script(page_url);
    }

    if !output.contains(FENCE) {
        return output.to_string();
    }

    extract_code(output).unwrap_or_else(|| fallback_script(page_url))
}

struct FencedBlock<'a> {
    label: &'a str,
    body: &'a str,
}

/// Fenced blocks in order. A trailing unclosed fence counts as a block.
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    text.split(FENCE)
        .skip(1)
        .step_by(2)
        .map(|inner| match inner.split_once('\n') {
            Some((label, body)) => FencedBlock {
                label: label.trim(),
                body,
            },
            None => FencedBlock { label: "", body: inner },
        })
        .collect()
}

fn is_python_label(label: &str) -> bool {
    matches!(
        label.to_ascii_lowercase().as_str(),
        "python" | "py" | "python3"
    )
}

fn looks_like_code(body: &str) -> bool {
    body.contains("import ") || body.contains("driver.") || body.contains("def ") || body.contains('=')
}

/// The block labelled python, else the first block that looks like code.
pub fn extract_code(output: &str) -> Option<String> {
    let blocks = fenced_blocks(output);
    blocks
        .iter()
        .find(|b| is_python_label(b.label))
        .or_else(|| blocks.iter().find(|b| looks_like_code(b.body)))
        .map(|b| b.body.trim_end().to_string() + "\n")
}

/// `file://` URL for a local page.
pub fn page_file_url(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()));
    let text = absolute.to_string_lossy().replace('\\', "/");
    match text.strip_prefix('/') {
        Some(rest) => format!("file:///{}", rest),
        None => format!("file:///{}", text),
    }
}

/// Deterministic end-to-end checkout script for `page_url`.
pub fn fallback_script(page_url: &str) -> String {
    format!(
        r#"from selenium import webdriver
from selenium.webdriver.common.by import By
from selenium.webdriver.support import expected_conditions as EC
from selenium.webdriver.support.ui import WebDriverWait

driver = webdriver.Chrome()
driver.get("{page_url}")
wait = WebDriverWait(driver, 10)

try:
    # Cart
    driver.find_element(By.ID, "add-item-1").click()
    driver.find_element(By.ID, "add-item-2").click()

    # Discount code, when the page offers one
    try:
        code = driver.find_element(By.ID, "discount_code")
        code.clear()
        code.send_keys("SAVE15")
        driver.find_element(By.ID, "apply_coupon").click()
    except Exception:
        pass

    try:
        driver.find_element(By.ID, "shipping_express").click()
    except Exception:
        pass

    # Customer details
    driver.find_element(By.ID, "name").send_keys("John Tester")
    driver.find_element(By.ID, "email").send_keys("john.tester@example.com")
    driver.find_element(By.ID, "address").send_keys("123 Test Lane")

    driver.find_element(By.ID, "pay_now").click()

    status = wait.until(EC.presence_of_element_located((By.ID, "payment_status")))
    assert "Payment Successful!" in status.text
finally:
    driver.quit()
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "file:///tmp/checkout.html";

    #[test]
    fn test_fallback_marker_yields_template() {
        let script = select_script(qa_llm::FALLBACK_SCRIPT_NOTE, URL);
        assert!(script.contains("driver.get(\"file:///tmp/checkout.html\")"));
        assert!(script.contains("assert \"Payment Successful!\" in status.text"));
    }

    #[test]
    fn test_short_reply_yields_template() {
        assert_eq!(select_script("  ok  ", URL), fallback_script(URL));
    }

    #[test]
    fn test_unfenced_reply_returned_verbatim() {
        let reply = "from selenium import webdriver\ndriver = webdriver.Chrome()\n";
        assert_eq!(select_script(reply, URL), reply);
    }

    #[test]
    fn test_python_labelled_block_preferred() {
        let reply = "Setup:\n```bash\npip install selenium\n```\n\
                     Script:\n```python\nimport time\ndriver.get(\"x\")\n```\nDone.";
        assert_eq!(
            select_script(reply, URL),
            "import time\ndriver.get(\"x\")\n"
        );
    }

    #[test]
    fn test_first_code_like_block_without_label() {
        let reply = "Notes:\n```\nJust prose in a fence\n```\n\
                     ```\nx = driver.find_element(By.ID, \"pay_now\")\n```\n\
                     ```\ny = 2\n```";
        assert_eq!(
            extract_code(reply).as_deref(),
            Some("x = driver.find_element(By.ID, \"pay_now\")\n")
        );
    }

    #[test]
    fn test_fences_without_code_yield_template() {
        let reply = "Here is some explanation of the plan:\n```\nClick the button\n```\n";
        assert_eq!(select_script(reply, URL), fallback_script(URL));
    }

    #[test]
    fn test_unclosed_fence_still_extracted() {
        let reply = "Here you go, a complete script follows:\n```py\nimport os\nprint(os.name)";
        assert_eq!(extract_code(reply).as_deref(), Some("import os\nprint(os.name)\n"));
    }

    #[test]
    fn test_page_file_url() {
        let temp = std::env::temp_dir().join("checkout.html");
        let url = page_file_url(&temp);
        assert!(url.starts_with("file:///"));
        assert!(!url.starts_with("file:////"));
        assert!(url.ends_with("/checkout.html"));
    }
}
