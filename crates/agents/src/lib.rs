//! Generation agents for the QA Agent.
//!
//! Two agents share one [`AgentContext`]:
//! - [`generate_test_cases`] turns a request into grounded test cases
//! - [`generate_script`] turns one [`TestCase`] into a Selenium script for
//!   the page under test

pub mod context;
pub mod script;
pub mod test_case;
pub mod test_cases;

pub use context::{format_context, AgentContext, DEFAULT_TOP_K};
pub use script::{
    extract_code, fallback_script, generate_script, page_file_url, select_script,
    MIN_SCRIPT_CHARS, SCRIPT_CONTEXT_CHUNKS,
};
pub use test_case::{parse_markdown_table, TestCase};
pub use test_cases::generate_test_cases;
