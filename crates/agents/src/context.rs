//! Shared inputs for agent calls.

use qa_knowledge::{KnowledgeBase, RetrievedChunk};
use qa_llm::Generator;
use std::path::Path;

/// Chunks retrieved for test-case generation unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 8;

/// Everything an agent needs besides its own arguments.
///
/// `workspace` is where prompt overrides (`.qa/prompts/<id>.yml`) are looked up.
#[derive(Debug, Clone, Copy)]
pub struct AgentContext<'a> {
    pub knowledge: &'a KnowledgeBase,
    pub generator: &'a Generator,
    pub workspace: &'a Path,
    pub top_k: usize,
}

impl<'a> AgentContext<'a> {
    pub fn new(knowledge: &'a KnowledgeBase, generator: &'a Generator, workspace: &'a Path) -> Self {
        Self {
            knowledge,
            generator,
            workspace,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// `[Source: <document>] <text>` per chunk, in the given order, separated by
/// blank lines.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let source = match chunk.metadata.source_document.as_str() {
                "" => "unknown",
                s => s,
            };
            format!("[Source: {}] {}", source, chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
