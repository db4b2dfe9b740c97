//! Both agents against an unavailable backend.

use qa_agents::{
    generate_script, generate_test_cases, parse_markdown_table, AgentContext, TestCase,
};
use qa_knowledge::embeddings::providers::TrigramEmbedder;
use qa_knowledge::{DistanceMetric, Document, InMemoryCollection, KnowledgeBase};
use qa_llm::{Generator, OfflineClient};
use std::sync::Arc;
use tempfile::TempDir;

const CHECKOUT_PAGE: &str = r#"<html><body>
  <button id="add-item-1">Add</button>
  <input id="discount_code" name="discount_code">
  <button id="apply_coupon">Apply</button>
  <button id="pay_now">Pay Now</button>
  <div id="payment_status"></div>
</body></html>"#;

async fn knowledge_base() -> KnowledgeBase {
    let index = InMemoryCollection::new(
        "knowledgebase",
        DistanceMetric::Cosine,
        Arc::new(TrigramEmbedder::new(384)),
    );
    let mut kb = KnowledgeBase::new(Arc::new(index));
    kb.build(
        &[Document::new(
            "product_specs.md",
            "Discounts: code SAVE15 gives 15% off. Express shipping costs $10.",
        )],
        Some(&Document::new("checkout.html", CHECKOUT_PAGE)),
    )
    .await
    .unwrap();
    kb
}

#[tokio::test]
async fn offline_test_cases_are_the_fallback_table() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base().await;
    let generator = Generator::new(Arc::new(OfflineClient), "llama3");
    let ctx = AgentContext::new(&kb, &generator, temp.path());

    let out = generate_test_cases("discount code", &ctx).await.unwrap();
    assert!(out.starts_with("| Test_ID | Feature | Test_Scenario | Expected_Result | Grounded_In |"));

    let cases = parse_markdown_table(&out);
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].id_or_default(), "TC-001");
    assert_eq!(cases[0].script_file_name(), "TC-001.py");
}

#[tokio::test]
async fn offline_script_is_the_template() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base().await;
    let generator = Generator::new(Arc::new(OfflineClient), "llama3");
    let ctx = AgentContext::new(&kb, &generator, temp.path());

    let case = TestCase::from_json(
        r#"{"Test_ID": "TC-001", "Feature": "Discount Code",
            "Test_Scenario": "Apply valid code SAVE15",
            "Expected_Result": "Total reduced by 15%"}"#,
    )
    .unwrap();
    let url = "file:///tmp/checkout.html";
    let script = generate_script(&case, kb.get_html().unwrap_or(""), url, &ctx)
        .await
        .unwrap();

    assert!(script.contains("driver.get(\"file:///tmp/checkout.html\")"));
    assert!(script.contains("Payment Successful!"));
}

#[tokio::test]
async fn script_without_page_still_generates() {
    let temp = TempDir::new().unwrap();
    let index = InMemoryCollection::new(
        "empty",
        DistanceMetric::Cosine,
        Arc::new(TrigramEmbedder::new(384)),
    );
    let kb = KnowledgeBase::new(Arc::new(index));
    let generator = Generator::new(Arc::new(OfflineClient), "llama3");
    let ctx = AgentContext::new(&kb, &generator, temp.path());

    let script = generate_script(&TestCase::default(), "", "file:///x.html", &ctx)
        .await
        .unwrap();
    assert!(script.contains("driver.get(\"file:///x.html\")"));
}
