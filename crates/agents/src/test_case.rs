//! Test-case records exchanged between the two agents.
//!
//! Generated output is free-form, so a test case reaches the script agent
//! either as a JSON object pasted by the user or as a row picked from the
//! first Markdown table in the last generated output.

use qa_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const DEFAULT_ID: &str = "test";
const DEFAULT_FEATURE: &str = "Checkout";
const DEFAULT_SCENARIO: &str = "Run selected test scenario.";

/// One test case. Every field is optional; accessors supply defaults.
///
/// JSON keys accepted (first is canonical):
///
/// | field | keys |
/// |-------|------|
/// | `id` | `Test_ID`, `test_id`, `id`, `ID` |
/// | `feature` | `Feature`, `feature` |
/// | `scenario` | `Test_Scenario`, `test_scenario`, `scenario`, `Scenario` |
/// | `expected_result` | `Expected_Result`, `expected_result`, `expected`, `Expected` |
/// | `grounded_in` | `Grounded_In`, `grounded_in`, `source`, `Source` |
///
/// Numbers and booleans are accepted and kept as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(
        rename = "Test_ID",
        alias = "test_id",
        alias = "id",
        alias = "ID",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(
        rename = "Feature",
        alias = "feature",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub feature: Option<String>,

    #[serde(
        rename = "Test_Scenario",
        alias = "test_scenario",
        alias = "scenario",
        alias = "Scenario",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub scenario: Option<String>,

    #[serde(
        rename = "Expected_Result",
        alias = "expected_result",
        alias = "expected",
        alias = "Expected",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_result: Option<String>,

    #[serde(
        rename = "Grounded_In",
        alias = "grounded_in",
        alias = "source",
        alias = "Source",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub grounded_in: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TestCase {
    /// Parse a JSON object. Anything else is a caller input error.
    pub fn from_json(text: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text.trim()).map_err(|e| {
            AppError::Input(format!("Please provide a valid JSON test case: {}", e))
        })?;
        if !value.is_object() {
            return Err(AppError::Input(
                "Please provide a valid JSON test case: expected an object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::Input(format!("Please provide a valid JSON test case: {}", e)))
    }

    /// Id, or `test`.
    pub fn id_or_default(&self) -> &str {
        non_blank(&self.id).unwrap_or(DEFAULT_ID)
    }

    /// Feature, or `Checkout`.
    pub fn feature_or_default(&self) -> &str {
        non_blank(&self.feature).unwrap_or(DEFAULT_FEATURE)
    }

    /// Scenario, or `Run selected test scenario.`.
    pub fn scenario_or_default(&self) -> &str {
        non_blank(&self.scenario).unwrap_or(DEFAULT_SCENARIO)
    }

    pub fn expected_result(&self) -> Option<&str> {
        non_blank(&self.expected_result)
    }

    /// `<id>.py` with the id reduced to `[A-Za-z0-9_-]`.
    pub fn script_file_name(&self) -> String {
        let stem: String = self
            .id_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.py", stem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Feature,
    Scenario,
    Expected,
    GroundedIn,
    Other,
}

impl Column {
    fn from_header(cell: &str) -> Self {
        let key: String = cell
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "testid" | "id" | "tcid" => Self::Id,
            "feature" => Self::Feature,
            "testscenario" | "scenario" => Self::Scenario,
            "expectedresult" | "expected" => Self::Expected,
            "groundedin" | "source" | "sources" => Self::GroundedIn,
            _ => Self::Other,
        }
    }
}

fn table_cells(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(|c| c.trim().to_string()).collect())
}

fn is_separator(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Rows of the first pipe table whose header names a test id or scenario
/// column.
pub fn parse_markdown_table(text: &str) -> Vec<TestCase> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let Some(header) = table_cells(line) else {
            continue;
        };
        let columns: Vec<Column> = header.iter().map(|h| Column::from_header(h)).collect();
        if !columns
            .iter()
            .any(|c| matches!(c, Column::Id | Column::Scenario))
        {
            continue;
        }

        let mut cases = Vec::new();
        for row_line in &lines[i + 1..] {
            let Some(cells) = table_cells(row_line) else {
                break;
            };
            if is_separator(&cells) {
                continue;
            }

            let mut case = TestCase::default();
            for (column, cell) in columns.iter().zip(cells) {
                if cell.is_empty() {
                    continue;
                }
                let slot = match column {
                    Column::Id => &mut case.id,
                    Column::Feature => &mut case.feature,
                    Column::Scenario => &mut case.scenario,
                    Column::Expected => &mut case.expected_result,
                    Column::GroundedIn => &mut case.grounded_in,
                    Column::Other => continue,
                };
                *slot = Some(cell);
            }
            if case != TestCase::default() {
                cases.push(case);
            }
        }
        return cases;
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_canonical_keys() {
        let tc = TestCase::from_json(
            r#"{"Test_ID": "TC-001", "Feature": "Discount Code",
                "Test_Scenario": "Apply a valid discount code \"SAVE15\".",
                "Expected_Result": "Total price is reduced by 15%.",
                "Grounded_In": "product_specs.md"}"#,
        )
        .unwrap();
        assert_eq!(tc.id_or_default(), "TC-001");
        assert_eq!(tc.feature_or_default(), "Discount Code");
        assert_eq!(tc.scenario_or_default(), "Apply a valid discount code \"SAVE15\".");
        assert_eq!(tc.expected_result(), Some("Total price is reduced by 15%."));
        assert_eq!(tc.grounded_in.as_deref(), Some("product_specs.md"));
    }

    #[test]
    fn test_from_json_aliases_and_scalars() {
        let tc = TestCase::from_json(r#"{"id": 7, "scenario": "Pay", "extra": [1]}"#).unwrap();
        assert_eq!(tc.id.as_deref(), Some("7"));
        assert_eq!(tc.scenario_or_default(), "Pay");
        assert_eq!(tc.feature_or_default(), "Checkout");
    }

    #[test]
    fn test_defaults_for_missing_or_blank() {
        let tc = TestCase::from_json(r#"{"Feature": "  "}"#).unwrap();
        assert_eq!(tc.id_or_default(), "test");
        assert_eq!(tc.feature_or_default(), "Checkout");
        assert_eq!(tc.scenario_or_default(), "Run selected test scenario.");
        assert_eq!(tc.script_file_name(), "test.py");
    }

    #[test]
    fn test_invalid_json_is_input_error() {
        for bad in ["not json", "[1, 2]", "\"TC-001\"", ""] {
            let err = TestCase::from_json(bad).unwrap_err();
            assert!(err.is_input_error(), "{}", bad);
        }
    }

    #[test]
    fn test_script_file_name_sanitised() {
        let tc = TestCase {
            id: Some("TC 001/../x".to_string()),
            ..Default::default()
        };
        assert_eq!(tc.script_file_name(), "TC_001____x.py");
    }

    #[test]
    fn test_parse_markdown_table() {
        let text = "Here are the cases:\n\n\
            | Test_ID | Feature | Test_Scenario | Expected_Result | Grounded_In |\n\
            |---------|---------|---------------|-----------------|-------------|\n\
            | TC-001 | Discount Code | Apply valid code SAVE15 | Total reduced by 15% | product_specs.md |\n\
            | TC-002 | Discount Code | Apply invalid code ABC | Error message shown | product_specs.md |\n\
            \n\
            | Other | Table |\n|---|---|\n| a | b |\n";

        let cases = parse_markdown_table(text);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id.as_deref(), Some("TC-001"));
        assert_eq!(cases[1].scenario.as_deref(), Some("Apply invalid code ABC"));
        assert_eq!(cases[1].expected_result.as_deref(), Some("Error message shown"));
        assert_eq!(cases[1].grounded_in.as_deref(), Some("product_specs.md"));
    }

    #[test]
    fn test_parse_table_skips_unrelated_tables() {
        let text = "| Name | Price |\n|---|---|\n| Mouse | 25 |\n\n\
            | ID | Scenario |\n| :-- | :-- |\n| 3 | Express shipping |";
        let cases = parse_markdown_table(text);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id_or_default(), "3");
        assert_eq!(cases[0].scenario_or_default(), "Express shipping");
    }

    #[test]
    fn test_parse_table_without_table() {
        assert!(parse_markdown_table("no table here").is_empty());
    }
}
