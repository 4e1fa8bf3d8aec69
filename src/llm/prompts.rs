use crate::comparison::ComparisonRecord;
use crate::error::Result;
use serde::Serialize;

pub const INSIGHT_SYSTEM_PROMPT: &str = r#"
You are a KPI benchmarking analyst. You need to give detailed and very useful info.
Return ONLY strict JSON with this schema:
{ "insights": [ { "kpi": string, "type": "strength"|"weakness"|"opportunity"|"risk",
  "priority": "high"|"medium"|"low", "impact": "High"|"Medium"|"Low",
  "message": string, "recommendations": string[] } ] }
Keep every message under 280 characters.
Use concise, business-safe wording. Compulsory 5 recommendations each. No markdown."#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightRequestPayload<'a> {
    industry_name: &'a str,
    comparisons: &'a [ComparisonRecord],
}

/// JSON user message: `{"industryName": ..., "comparisons": [...]}`.
pub fn build_insight_user_prompt(
    industry_name: &str,
    comparisons: &[ComparisonRecord],
) -> Result<String> {
    let payload = InsightRequestPayload {
        industry_name,
        comparisons,
    };
    Ok(serde_json::to_string(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_schema() {
        for token in ["\"insights\"", "opportunity", "\"High\"", "No markdown"] {
            assert!(INSIGHT_SYSTEM_PROMPT.contains(token), "missing {}", token);
        }
    }

    #[test]
    fn test_user_prompt_shape() {
        let prompt = build_insight_user_prompt("Fintech", &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["industryName"], "Fintech");
        assert!(value["comparisons"].as_array().unwrap().is_empty());
    }
}
