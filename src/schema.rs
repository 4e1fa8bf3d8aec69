use crate::error::{KpiBenchmarkError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_CHARS: usize = 280;
pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    #[schemars(description = "The KPI compares favourably with the industry median")]
    Strength,

    #[schemars(description = "The KPI trails the industry median and needs attention")]
    Weakness,

    #[schemars(description = "Room to gain value even though nothing is broken")]
    Opportunity,

    #[schemars(description = "A pattern that threatens sustainability if left alone")]
    Risk,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: high 3, medium 2, low 1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// Bucket by absolute percent difference.
    pub fn from_magnitude(abs_percent_difference: i64) -> Self {
        if abs_percent_difference >= 30 {
            Priority::High
        } else if abs_percent_difference >= 15 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl From<Priority> for Impact {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::High => Impact::High,
            Priority::Medium => Impact::Medium,
            Priority::Low => Impact::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Insight {
    #[schemars(description = "Display name of the KPI or theme this insight is about (e.g., 'Gross Margin', 'Unit Economics')")]
    pub kpi: String,

    #[serde(rename = "type")]
    #[schemars(description = "Kind of finding")]
    pub insight_type: InsightType,

    #[schemars(description = "How urgently the finding should be acted on")]
    pub priority: Priority,

    #[schemars(description = "Expected business impact of acting on the finding")]
    pub impact: Impact,

    #[schemars(description = "One or two sentences, at most 280 characters, no markdown")]
    pub message: String,

    #[schemars(description = "Up to five short, concrete actions")]
    pub recommendations: Vec<String>,
}

impl Insight {
    /// Impact follows priority.
    pub fn new(
        kpi: impl Into<String>,
        insight_type: InsightType,
        priority: Priority,
        message: impl Into<String>,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            kpi: kpi.into(),
            insight_type,
            priority,
            impact: Impact::from(priority),
            message: message.into(),
            recommendations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.kpi.trim().is_empty() {
            return Err(KpiBenchmarkError::InvalidInsightPayload(
                "insight kpi must not be empty".to_string(),
            ));
        }

        let message_len = self.message.chars().count();
        if message_len == 0 || message_len > MAX_MESSAGE_CHARS {
            return Err(KpiBenchmarkError::InvalidInsightPayload(format!(
                "message for '{}' has {} characters (allowed 1-{})",
                self.kpi, message_len, MAX_MESSAGE_CHARS
            )));
        }

        if self.recommendations.len() > MAX_RECOMMENDATIONS {
            return Err(KpiBenchmarkError::InvalidInsightPayload(format!(
                "'{}' has {} recommendations (max {})",
                self.kpi,
                self.recommendations.len(),
                MAX_RECOMMENDATIONS
            )));
        }

        if self.recommendations.iter().any(|r| r.trim().is_empty()) {
            return Err(KpiBenchmarkError::InvalidInsightPayload(format!(
                "'{}' contains an empty recommendation",
                self.kpi
            )));
        }

        Ok(())
    }
}

/// Stable sort, high priority first.
pub fn sort_by_priority(insights: &mut [Insight]) {
    insights.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
}

/// The JSON object an LLM must return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InsightPayload {
    #[schemars(description = "Benchmark insights, one per KPI or cross-KPI theme")]
    pub insights: Vec<Insight>,
}

impl InsightPayload {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(InsightPayload)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Parses a raw model response and checks every insight.
    pub fn parse(raw: &str) -> Result<Self> {
        let payload: InsightPayload = serde_json::from_str(raw.trim())?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<()> {
        if self.insights.is_empty() {
            return Err(KpiBenchmarkError::InvalidInsightPayload(
                "payload contains no insights".to_string(),
            ));
        }
        self.insights.iter().try_for_each(Insight::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_insight() -> Insight {
        Insight::new(
            "Gross Margin",
            InsightType::Strength,
            Priority::Medium,
            "Your gross margin is 11% above the SaaS median.",
            vec!["Maintain current pricing strategy".to_string()],
        )
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = InsightPayload::schema_as_json().unwrap();
        assert!(schema_json.contains("insights"));
        assert!(schema_json.contains("recommendations"));
        assert!(schema_json.contains("opportunity"));
    }

    #[test]
    fn test_serialization_uses_wire_names() {
        let json = serde_json::to_value(sample_insight()).unwrap();
        assert_eq!(json["type"], "strength");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["impact"], "Medium");
    }

    #[test]
    fn test_parse_valid_payload() {
        let raw = r#"{"insights": [{"kpi": "CAC", "type": "risk", "priority": "high",
            "impact": "High", "message": "CAC is climbing.", "recommendations": ["Audit channels"]}]}"#;
        let payload = InsightPayload::parse(raw).unwrap();
        assert_eq!(payload.insights.len(), 1);
        assert_eq!(payload.insights[0].insight_type, InsightType::Risk);
    }

    #[test]
    fn test_rejects_schema_violations() {
        let bad_enum = r#"{"insights": [{"kpi": "CAC", "type": "threat", "priority": "high",
            "impact": "High", "message": "x", "recommendations": []}]}"#;
        assert!(InsightPayload::parse(bad_enum).is_err());

        let bad_impact_case = r#"{"insights": [{"kpi": "CAC", "type": "risk", "priority": "high",
            "impact": "high", "message": "x", "recommendations": []}]}"#;
        assert!(InsightPayload::parse(bad_impact_case).is_err());

        assert!(matches!(
            InsightPayload::parse(r#"{"insights": []}"#),
            Err(KpiBenchmarkError::InvalidInsightPayload(_))
        ));
        assert!(matches!(
            InsightPayload::parse("not json"),
            Err(KpiBenchmarkError::SerializationError(_))
        ));
    }

    #[test]
    fn test_message_and_recommendation_limits() {
        let mut insight = sample_insight();
        insight.message = "x".repeat(MAX_MESSAGE_CHARS);
        assert!(insight.validate().is_ok());

        insight.message = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(insight.validate().is_err());

        let mut insight = sample_insight();
        insight.recommendations = (0..6).map(|i| format!("step {}", i)).collect();
        assert!(insight.validate().is_err());

        let mut insight = sample_insight();
        insight.recommendations = vec!["  ".to_string()];
        assert!(insight.validate().is_err());

        let mut insight = sample_insight();
        insight.kpi = String::new();
        assert!(insight.validate().is_err());
    }

    #[test]
    fn test_priority_buckets_and_sort() {
        assert_eq!(Priority::from_magnitude(30), Priority::High);
        assert_eq!(Priority::from_magnitude(29), Priority::Medium);
        assert_eq!(Priority::from_magnitude(15), Priority::Medium);
        assert_eq!(Priority::from_magnitude(14), Priority::Low);

        let mut low = sample_insight();
        low.priority = Priority::Low;
        low.kpi = "first low".to_string();
        let mut high = sample_insight();
        high.priority = Priority::High;
        let mut second_low = low.clone();
        second_low.kpi = "second low".to_string();

        let mut insights = vec![low, high, second_low];
        sort_by_priority(&mut insights);
        assert_eq!(insights[0].priority, Priority::High);
        assert_eq!(insights[1].kpi, "first low");
        assert_eq!(insights[2].kpi, "second low");
    }
}
