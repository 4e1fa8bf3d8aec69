use crate::comparison::ComparisonRecord;
use crate::error::{KpiBenchmarkError, Result};
use crate::insights::rules::RuleBasedGenerator;
use crate::insights::templates::InsightTemplates;
use crate::llm::{build_insight_user_prompt, CompletionProvider, INSIGHT_SYSTEM_PROMPT};
use crate::schema::{Insight, InsightPayload};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "http")]
use crate::config::LlmSettings;
#[cfg(feature = "http")]
use crate::llm::ChatCompletionsClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    RuleBased,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightOutcome {
    pub insights: Vec<Insight>,
    pub source: InsightSource,
    /// Why the LLM result was discarded, when it was attempted and failed.
    pub fallback_reason: Option<String>,
}

/// Rule-based insights, optionally replaced wholesale by a validated LLM answer.
pub struct InsightEngine {
    templates: InsightTemplates,
    provider: Option<Box<dyn CompletionProvider>>,
    timeout: Duration,
}

impl InsightEngine {
    pub fn new(templates: InsightTemplates) -> Self {
        Self {
            templates,
            provider: None,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Uses the HTTP client when settings are present, rule-based only otherwise.
    #[cfg(feature = "http")]
    pub fn from_settings(templates: InsightTemplates, settings: Option<&LlmSettings>) -> Self {
        match settings {
            Some(settings) => Self::new(templates)
                .with_provider(ChatCompletionsClient::new(settings))
                .with_timeout(settings.timeout),
            None => Self::new(templates),
        }
    }

    pub fn with_provider(mut self, provider: impl CompletionProvider + 'static) -> Self {
        let provider: Box<dyn CompletionProvider> = Box::new(provider);
        self.provider = Some(provider);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn templates(&self) -> &InsightTemplates {
        &self.templates
    }

    pub fn baseline(&self, records: &[ComparisonRecord], industry_name: &str) -> Vec<Insight> {
        RuleBasedGenerator::new(&self.templates).generate(records, industry_name)
    }

    /// Never fails: any LLM problem yields the rule-based baseline unchanged.
    pub async fn generate(&self, records: &[ComparisonRecord], industry_name: &str) -> InsightOutcome {
        let baseline = self.baseline(records, industry_name);
        debug!("Rule-based baseline: {} insights", baseline.len());

        let Some(provider) = self.provider.as_deref() else {
            debug!("No completion provider configured, using rule-based insights");
            return InsightOutcome {
                insights: baseline,
                source: InsightSource::RuleBased,
                fallback_reason: None,
            };
        };

        if records.is_empty() {
            debug!("No comparisons to analyze, skipping LLM request");
            return InsightOutcome {
                insights: baseline,
                source: InsightSource::RuleBased,
                fallback_reason: None,
            };
        }

        match self.request_insights(provider, records, industry_name).await {
            Ok(insights) => {
                info!("Using {} LLM insights for {}", insights.len(), industry_name);
                InsightOutcome {
                    insights,
                    source: InsightSource::Llm,
                    fallback_reason: None,
                }
            }
            Err(e) => {
                warn!("LLM insights failed, falling back to rule-based: {}", e);
                InsightOutcome {
                    insights: baseline,
                    source: InsightSource::RuleBased,
                    fallback_reason: Some(e.to_string()),
                }
            }
        }
    }

    async fn request_insights(
        &self,
        provider: &dyn CompletionProvider,
        records: &[ComparisonRecord],
        industry_name: &str,
    ) -> Result<Vec<Insight>> {
        let user_prompt = build_insight_user_prompt(industry_name, records)?;

        let raw = tokio::time::timeout(
            self.timeout,
            provider.complete(INSIGHT_SYSTEM_PROMPT, &user_prompt),
        )
        .await
        .map_err(|_| KpiBenchmarkError::LlmTimeout(self.timeout.as_secs()))??;

        debug!("LLM response: {} characters", raw.len());
        Ok(InsightPayload::parse(&raw)?.insights)
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(InsightTemplates::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonEngine;
    use crate::benchmark::IndustryBenchmark;
    use crate::kpi::KpiRegistry;
    use crate::mapping::KpiValues;
    use async_trait::async_trait;

    struct Scripted(Result<String>);

    #[async_trait]
    impl CompletionProvider for Scripted {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(KpiBenchmarkError::Llm(e.to_string())),
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionProvider for Stalled {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    fn records() -> Vec<ComparisonRecord> {
        let registry = KpiRegistry::standard();
        let values: KpiValues = [("gross_margin".to_string(), 40.0), ("cac".to_string(), 500.0)]
            .into_iter()
            .collect();
        let benchmark = IndustryBenchmark {
            id: "saas".to_string(),
            name: "SaaS / Software".to_string(),
            metrics: [("gross_margin".to_string(), 75.0), ("cac".to_string(), 350.0)]
                .into_iter()
                .collect(),
        };
        ComparisonEngine::new(&registry).compare(&values, &benchmark)
    }

    const VALID: &str = r#"{"insights": [{"kpi": "Gross Margin", "type": "weakness",
        "priority": "high", "impact": "High", "message": "Margins trail peers.",
        "recommendations": ["a", "b", "c", "d", "e"]}]}"#;

    #[tokio::test]
    async fn test_without_provider_uses_baseline() {
        let engine = InsightEngine::default();
        let records = records();
        let outcome = engine.generate(&records, "SaaS / Software").await;
        assert_eq!(outcome.source, InsightSource::RuleBased);
        assert_eq!(outcome.insights, engine.baseline(&records, "SaaS / Software"));
        assert!(outcome.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn test_valid_llm_payload_replaces_baseline() {
        let engine = InsightEngine::default().with_provider(Scripted(Ok(VALID.to_string())));
        let outcome = engine.generate(&records(), "SaaS / Software").await;
        assert_eq!(outcome.source, InsightSource::Llm);
        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].message, "Margins trail peers.");
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_baseline() {
        let records = records();
        let baseline = InsightEngine::default().baseline(&records, "SaaS / Software");

        let too_long = VALID.replace("Margins trail peers.", &"x".repeat(281));
        let cases = vec![
            Scripted(Err(KpiBenchmarkError::Llm("connection refused".to_string()))),
            Scripted(Ok("```json\n{}\n```".to_string())),
            Scripted(Ok(r#"{"insights": []}"#.to_string())),
            Scripted(Ok(too_long)),
        ];

        for provider in cases {
            let engine = InsightEngine::default().with_provider(provider);
            let outcome = engine.generate(&records, "SaaS / Software").await;
            assert_eq!(outcome.source, InsightSource::RuleBased);
            assert_eq!(outcome.insights, baseline);
            assert!(outcome.fallback_reason.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let records = records();
        let engine = InsightEngine::default()
            .with_provider(Stalled)
            .with_timeout(Duration::from_secs(2));
        let outcome = engine.generate(&records, "SaaS / Software").await;
        assert_eq!(outcome.source, InsightSource::RuleBased);
        assert_eq!(outcome.insights, engine.baseline(&records, "SaaS / Software"));
        assert_eq!(
            outcome.fallback_reason.as_deref(),
            Some("LLM request timed out after 2 seconds")
        );
    }

    #[tokio::test]
    async fn test_empty_comparisons_skip_llm() {
        let engine = InsightEngine::default().with_provider(Scripted(Ok(VALID.to_string())));
        let outcome = engine.generate(&[], "SaaS / Software").await;
        assert_eq!(outcome.source, InsightSource::RuleBased);
        assert!(outcome.insights.is_empty());
    }
}
