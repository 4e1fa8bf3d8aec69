use crate::comparison::{ComparisonRecord, Status};
use crate::schema::{Insight, InsightType, Priority};
use serde::{Deserialize, Serialize};

pub const TOP_RECOMMENDATIONS: usize = 5;
const DOMINANT_SHARE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    Strong,
    Concerning,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub performance_level: PerformanceLevel,
    pub strengths: usize,
    pub weaknesses: usize,
    pub total_metrics: usize,
    pub high_priority_items: usize,
    pub critical_issues: usize,
    pub summary: String,
    pub top_recommendations: Vec<String>,
}

impl ExecutiveSummary {
    pub fn build(records: &[ComparisonRecord], insights: &[Insight], industry_name: &str) -> Self {
        let strengths = records.iter().filter(|r| r.status == Status::Positive).count();
        let weaknesses = records.iter().filter(|r| r.status == Status::Negative).count();
        let total = records.len();
        let dominant = |count: usize| (count as f64) >= (total as f64) * DOMINANT_SHARE;

        let performance_level = if strengths > weaknesses && dominant(strengths) {
            PerformanceLevel::Strong
        } else if weaknesses > strengths && dominant(weaknesses) {
            PerformanceLevel::Concerning
        } else {
            PerformanceLevel::Mixed
        };

        let summary = match performance_level {
            PerformanceLevel::Strong => format!(
                "Your company demonstrates strong performance compared to {} industry benchmarks, with {} out of {} metrics above median. Focus on maintaining strengths while addressing remaining gaps.",
                industry_name, strengths, total
            ),
            PerformanceLevel::Concerning => format!(
                "Performance analysis reveals {} out of {} metrics below {} industry medians. Immediate strategic attention is required to address underperformance.",
                weaknesses, total, industry_name
            ),
            PerformanceLevel::Mixed => format!(
                "Your company shows mixed performance against {} benchmarks with {} strengths and {} areas for improvement. Balanced approach to optimization recommended.",
                industry_name, strengths, weaknesses
            ),
        };

        Self {
            performance_level,
            strengths,
            weaknesses,
            total_metrics: total,
            high_priority_items: insights
                .iter()
                .filter(|i| i.priority == Priority::High)
                .count(),
            critical_issues: insights
                .iter()
                .filter(|i| matches!(i.insight_type, InsightType::Weakness | InsightType::Risk))
                .count(),
            summary,
            top_recommendations: top_recommendations(insights, TOP_RECOMMENDATIONS),
        }
    }
}

/// Most frequent recommendations among high-priority insights. Ties keep
/// first-seen order.
pub fn top_recommendations(insights: &[Insight], limit: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for recommendation in insights
        .iter()
        .filter(|i| i.priority == Priority::High)
        .flat_map(|i| i.recommendations.iter())
    {
        match counts.iter_mut().find(|(r, _)| *r == recommendation.as_str()) {
            Some(entry) => entry.1 += 1,
            None => counts.push((recommendation.as_str(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(r, _)| r.to_string())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedInsights {
    pub financial: Vec<Insight>,
    pub operational: Vec<Insight>,
    pub marketing: Vec<Insight>,
    pub strategic: Vec<Insight>,
    pub risk: Vec<Insight>,
}

const FINANCIAL_KEYWORDS: [&str; 4] = ["margin", "revenue", "burn", "financial"];
const OPERATIONAL_KEYWORDS: [&str; 4] = ["inventory", "defect", "efficiency", "operational"];
const MARKETING_KEYWORDS: [&str; 4] = ["cac", "conversion", "acquisition", "marketing"];

pub fn categorize_insights(insights: &[Insight]) -> CategorizedInsights {
    let mut buckets = CategorizedInsights::default();

    for insight in insights {
        let label = insight.kpi.to_lowercase();
        let has_keyword = |keywords: &[&str]| keywords.iter().any(|k| label.contains(k));

        let bucket = if has_keyword(&FINANCIAL_KEYWORDS) {
            &mut buckets.financial
        } else if has_keyword(&OPERATIONAL_KEYWORDS) {
            &mut buckets.operational
        } else if has_keyword(&MARKETING_KEYWORDS) {
            &mut buckets.marketing
        } else if insight.insight_type == InsightType::Risk || insight.priority == Priority::High {
            &mut buckets.risk
        } else {
            &mut buckets.strategic
        };
        bucket.push(insight.clone());
    }

    buckets
}
