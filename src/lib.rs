//! # KPI Benchmark
//!
//! A library for mapping company KPI spreadsheets onto a fixed KPI taxonomy,
//! comparing the mapped values with industry medians and deriving insights.
//!
//! ## Core Concepts
//!
//! - **Ingestion**: CSV text becomes ordered rows of dynamically typed cells
//! - **Layouts**: *wide* files carry one column per KPI, *long* files one row per KPI
//! - **Mapping**: each KPI key points at a column (wide) or a metric name (long)
//! - **Comparison**: percent difference, polarity-aware status and display formatting
//! - **Insights**: curated rule-based insights, optionally replaced by a
//!   schema-validated LLM answer with a deterministic fallback
//!
//! ## Example
//!
//! ```rust,ignore
//! use kpi_benchmark::*;
//!
//! let table = parse_csv_str("metric,value\nGross Margin,62\nCAC,410\n")?;
//! let mapping: KpiMapping = [
//!     ("gross_margin".to_string(), "Gross Margin".to_string()),
//!     ("cac".to_string(), "CAC".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let pipeline = BenchmarkPipeline::bundled()?;
//! let report = pipeline.run_table(&table, &mapping, None, "saas").await?;
//! println!("{}", report.summary.summary);
//! ```

pub mod benchmark;
pub mod comparison;
pub mod config;
pub mod error;
pub mod format;
pub mod ingestion;
pub mod insights;
pub mod kpi;
pub mod llm;
pub mod mapping;
pub mod report;
pub mod schema;
pub mod session;

pub use benchmark::{BenchmarkStore, IndustryBenchmark};
pub use comparison::{
    format_value, overall_score, weighted_health, ComparisonEngine, ComparisonRecord, HealthLevel,
    HealthScore, Status,
};
pub use config::LlmSettings;
pub use error::{ErrorStage, KpiBenchmarkError, Result};
pub use format::{detect_format, CsvFormat, FormatClassification};
pub use ingestion::{parse_csv_bytes, parse_csv_file, parse_csv_str, CsvTable, RawRow, RawValue};
pub use insights::{
    categorize_insights, CategorizedInsights, ExecutiveSummary, InsightEngine, InsightOutcome,
    InsightSource, InsightTemplates, PerformanceLevel, RuleBasedGenerator,
};
pub use kpi::{KpiCategory, KpiDefinition, KpiRegistry, Unit};
pub use llm::CompletionProvider;
#[cfg(feature = "http")]
pub use llm::ChatCompletionsClient;
pub use mapping::{ColumnMapper, KpiMapping, KpiValues, Layout, MappingSuggestion, ValidationReport};
pub use report::{BenchmarkPipeline, BenchmarkReport};
pub use schema::{Impact, Insight, InsightPayload, InsightType, Priority};
pub use session::{InvocationToken, ReportSession};

use log::info;
use std::path::Path;

/// Reads a CSV file, applies `mapping` and benchmarks against the bundled
/// industry table with rule-based insights.
pub async fn benchmark_csv_file(
    path: &Path,
    mapping: &KpiMapping,
    industry_id: &str,
) -> Result<BenchmarkReport> {
    info!("Benchmarking {} against '{}'", path.display(), industry_id);
    let table = parse_csv_file(path)?;
    BenchmarkPipeline::bundled()?
        .run_table(&table, mapping, None, industry_id)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> KpiMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_long_csv() {
        let table = parse_csv_str(
            "Metric,Value\nGross Margin,62%\nCAC,\"$410\"\nChurn,7.5\nNotes,see deck\n",
        )
        .unwrap();

        let pipeline = BenchmarkPipeline::bundled().unwrap();
        let report = pipeline
            .run_table(
                &table,
                &mapping(&[
                    ("gross_margin", "Gross Margin"),
                    ("cac", "CAC"),
                    ("churn_rate", "Churn"),
                ]),
                None,
                "saas",
            )
            .await
            .unwrap();

        assert_eq!(report.industry_name, "SaaS / Software");
        assert_eq!(report.values.get("cac"), Some(&410.0));
        assert_eq!(report.comparisons.len(), 3);
        assert_eq!(report.format.as_ref().unwrap().format, CsvFormat::Long);
        assert_eq!(report.insight_source, InsightSource::RuleBased);

        // all three trail the benchmark: gm -17, cac +17, churn +50
        assert!(report
            .comparisons
            .iter()
            .all(|c| c.status == Status::Negative));
        assert_eq!(report.comparisons[0].kpi, "churn_rate");
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.summary.performance_level, PerformanceLevel::Concerning);
    }

    #[tokio::test]
    async fn test_end_to_end_wide_csv() {
        let table = parse_csv_str(
            "Gross Margin,Inventory Turnover,Defect Rate,Lead Time\n28,4,4.1,30\n",
        )
        .unwrap();

        let pipeline = BenchmarkPipeline::bundled().unwrap();
        let report = pipeline
            .run_table(
                &table,
                &mapping(&[
                    ("gross_margin", "gross_margin"),
                    ("inventory_turnover", "inventory_turnover"),
                    ("defect_rate", "defect_rate"),
                    ("lead_time", "lead_time"),
                ]),
                None,
                "manufacturing",
            )
            .await
            .unwrap();

        let lead_time = report
            .comparisons
            .iter()
            .find(|c| c.kpi == "lead_time")
            .unwrap();
        assert_eq!(lead_time.your_value, "30");
        assert_eq!(lead_time.difference, "+9");
        assert!(report
            .insights
            .iter()
            .any(|i| i.kpi == "Operational Excellence"));
    }

    #[tokio::test]
    async fn test_user_facing_errors() {
        let pipeline = BenchmarkPipeline::bundled().unwrap();
        let values: KpiValues = [("gross_margin".to_string(), 50.0)].into_iter().collect();

        let err = pipeline.run(&values, "mining").await.unwrap_err();
        assert_eq!(err.stage(), ErrorStage::Benchmark);
        assert!(err.is_user_facing());

        let table = parse_csv_str("metric,value\nCAC,150\n").unwrap();
        let err = pipeline
            .run_table(&table, &KpiMapping::new(), None, "saas")
            .await
            .unwrap_err();
        assert!(matches!(err, KpiBenchmarkError::NoKpisMapped));
        assert_eq!(err.stage(), ErrorStage::Mapping);
    }

    #[tokio::test]
    async fn test_benchmark_csv_file_rejects_other_extensions() {
        let err = benchmark_csv_file(Path::new("kpis.json"), &KpiMapping::new(), "saas")
            .await
            .unwrap_err();
        assert!(matches!(err, KpiBenchmarkError::UnsupportedFile(_)));
    }
}
