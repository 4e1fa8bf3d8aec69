use crate::benchmark::BenchmarkStore;
use crate::comparison::{overall_score, weighted_health, ComparisonEngine, ComparisonRecord, HealthScore};
use crate::error::Result;
use crate::format::{detect_format, FormatClassification};
use crate::ingestion::CsvTable;
use crate::insights::{categorize_insights, CategorizedInsights, ExecutiveSummary, InsightEngine, InsightSource};
use crate::kpi::KpiRegistry;
use crate::mapping::{ColumnMapper, KpiMapping, KpiValues, Layout};
use crate::schema::Insight;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub industry_id: String,
    pub industry_name: String,
    pub generated_at: DateTime<Utc>,
    /// Advisory layout classification, present when the report came from a CSV table.
    pub format: Option<FormatClassification>,
    pub values: KpiValues,
    pub comparisons: Vec<ComparisonRecord>,
    pub overall_score: u32,
    pub health: HealthScore,
    pub insights: Vec<Insight>,
    pub insight_source: InsightSource,
    pub summary: ExecutiveSummary,
}

impl BenchmarkReport {
    pub fn categorized_insights(&self) -> CategorizedInsights {
        categorize_insights(&self.insights)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// End-to-end run: mapped values against one industry, then insights.
pub struct BenchmarkPipeline {
    registry: KpiRegistry,
    store: BenchmarkStore,
    insight_engine: InsightEngine,
    neutral_threshold: i64,
}

impl BenchmarkPipeline {
    pub fn new(store: BenchmarkStore) -> Self {
        Self {
            registry: KpiRegistry::standard(),
            store,
            insight_engine: InsightEngine::default(),
            neutral_threshold: crate::comparison::DEFAULT_NEUTRAL_THRESHOLD,
        }
    }

    /// Standard registry, bundled benchmarks, rule-based insights.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(BenchmarkStore::bundled()?))
    }

    pub fn with_registry(mut self, registry: KpiRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_insight_engine(mut self, insight_engine: InsightEngine) -> Self {
        self.insight_engine = insight_engine;
        self
    }

    pub fn with_neutral_threshold(mut self, threshold: i64) -> Self {
        self.neutral_threshold = threshold;
        self
    }

    pub fn registry(&self) -> &KpiRegistry {
        &self.registry
    }

    pub fn store(&self) -> &BenchmarkStore {
        &self.store
    }

    pub fn insight_engine(&self) -> &InsightEngine {
        &self.insight_engine
    }

    pub fn compare(&self, values: &KpiValues, industry_id: &str) -> Result<Vec<ComparisonRecord>> {
        let benchmark = self.store.get(industry_id)?;
        Ok(ComparisonEngine::new(&self.registry)
            .with_neutral_threshold(self.neutral_threshold)
            .compare(values, benchmark))
    }

    pub async fn run(&self, values: &KpiValues, industry_id: &str) -> Result<BenchmarkReport> {
        let benchmark = self.store.get(industry_id)?;
        info!(
            "Benchmarking {} KPIs against {}",
            values.len(),
            benchmark.name
        );

        let comparisons = self.compare(values, industry_id)?;
        let outcome = self
            .insight_engine
            .generate(&comparisons, &benchmark.name)
            .await;
        let summary = ExecutiveSummary::build(&comparisons, &outcome.insights, &benchmark.name);

        debug!(
            "{} comparisons, {} insights ({:?})",
            comparisons.len(),
            outcome.insights.len(),
            outcome.source
        );

        Ok(BenchmarkReport {
            industry_id: benchmark.id.clone(),
            industry_name: benchmark.name.clone(),
            generated_at: Utc::now(),
            format: None,
            values: values.clone(),
            overall_score: overall_score(&comparisons),
            health: weighted_health(&comparisons),
            comparisons,
            insights: outcome.insights,
            insight_source: outcome.source,
            summary,
        })
    }

    /// Maps `table` with `mapping`, then runs. `layout` overrides the column-count rule.
    pub async fn run_table(
        &self,
        table: &CsvTable,
        mapping: &KpiMapping,
        layout: Option<Layout>,
        industry_id: &str,
    ) -> Result<BenchmarkReport> {
        let format = detect_format(&table.rows);
        debug!("{}", format.description);

        let mapper = match layout {
            Some(layout) => ColumnMapper::with_layout(&table.rows, layout),
            None => ColumnMapper::new(&table.rows),
        };
        let values = mapper.apply(&self.registry, mapping)?;

        let mut report = self.run(&values, industry_id).await?;
        report.format = Some(format);
        Ok(report)
    }
}
