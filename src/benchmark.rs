use crate::error::{KpiBenchmarkError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUNDLED_BENCHMARKS: &str = include_str!("../data/benchmarks.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryBenchmark {
    pub id: String,
    pub name: String,
    /// KPI key to industry median. Industries only list the KPIs they track.
    pub metrics: BTreeMap<String, f64>,
}

impl IndustryBenchmark {
    pub fn metric(&self, kpi_key: &str) -> Option<f64> {
        self.metrics.get(kpi_key).copied()
    }

    /// The first `limit` metrics, for compact industry listings.
    pub fn preview(&self, limit: usize) -> Vec<(&str, f64)> {
        self.metrics
            .iter()
            .take(limit)
            .map(|(k, v)| (k.as_str(), *v))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct IndustryEntry {
    name: String,
    metrics: BTreeMap<String, f64>,
}

/// Read-only industry benchmark table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkStore {
    industries: BTreeMap<String, IndustryBenchmark>,
}

impl BenchmarkStore {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, IndustryEntry> = serde_json::from_str(json)
            .map_err(|e| KpiBenchmarkError::BenchmarkUnavailable(e.to_string()))?;

        let industries: BTreeMap<String, IndustryBenchmark> = entries
            .into_iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    IndustryBenchmark {
                        id,
                        name: entry.name,
                        metrics: entry.metrics,
                    },
                )
            })
            .collect();

        if industries.is_empty() {
            return Err(KpiBenchmarkError::BenchmarkUnavailable(
                "benchmark table contains no industries".to_string(),
            ));
        }

        debug!("Loaded {} industry benchmarks", industries.len());
        Ok(Self { industries })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            KpiBenchmarkError::BenchmarkUnavailable(format!("{}: {}", path.display(), e))
        })?;
        info!("Loading industry benchmarks from {}", path.display());
        Self::from_json_str(&json)
    }

    /// The benchmark table shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_BENCHMARKS)
    }

    pub fn get(&self, industry_id: &str) -> Result<&IndustryBenchmark> {
        self.industries
            .get(industry_id)
            .ok_or_else(|| KpiBenchmarkError::IndustryNotFound(industry_id.to_string()))
    }

    pub fn industries(&self) -> impl Iterator<Item = &IndustryBenchmark> {
        self.industries.values()
    }

    pub fn len(&self) -> usize {
        self.industries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.industries.is_empty()
    }
}
