use crate::benchmark::IndustryBenchmark;
use crate::kpi::{KpiCategory, KpiRegistry, Unit};
use crate::mapping::KpiValues;
use log::{debug, warn};
use num_format::{Locale, ToFormattedString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_NEUTRAL_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Positive,
    Negative,
    Neutral,
}

impl Status {
    fn weight(&self) -> f64 {
        match self {
            Status::Positive => 1.0,
            Status::Neutral => 0.0,
            Status::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub kpi: String,
    pub name: String,
    pub your_value: String,
    pub benchmark: String,
    pub difference: String,
    pub percent_difference: i64,
    pub status: Status,
    pub unit: Unit,
    pub category: KpiCategory,
    pub higher_is_better: bool,
    pub raw_value: f64,
    pub raw_benchmark: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl HealthLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            75.. => HealthLevel::Excellent,
            60..=74 => HealthLevel::Good,
            40..=59 => HealthLevel::Average,
            _ => HealthLevel::NeedsImprovement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: u32,
    pub level: HealthLevel,
}

/// `Math.round` semantics: halves go toward positive infinity.
pub fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// One decimal place with halves rounded away from zero.
fn to_fixed_1(value: f64) -> String {
    let rounded = (value.abs() * 10.0).round() / 10.0;
    format!("{:.1}", rounded.copysign(value))
}

fn grouped(value: f64) -> String {
    (js_round(value) as i64).to_formatted_string(&Locale::en)
}

pub fn format_value(value: f64, unit: Unit, show_sign: bool) -> String {
    let formatted = match unit {
        Unit::Currency => {
            if value.abs() >= 1_000_000.0 {
                format!("{}M", to_fixed_1(value / 1_000_000.0))
            } else if value.abs() >= 1_000.0 {
                format!("{}K", to_fixed_1(value / 1_000.0))
            } else {
                grouped(value)
            }
        }
        Unit::Percent | Unit::Multiple | Unit::Dimensionless => to_fixed_1(value),
        Unit::Days => grouped(value),
    };

    if show_sign && value > 0.0 {
        format!("+{}", formatted)
    } else {
        formatted
    }
}

pub fn classify_status(
    your_value: f64,
    benchmark_value: f64,
    percent_difference: i64,
    higher_is_better: bool,
    neutral_threshold: i64,
) -> Status {
    if percent_difference.abs() <= neutral_threshold {
        return Status::Neutral;
    }
    let favourable = if higher_is_better {
        your_value > benchmark_value
    } else {
        your_value < benchmark_value
    };
    if favourable {
        Status::Positive
    } else {
        Status::Negative
    }
}

/// Negative records first, then everything else; each group by descending
/// magnitude of the percent difference. Stable.
pub fn sort_by_severity(records: &mut [ComparisonRecord]) {
    records.sort_by(|a, b| {
        let a_negative = a.status == Status::Negative;
        let b_negative = b.status == Status::Negative;
        match (a_negative, b_negative) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b
                .percent_difference
                .abs()
                .cmp(&a.percent_difference.abs()),
        }
    });
}

pub struct ComparisonEngine<'a> {
    registry: &'a KpiRegistry,
    neutral_threshold: i64,
}

impl<'a> ComparisonEngine<'a> {
    pub fn new(registry: &'a KpiRegistry) -> Self {
        Self {
            registry,
            neutral_threshold: DEFAULT_NEUTRAL_THRESHOLD,
        }
    }

    pub fn with_neutral_threshold(mut self, threshold: i64) -> Self {
        self.neutral_threshold = threshold.abs();
        self
    }

    pub fn compare(
        &self,
        values: &KpiValues,
        benchmark: &IndustryBenchmark,
    ) -> Vec<ComparisonRecord> {
        let mut records = Vec::new();

        for (kpi_key, &your_value) in values {
            let (Some(benchmark_value), Some(definition)) =
                (benchmark.metric(kpi_key), self.registry.get(kpi_key))
            else {
                debug!("Skipping {}: no benchmark or definition", kpi_key);
                continue;
            };

            if benchmark_value == 0.0 || !your_value.is_finite() || !benchmark_value.is_finite() {
                warn!(
                    "Skipping {}: percent difference undefined against benchmark {}",
                    kpi_key, benchmark_value
                );
                continue;
            }

            let difference = your_value - benchmark_value;
            let ratio = js_round(difference / benchmark_value * 100.0);
            if !ratio.is_finite() {
                warn!("Skipping {}: non-finite percent difference", kpi_key);
                continue;
            }
            let percent_difference = ratio as i64;

            let status = classify_status(
                your_value,
                benchmark_value,
                percent_difference,
                definition.higher_is_better,
                self.neutral_threshold,
            );

            records.push(ComparisonRecord {
                kpi: kpi_key.clone(),
                name: definition.name.clone(),
                your_value: format_value(your_value, definition.unit, false),
                benchmark: format_value(benchmark_value, definition.unit, false),
                difference: format_value(difference, definition.unit, true),
                percent_difference,
                status,
                unit: definition.unit,
                category: definition.category,
                higher_is_better: definition.higher_is_better,
                raw_value: your_value,
                raw_benchmark: benchmark_value,
            });
        }

        sort_by_severity(&mut records);
        debug!(
            "Compared {} KPIs against {} benchmarks",
            records.len(),
            benchmark.name
        );
        records
    }
}

/// Unweighted 0-100 score: positive +1, neutral 0, negative -1, averaged and rescaled.
pub fn overall_score(records: &[ComparisonRecord]) -> u32 {
    if records.is_empty() {
        return 50;
    }
    let average =
        records.iter().map(|r| r.status.weight()).sum::<f64>() / records.len() as f64;
    js_round((average + 1.0) * 50.0).clamp(0.0, 100.0) as u32
}

pub fn weighted_health(records: &[ComparisonRecord]) -> HealthScore {
    if records.is_empty() {
        return HealthScore {
            score: 50,
            level: HealthLevel::Average,
        };
    }

    let weighted_sum: f64 = records
        .iter()
        .map(|r| r.status.weight() * r.category.importance())
        .sum();
    let max_possible: f64 = records.iter().map(|r| r.category.importance()).sum();

    let normalized = (weighted_sum / max_possible + 1.0) * 50.0;
    let score = js_round(normalized).clamp(0.0, 100.0) as u32;

    HealthScore {
        score,
        level: HealthLevel::from_score(score),
    }
}
