use crate::error::{KpiBenchmarkError, Result};
use crate::format::CsvFormat;
use crate::ingestion::{normalize_header, RawRow, RawValue};
use crate::kpi::{KpiDefinition, KpiRegistry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strsim::jaro_winkler;

/// KPI key to the single numeric value resolved for it.
pub type KpiValues = BTreeMap<String, f64>;

/// KPI key to a CSV column (wide) or a metric name (long).
pub type KpiMapping = BTreeMap<String, String>;

pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.85;

const METRIC_NAME_FALLBACK_COLUMNS: [&str; 3] = ["metric_name", "metric", "kpi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Wide,
    Long,
}

impl Layout {
    /// More than two columns on the first row means one column per KPI.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        match rows.first() {
            Some(row) if row.len() > 2 => Layout::Wide,
            _ => Layout::Long,
        }
    }

    pub fn from_format(format: CsvFormat) -> Option<Self> {
        match format {
            CsvFormat::Wide => Some(Layout::Wide),
            CsvFormat::Long => Some(Layout::Long),
            CsvFormat::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub kpi: String,
    pub option: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct ColumnMapper<'a> {
    rows: &'a [RawRow],
    layout: Layout,
    columns: Vec<String>,
}

impl<'a> ColumnMapper<'a> {
    pub fn new(rows: &'a [RawRow]) -> Self {
        Self::with_layout(rows, Layout::from_rows(rows))
    }

    pub fn with_layout(rows: &'a [RawRow], layout: Layout) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            rows,
            layout,
            columns,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// What a KPI can be mapped to: column names (wide) or the distinct
    /// metric names in file order (long).
    pub fn options(&self) -> Vec<String> {
        match self.layout {
            Layout::Wide => self.columns.clone(),
            Layout::Long => {
                let mut seen = HashSet::new();
                self.rows
                    .iter()
                    .map(|row| self.metric_name(row))
                    .filter(|name| !name.is_empty())
                    .filter(|name| seen.insert(name.clone()))
                    .collect()
            }
        }
    }

    fn metric_name(&self, row: &RawRow) -> String {
        let first = self.columns.first().and_then(|c| row.get(c));
        std::iter::once(first)
            .chain(
                METRIC_NAME_FALLBACK_COLUMNS
                    .iter()
                    .map(|column| row.get(column)),
            )
            .flatten()
            .find(|value| !value.is_empty())
            .map(RawValue::as_text)
            .unwrap_or_default()
    }

    /// Column holding the numbers in long layout.
    pub fn value_column(&self) -> Option<&str> {
        let identifier = self.columns.first().map(String::as_str);
        let by_hint = |hints: &[&str]| {
            self.columns
                .iter()
                .map(String::as_str)
                .find(|c| Some(*c) != identifier && hints.iter().any(|h| c.contains(h)))
        };

        by_hint(&["value", "amount"])
            .or_else(|| by_hint(&["metric"]))
            .or_else(|| self.columns.get(1).map(String::as_str))
    }

    /// Proposes a mapping by fuzzy-matching options against KPI keys, names
    /// and aliases. Each KPI and each option is used at most once.
    pub fn suggest(&self, registry: &KpiRegistry, threshold: f64) -> Vec<MappingSuggestion> {
        let options = self.options();
        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();

        for (kpi_idx, definition) in registry.iter().enumerate() {
            for (option_idx, option) in options.iter().enumerate() {
                let score = similarity(definition, option);
                if score >= threshold {
                    candidates.push((kpi_idx, option_idx, score));
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
        });

        let definitions: Vec<&KpiDefinition> = registry.iter().collect();
        let mut used_kpis = HashSet::new();
        let mut used_options = HashSet::new();
        let mut suggestions = Vec::new();

        for (kpi_idx, option_idx, score) in candidates {
            if used_kpis.contains(&kpi_idx) || used_options.contains(&option_idx) {
                continue;
            }
            used_kpis.insert(kpi_idx);
            used_options.insert(option_idx);
            suggestions.push((
                kpi_idx,
                MappingSuggestion {
                    kpi: definitions[kpi_idx].key.clone(),
                    option: options[option_idx].clone(),
                    score,
                },
            ));
        }

        suggestions.sort_by_key(|(kpi_idx, _)| *kpi_idx);
        debug!("Suggested {} KPI mappings", suggestions.len());
        suggestions.into_iter().map(|(_, s)| s).collect()
    }

    /// Suggestions as a ready-to-edit mapping.
    pub fn suggested_mapping(&self, registry: &KpiRegistry) -> KpiMapping {
        self.suggest(registry, DEFAULT_SUGGESTION_THRESHOLD)
            .into_iter()
            .map(|s| (s.kpi, s.option))
            .collect()
    }

    /// Checks a mapping without converting it. Missing or non-numeric
    /// targets are warnings; unknown KPI keys and an empty mapping are errors.
    pub fn validate(&self, registry: &KpiRegistry, mapping: &KpiMapping) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.rows.is_empty() {
            report.errors.push("No data provided".to_string());
            return report;
        }

        let selected = selected_entries(mapping);
        if selected.is_empty() {
            report.errors.push("No column mappings provided".to_string());
            return report;
        }

        for (kpi, target) in selected {
            if !registry.contains(kpi) {
                report.errors.push(format!("Unknown KPI key: {}", kpi));
                continue;
            }

            let values: Vec<&RawValue> = match self.layout {
                Layout::Wide => self.rows.iter().filter_map(|row| row.get(target)).collect(),
                Layout::Long => {
                    let value_column = self.value_column();
                    self.rows
                        .iter()
                        .filter(|row| self.metric_name(row) == target)
                        .filter_map(|row| value_column.and_then(|c| row.get(c)))
                        .collect()
                }
            };

            let present: Vec<&RawValue> = values.into_iter().filter(|v| !v.is_empty()).collect();
            if present.is_empty() {
                report
                    .warnings
                    .push(format!("No values found for {} in {}", kpi, target));
                continue;
            }

            let non_numeric = present.iter().filter(|v| v.to_number().is_none()).count();
            if non_numeric > 0 {
                report.warnings.push(format!(
                    "Found {} non-numeric values for {}",
                    non_numeric, kpi
                ));
            }
        }

        report
    }

    /// Resolves the mapping to numbers. Entries that do not parse to a
    /// finite number are left out.
    pub fn apply(&self, registry: &KpiRegistry, mapping: &KpiMapping) -> Result<KpiValues> {
        let selected = selected_entries(mapping);
        if selected.is_empty() {
            return Err(KpiBenchmarkError::NoKpisMapped);
        }

        if let Some((unknown, _)) = selected.iter().find(|(kpi, _)| !registry.contains(kpi)) {
            return Err(KpiBenchmarkError::UnknownKpi(unknown.to_string()));
        }

        let mut values = KpiValues::new();
        match self.layout {
            Layout::Wide => {
                if let Some(row) = self.rows.first() {
                    for (kpi, column) in &selected {
                        match row.get(column).and_then(RawValue::to_number) {
                            Some(value) => {
                                values.insert(kpi.to_string(), value);
                            }
                            None => warn!("Column '{}' for {} has no numeric value", column, kpi),
                        }
                    }
                }
            }
            Layout::Long => {
                let value_column = self.value_column();
                for (kpi, metric) in &selected {
                    let resolved = self
                        .rows
                        .iter()
                        .find(|row| self.metric_name(row) == *metric)
                        .zip(value_column)
                        .and_then(|(row, column)| row.get(column))
                        .and_then(RawValue::to_number);

                    match resolved {
                        Some(value) => {
                            values.insert(kpi.to_string(), value);
                        }
                        None => warn!("Metric '{}' for {} has no numeric value", metric, kpi),
                    }
                }
            }
        }

        if values.is_empty() {
            return Err(KpiBenchmarkError::NoNumericValues);
        }

        info!(
            "Mapped {} of {} selected KPIs ({:?} layout)",
            values.len(),
            selected.len(),
            self.layout
        );
        Ok(values)
    }
}

fn selected_entries(mapping: &KpiMapping) -> Vec<(&str, &str)> {
    mapping
        .iter()
        .filter(|(_, target)| !target.trim().is_empty())
        .map(|(kpi, target)| (kpi.as_str(), target.as_str()))
        .collect()
}

fn comparable(text: &str) -> String {
    normalize_header(text).replace('_', " ").trim().to_string()
}

fn similarity(definition: &KpiDefinition, option: &str) -> f64 {
    let option = comparable(option);
    if option.is_empty() {
        return 0.0;
    }

    std::iter::once(definition.key.as_str())
        .chain(std::iter::once(definition.name.as_str()))
        .chain(definition.aliases.iter().map(String::as_str))
        .map(|candidate| jaro_winkler(&comparable(candidate), &option))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_rows() -> Vec<RawRow> {
        vec![RawRow::from_pairs([
            ("gross_margin", RawValue::from(45.2)),
            ("cac", RawValue::from("$150")),
            ("churn_rate", RawValue::from("n/a")),
        ])]
    }

    fn long_rows() -> Vec<RawRow> {
        vec![
            RawRow::from_pairs([("metric", RawValue::from("CAC")), ("value", RawValue::from(150.0))]),
            RawRow::from_pairs([("metric", RawValue::from("Gross Margin")), ("value", RawValue::from("45%"))]),
            RawRow::from_pairs([("metric", RawValue::from("Churn")), ("value", RawValue::Null)]),
            RawRow::from_pairs([("metric", RawValue::from("CAC")), ("value", RawValue::from(999.0))]),
        ]
    }

    fn mapping(pairs: &[(&str, &str)]) -> KpiMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_layout_from_column_count() {
        assert_eq!(Layout::from_rows(&wide_rows()), Layout::Wide);
        assert_eq!(Layout::from_rows(&long_rows()), Layout::Long);
        assert_eq!(Layout::from_rows(&[]), Layout::Long);
    }

    #[test]
    fn test_wide_explicit_layout_reads_first_row() {
        let rows = vec![RawRow::from_pairs([("Gross Margin", 45.2), ("CAC", 150.0)])];
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::with_layout(&rows, Layout::Wide);

        let values = mapper
            .apply(&registry, &mapping(&[("gross_margin", "Gross Margin")]))
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["gross_margin"], 45.2);
    }

    #[test]
    fn test_wide_drops_non_numeric() {
        let rows = wide_rows();
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        let values = mapper
            .apply(
                &registry,
                &mapping(&[
                    ("gross_margin", "gross_margin"),
                    ("cac", "cac"),
                    ("churn_rate", "churn_rate"),
                ]),
            )
            .unwrap();
        assert_eq!(values.get("cac"), Some(&150.0));
        assert!(!values.contains_key("churn_rate"));
        assert!(values.values().all(|v| v.is_finite()));
    }

    #[test]
    fn test_long_layout_resolution() {
        let rows = vec![RawRow::from_pairs([
            ("metric", RawValue::from("CAC")),
            ("value", RawValue::from(150.0)),
        ])];
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        assert_eq!(mapper.value_column(), Some("value"));
        let values = mapper.apply(&registry, &mapping(&[("cac", "CAC")])).unwrap();
        assert_eq!(values["cac"], 150.0);
    }

    #[test]
    fn test_long_layout_uses_first_matching_row() {
        let rows = long_rows();
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        assert_eq!(mapper.options(), vec!["CAC", "Gross Margin", "Churn"]);

        let values = mapper
            .apply(
                &registry,
                &mapping(&[
                    ("cac", "CAC"),
                    ("gross_margin", "Gross Margin"),
                    ("churn_rate", "Churn"),
                ]),
            )
            .unwrap();
        assert_eq!(values["cac"], 150.0);
        assert_eq!(values["gross_margin"], 45.0);
        assert!(!values.contains_key("churn_rate"));
    }

    #[test]
    fn test_value_column_falls_back_to_second_column() {
        let rows = vec![RawRow::from_pairs([
            ("kpi_label", RawValue::from("LTV")),
            ("q4", RawValue::from(1200.0)),
        ])];
        let mapper = ColumnMapper::new(&rows);
        assert_eq!(mapper.value_column(), Some("q4"));
    }

    #[test]
    fn test_mapping_errors() {
        let rows = long_rows();
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        assert!(matches!(
            mapper.apply(&registry, &KpiMapping::new()),
            Err(KpiBenchmarkError::NoKpisMapped)
        ));
        assert!(matches!(
            mapper.apply(&registry, &mapping(&[("cac", "")])),
            Err(KpiBenchmarkError::NoKpisMapped)
        ));
        assert!(matches!(
            mapper.apply(&registry, &mapping(&[("churn_rate", "Churn")])),
            Err(KpiBenchmarkError::NoNumericValues)
        ));
        assert!(matches!(
            mapper.apply(&registry, &mapping(&[("made_up", "CAC")])),
            Err(KpiBenchmarkError::UnknownKpi(_))
        ));
    }

    #[test]
    fn test_validation_warnings() {
        let rows = wide_rows();
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        let report = mapper.validate(
            &registry,
            &mapping(&[("churn_rate", "churn_rate"), ("ltv", "missing_column")]),
        );
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("non-numeric")));
        assert!(report.warnings.iter().any(|w| w.contains("No values found for ltv")));

        let empty = mapper.validate(&registry, &KpiMapping::new());
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_fuzzy_suggestions_for_wide_headers() {
        let rows = vec![RawRow::from_pairs([
            ("gross_margin_", 45.0),
            ("customer_acquisition_cost", 120.0),
            ("churn", 4.0),
            ("headcount", 40.0),
        ])];
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        let suggested = mapper.suggested_mapping(&registry);
        assert_eq!(suggested.get("gross_margin").map(String::as_str), Some("gross_margin_"));
        assert_eq!(suggested.get("cac").map(String::as_str), Some("customer_acquisition_cost"));
        assert_eq!(suggested.get("churn_rate").map(String::as_str), Some("churn"));
        assert!(!suggested.values().any(|v| v == "headcount"));
    }

    #[test]
    fn test_fuzzy_suggestions_for_long_metric_names() {
        let rows = long_rows();
        let registry = KpiRegistry::standard();
        let mapper = ColumnMapper::new(&rows);

        let suggestions = mapper.suggest(&registry, DEFAULT_SUGGESTION_THRESHOLD);
        let cac = suggestions.iter().find(|s| s.kpi == "cac").unwrap();
        assert_eq!(cac.option, "CAC");
        assert_eq!(cac.score, 1.0);

        let options_used: HashSet<&str> = suggestions.iter().map(|s| s.option.as_str()).collect();
        assert_eq!(options_used.len(), suggestions.len());
    }
}
