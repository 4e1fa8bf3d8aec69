use crate::ingestion::RawRow;
use log::debug;
use serde::{Deserialize, Serialize};

pub const KPI_KEYWORDS: [&str; 10] = [
    "margin",
    "rate",
    "churn",
    "cac",
    "ltv",
    "turnover",
    "conversion",
    "ratio",
    "cost",
    "revenue",
];

const METRIC_COLUMN_HINTS: [&str; 4] = ["metric", "kpi", "name", "key"];
const VALUE_COLUMN_HINTS: [&str; 3] = ["value", "amount", "number"];
const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvFormat {
    /// KPIs are column headers, one row holds the values.
    Wide,
    /// One row per KPI with a metric-name column and a value column.
    Long,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatClassification {
    pub format: CsvFormat,
    pub confidence: f64,
    pub description: String,
}

impl FormatClassification {
    fn new(format: CsvFormat, confidence: f64, description: &str) -> Self {
        Self {
            format,
            confidence,
            description: description.to_string(),
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

pub fn is_kpi_like(text: &str) -> bool {
    contains_any(text, &KPI_KEYWORDS)
}

/// Advisory classification of the upload layout. The column mapper does not
/// depend on this result.
pub fn detect_format(rows: &[RawRow]) -> FormatClassification {
    let Some(first_row) = rows.first() else {
        return FormatClassification::new(CsvFormat::Unknown, 0.0, "No rows to inspect");
    };

    let columns: Vec<&str> = first_row.keys().collect();
    let column_count = columns.len();
    let kpi_columns = columns.iter().filter(|c| is_kpi_like(c)).count();

    debug!(
        "Format detection: {} columns, {} KPI-like headers",
        column_count, kpi_columns
    );

    if column_count > 2 && kpi_columns > 2 {
        return FormatClassification::new(
            CsvFormat::Wide,
            0.8,
            "Wide format detected: KPIs as column headers",
        );
    }

    if column_count <= 3 {
        let has_metric_column = columns.iter().any(|c| contains_any(c, &METRIC_COLUMN_HINTS));
        let has_value_column = columns.iter().any(|c| contains_any(c, &VALUE_COLUMN_HINTS));

        if has_metric_column && has_value_column {
            return FormatClassification::new(
                CsvFormat::Long,
                0.9,
                "Long format detected: KPIs listed in rows",
            );
        }

        let metric_like_values = rows
            .iter()
            .take(SAMPLE_ROWS)
            .filter_map(|row| row.first_value())
            .filter(|value| is_kpi_like(&value.as_text()))
            .count();

        if metric_like_values > 0 {
            return FormatClassification::new(
                CsvFormat::Long,
                0.7,
                "Long format detected: Metric names found in first column",
            );
        }
    }

    FormatClassification::new(CsvFormat::Unknown, 0.0, "Could not determine CSV format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::RawValue;

    #[test]
    fn test_detects_wide_format() {
        let rows = vec![RawRow::from_pairs([
            ("gross_margin", 45.2),
            ("cac", 150.0),
            ("churn_rate", 3.5),
        ])];
        let result = detect_format(&rows);
        assert_eq!(result.format, CsvFormat::Wide);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_detects_long_format_from_headers() {
        let rows = vec![RawRow::from_pairs([
            ("metric_name", RawValue::from("CAC")),
            ("value", RawValue::from(150.0)),
        ])];
        let result = detect_format(&rows);
        assert_eq!(result.format, CsvFormat::Long);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_detects_long_format_from_first_column_values() {
        let rows = vec![
            RawRow::from_pairs([("label", "Churn"), ("q1", "3.1")]),
            RawRow::from_pairs([("label", "Headcount"), ("q1", "40")]),
        ];
        let result = detect_format(&rows);
        assert_eq!(result.format, CsvFormat::Long);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_unknown_format() {
        let rows = vec![RawRow::from_pairs([
            ("region", "north"),
            ("team", "a"),
            ("owner", "b"),
            ("notes", "c"),
        ])];
        let result = detect_format(&rows);
        assert_eq!(result.format, CsvFormat::Unknown);
        assert_eq!(result.confidence, 0.0);

        assert_eq!(detect_format(&[]).format, CsvFormat::Unknown);
    }
}
