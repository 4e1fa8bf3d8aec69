use crate::error::{KpiBenchmarkError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];

/// A single cell as produced by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Types a cell the way a spreadsheet would: blank is null, numbers are numbers.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => RawValue::Number(n),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.is_empty(),
            RawValue::Number(_) => false,
        }
    }

    /// String form used for matching metric names. Null renders as "".
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }

    /// Lenient numeric read: thousands separators, a leading `$` and a
    /// trailing `%` are tolerated. Only finite values are returned.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            RawValue::Null => None,
            RawValue::Number(n) => n.is_finite().then_some(*n),
            RawValue::Text(s) => parse_lenient_number(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

pub fn parse_lenient_number(input: &str) -> Option<f64> {
    let mut s = input.trim();
    if s.is_empty() {
        return None;
    }
    let negative = s.starts_with('-');
    if negative {
        s = s[1..].trim_start();
    }
    s = s.strip_prefix('$').unwrap_or(s);
    s = s.strip_suffix('%').unwrap_or(s).trim_end();

    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }

    let value = cleaned.parse::<f64>().ok()?;
    let value = if negative { -value } else { value };
    value.is_finite().then_some(value)
}

/// One CSV data row. Cells keep the header order of the file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    /// Sets a cell. A repeated key keeps its original position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn first_value(&self) -> Option<&RawValue> {
        self.cells.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

/// Parsed upload: normalized headers and the non-blank data rows in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Trim, lowercase, drop anything that is not a word character or whitespace,
/// then turn whitespace runs into `_`.
pub fn normalize_header(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut normalized = String::with_capacity(kept.len());
    let mut in_whitespace = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('_');
            }
            in_whitespace = true;
        } else {
            normalized.push(c);
            in_whitespace = false;
        }
    }
    normalized
}

/// Picks the candidate delimiter that occurs most often on the header line.
pub fn guess_delimiter(text: &str) -> u8 {
    let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

pub fn parse_csv_str(text: &str) -> Result<CsvTable> {
    parse_csv_bytes(text.as_bytes())
}

/// Raw upload bytes. Cells that are not valid UTF-8 fail with a CSV error.
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<CsvTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(KpiBenchmarkError::EmptyFile);
    }

    let delimiter = guess_delimiter(&String::from_utf8_lossy(bytes));
    debug!("Parsing CSV with delimiter {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(KpiBenchmarkError::EmptyFile);
    }

    let mut total_rows = 0usize;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        total_rows += 1;
        let row = build_row(&headers, &record);
        if !row.is_blank() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(KpiBenchmarkError::NoValidRows);
    }

    info!(
        "Ingested {} of {} CSV rows across {} columns",
        rows.len(),
        total_rows,
        headers.len()
    );

    Ok(CsvTable { headers, rows })
}

pub fn parse_csv_file(path: &Path) -> Result<CsvTable> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(KpiBenchmarkError::UnsupportedFile(
            path.display().to_string(),
        ));
    }

    let bytes = std::fs::read(path)?;
    parse_csv_bytes(&bytes)
}

fn build_row(headers: &[String], record: &StringRecord) -> RawRow {
    let mut row = RawRow::new();
    for (idx, header) in headers.iter().enumerate() {
        let value = record
            .get(idx)
            .map(RawValue::from_cell)
            .unwrap_or(RawValue::Null);
        row.insert(header.clone(), value);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Gross Margin "), "gross_margin");
        assert_eq!(normalize_header("CAC ($)"), "cac_");
        assert_eq!(normalize_header("Churn-Rate"), "churnrate");
        assert_eq!(normalize_header("Metric   Name"), "metric_name");
    }

    #[test]
    fn test_guess_delimiter() {
        assert_eq!(guess_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(guess_delimiter("a\tb\n1\t2"), b'\t');
        assert_eq!(guess_delimiter("single"), b',');
    }

    #[test]
    fn test_parse_wide_csv() {
        let table = parse_csv_str("Gross Margin,CAC,Churn Rate\n45.2,150,3.5\n").unwrap();
        assert_eq!(table.headers, vec!["gross_margin", "cac", "churn_rate"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.rows[0].get("gross_margin"),
            Some(&RawValue::Number(45.2))
        );
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let table = parse_csv_str("metric,value\nCAC,150\n,\n\nLTV,900\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[1].get("metric"),
            Some(&RawValue::Text("LTV".to_string()))
        );
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let table = parse_csv_str("a,b,c\n1\n").unwrap();
        assert_eq!(table.rows[0].get("c"), Some(&RawValue::Null));
    }

    #[test]
    fn test_empty_and_headerless_inputs() {
        assert!(matches!(
            parse_csv_str("   \n"),
            Err(KpiBenchmarkError::EmptyFile)
        ));
        assert!(matches!(
            parse_csv_str("metric,value\n,\n"),
            Err(KpiBenchmarkError::NoValidRows)
        ));
    }

    #[test]
    fn test_invalid_utf8_is_csv_error() {
        let err = parse_csv_bytes(b"metric,value\n\xff\xfeCAC,150\n").unwrap_err();
        assert!(matches!(err, KpiBenchmarkError::CsvError(_)));
        assert_eq!(err.stage(), crate::error::ErrorStage::Ingestion);
        assert!(err.to_string().starts_with("CSV parsing failed"));
    }

    #[test]
    fn test_non_csv_extension_rejected() {
        let err = parse_csv_file(Path::new("report.xlsx")).unwrap_err();
        assert!(matches!(err, KpiBenchmarkError::UnsupportedFile(_)));
    }

    #[test]
    fn test_lenient_number_parsing() {
        assert_eq!(parse_lenient_number("1,250"), Some(1250.0));
        assert_eq!(parse_lenient_number("$150"), Some(150.0));
        assert_eq!(parse_lenient_number("-$20"), Some(-20.0));
        assert_eq!(parse_lenient_number("12.5%"), Some(12.5));
        assert_eq!(parse_lenient_number("1e3"), Some(1000.0));
        assert_eq!(parse_lenient_number("n/a"), None);
        assert_eq!(parse_lenient_number("inf"), None);
        assert_eq!(parse_lenient_number("NaN"), None);
        assert_eq!(RawValue::Number(f64::INFINITY).to_number(), None);
    }
}
