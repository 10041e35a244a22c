use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Distinct values at or below this count (with at least one repeat) make a
/// non-numeric, non-date column categorical.
const MAX_CATEGORICAL_CARDINALITY: usize = 50;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];

/// Semantic type inferred for a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Text,
    Date,
    Categorical,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Categorical => "categorical",
        };
        write!(f, "{}", s)
    }
}

/// One named column. Cells keep their raw text; typed access parses on
/// demand and stays row-aligned (None for empty or unparseable cells).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ctype: ColumnType,
    pub values: Vec<String>,
}

impl Column {
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(|s| parse_numeric(s)).collect()
    }

    pub fn date_values(&self) -> Vec<Option<NaiveDate>> {
        self.values.iter().map(|s| parse_date(s)).collect()
    }

    /// Trimmed cell text, None for empty cells.
    pub fn text_values(&self) -> Vec<Option<&str>> {
        self.values
            .iter()
            .map(|s| {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t)
                }
            })
            .collect()
    }
}

/// An ordered collection of named, typed columns for one loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from a header row and data rows, inferring each
    /// column's type. Rejects duplicate headers and ragged rows.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.to_ascii_lowercase()) {
                return Err(anyhow!("Duplicate column name '{}'", h));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(anyhow!(
                    "Row {} has {} fields, expected {}",
                    i + 1,
                    row.len(),
                    headers.len()
                ));
            }
        }

        let mut columns = Vec::with_capacity(headers.len());
        for (idx, name) in headers.into_iter().enumerate() {
            let values: Vec<String> = rows.iter().map(|r| r[idx].clone()).collect();
            let ctype = infer_column_type(&values);
            columns.push(Column { name, ctype, values });
        }

        Ok(Dataset { columns })
    }

    /// Build a dataset from a JSON array of objects. Columns are taken from
    /// the first object's keys.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::new();
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => "".to_string(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Self::from_rows(headers, rows)
    }

    /// Case-insensitive column lookup (ASCII).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

pub(crate) fn parse_numeric(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Infer a column's semantic type from its non-empty cells.
/// Numeric wins over date, so all-digit columns stay numeric.
fn infer_column_type(values: &[String]) -> ColumnType {
    let non_empty: Vec<&str> = values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if non_empty.is_empty() {
        return ColumnType::Text;
    }

    if non_empty.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ColumnType::Numeric;
    }

    if non_empty.iter().all(|s| parse_date(s).is_some()) {
        return ColumnType::Date;
    }

    let distinct: HashSet<&str> = non_empty.iter().copied().collect();
    if distinct.len() <= MAX_CATEGORICAL_CARDINALITY && distinct.len() < non_empty.len() {
        ColumnType::Categorical
    } else {
        ColumnType::Text
    }
}
