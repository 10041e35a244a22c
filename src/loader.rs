use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::data::Dataset;

/// Read a CSV stream with a header row and at least one data row.
pub fn read_csv(reader: impl io::Read) -> Result<Dataset> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.context("reading CSV record")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    if rows.is_empty() {
        bail!("CSV input needs a header row and at least one data row");
    }

    Dataset::from_rows(headers, rows)
}

pub fn read_csv_path(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    read_csv(file).with_context(|| format!("loading '{}'", path.display()))
}

/// Read the first worksheet of an Excel workbook. Cell values are
/// stringified so they run through the same type inference as CSV input.
pub fn read_excel(path: &Path) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening '{}'", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("'{}' contains no worksheets", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading worksheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => bail!("worksheet '{sheet_name}' is empty"),
    };
    let data_rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    if data_rows.is_empty() {
        bail!("worksheet '{sheet_name}' needs a header row and at least one data row");
    }

    Dataset::from_rows(headers, data_rows)
        .with_context(|| format!("loading '{}'", path.display()))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => String::new(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Read a JSON array of objects.
pub fn read_json(reader: impl io::Read) -> Result<Dataset> {
    let value: serde_json::Value = serde_json::from_reader(reader).context("parsing JSON")?;
    Dataset::from_json(&value)
}

pub fn read_json_path(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    read_json(file).with_context(|| format!("loading '{}'", path.display()))
}

/// Load a dataset, picking the reader from the file extension.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => read_csv_path(path),
        Some("xlsx") | Some("xls") => read_excel(path),
        Some("json") => read_json_path(path),
        Some(ext) => bail!("unsupported file extension '{ext}' (expected csv, xlsx, xls, or json)"),
        None => bail!("'{}' has no file extension", path.display()),
    }
}
