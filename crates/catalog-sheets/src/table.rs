use std::collections::HashMap;
use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::SheetError;

// XLSX files are zip archives.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SheetFormat {
    /// Sniffs the format from the leading bytes of an upload.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            Self::Xlsx
        } else {
            Self::Csv
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for SheetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown sheet format '{other}' (expected xlsx or csv)")),
        }
    }
}

/// A header row plus data rows, every cell already rendered as text.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Reads `bytes` as XLSX or CSV. For workbooks, `sheet` is matched
    /// case-insensitively and the first sheet is used when it is absent.
    pub(crate) fn read(bytes: &[u8], sheet: &str) -> Result<Self, SheetError> {
        let mut raw = match SheetFormat::detect(bytes) {
            SheetFormat::Xlsx => read_xlsx(bytes, sheet)?,
            SheetFormat::Csv => read_csv(bytes)?,
        }
        .into_iter();

        let headers = raw.next().unwrap_or_default();
        let mut columns = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let key = header_key(header);
            if !key.is_empty() {
                columns.entry(key).or_insert(idx);
            }
        }
        Ok(Self {
            columns,
            rows: raw.collect(),
        })
    }

    /// Fails with every missing column name when any of `required` is absent.
    pub(crate) fn require(&self, required: &[&str]) -> Result<(), SheetError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.columns.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SheetError::MissingColumns(missing))
        }
    }

    /// Data rows with their 1-based numbers, skipping rows with no content.
    pub(crate) fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
            .map(|(idx, cells)| Row {
                number: idx + 1,
                cells,
                columns: &self.columns,
            })
    }
}

pub(crate) struct Row<'a> {
    pub(crate) number: usize,
    cells: &'a [String],
    columns: &'a HashMap<String, usize>,
}

impl Row<'_> {
    /// Trimmed cell under `column`; `None` when the column or the value is missing.
    pub(crate) fn get(&self, column: &str) -> Option<&str> {
        let idx = *self.columns.get(column)?;
        let value = self.cells.get(idx)?.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Lowercased header with a required-marker `*` and surrounding space removed.
fn header_key(header: &str) -> String {
    header
        .trim()
        .trim_end_matches('*')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

fn read_xlsx(bytes: &[u8], sheet: &str) -> Result<Vec<Vec<String>>, SheetError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let names = workbook.sheet_names();
    let name = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(sheet))
        .or_else(|| names.first())
        .cloned()
        .ok_or(SheetError::MissingSheet)?;

    let range = workbook.worksheet_range(&name)?;
    // Ranges start at the first used cell; pad so column indexes line up.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let lead = usize::try_from(first_col).unwrap_or(0);
    let mut out: Vec<Vec<String>> = (0..first_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells = vec![String::new(); lead];
        cells.extend(row.iter().map(cell_text));
        out.push(cells);
    }
    Ok(out)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, SheetError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut out = Vec::new();
    for record in reader.records() {
        out.push(record?.iter().map(ToOwned::to_owned).collect());
    }
    Ok(out)
}

#[allow(clippy::cast_possible_truncation)]
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers come back as floats; keep "12" rather than "12.0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// One output cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    pub(crate) fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub(crate) fn opt(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, Self::text)
    }

    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// Writes `headers` and `rows` as a single-sheet workbook or a CSV file.
pub(crate) fn write_table(
    format: SheetFormat,
    sheet: &str,
    headers: &[String],
    rows: &[Vec<Cell>],
) -> Result<Vec<u8>, SheetError> {
    match format {
        SheetFormat::Xlsx => write_xlsx(sheet, headers, rows),
        SheetFormat::Csv => write_csv(headers, rows),
    }
}

fn write_xlsx(sheet: &str, headers: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>, SheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    let bold = Format::new().set_bold();
    for (col, header) in (0u16..).zip(headers) {
        worksheet.write_string_with_format(0, col, header, &bold)?;
        let width = header.chars().count().clamp(10, 40);
        worksheet.set_column_width(col, u32::try_from(width).unwrap_or(10) + 2)?;
    }

    for (row_idx, cells) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(cells) {
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row_idx, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_idx, col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_idx, col, *b)?;
                }
                Cell::Empty => {}
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(workbook.save_to_buffer()?)
}

fn write_csv(headers: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for cells in rows {
        writer.write_record(cells.iter().map(Cell::render))?;
    }
    writer
        .into_inner()
        .map_err(|e| SheetError::CsvWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn detects_xlsx_by_zip_magic() {
        assert_eq!(SheetFormat::detect(b"PK\x03\x04rest"), SheetFormat::Xlsx);
        assert_eq!(SheetFormat::detect(b"sku,price\n"), SheetFormat::Csv);
    }

    #[test]
    fn header_keys_ignore_case_and_required_marker() {
        assert_eq!(header_key(" SKU* "), "sku");
        assert_eq!(header_key("Old Price"), "old_price");
        assert_eq!(header_key("level0 *"), "level0");
    }

    #[test]
    fn csv_rows_are_numbered_from_first_data_row() {
        let table = Table::read(b"sku,price\nA,1\n,\nB,2\n", "Prices").unwrap();
        let numbers: Vec<usize> = table.rows().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        let first = table.rows().next().unwrap();
        assert_eq!(first.get("sku"), Some("A"));
        assert_eq!(first.get("missing"), None);
    }

    #[test]
    fn csv_with_bom_is_read() {
        let table = Table::read(b"\xEF\xBB\xBFSKU*,Price*\nA,1\n", "Prices").unwrap();
        table.require(&["sku", "price"]).unwrap();
    }

    #[test]
    fn require_lists_every_missing_column() {
        let table = Table::read(b"sku\nA\n", "Prices").unwrap();
        let err = table.require(&["sku", "price", "currency"]).unwrap_err();
        match err {
            SheetError::MissingColumns(cols) => assert_eq!(cols, vec!["price", "currency"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn xlsx_round_trips_through_table() {
        let bytes = write_table(
            SheetFormat::Xlsx,
            "Prices",
            &headers(&["SKU*", "Price*"]),
            &[vec![Cell::text("A"), Cell::Number(12.0)]],
        )
        .unwrap();
        let table = Table::read(&bytes, "prices").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.number, 1);
        assert_eq!(row.get("sku"), Some("A"));
        assert_eq!(row.get("price"), Some("12"));
    }

    #[test]
    fn csv_writer_quotes_values() {
        let bytes = write_table(
            SheetFormat::Csv,
            "Products",
            &headers(&["sku", "name"]),
            &[vec![Cell::text("A"), Cell::text("Case, clear")]],
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "sku,name\nA,\"Case, clear\"\n");
    }
}
