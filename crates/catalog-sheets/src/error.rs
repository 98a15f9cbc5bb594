use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook has no worksheets")]
    MissingSheet,

    /// Required headers absent from the first row. The whole file is rejected.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to write csv: {0}")]
    CsvWrite(String),
}
