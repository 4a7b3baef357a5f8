//! Patent Sheet Parser
//!
//! Multi-format parser for patent fee sheets in CSV and Excel formats.
//! Column headers are matched against alias lists covering both English
//! and the Chinese headers used by the original sheet layout.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use patentwatch_models::PatentRecord;

use crate::error::{PatentwatchError, PatentwatchResult};

/// Supported sheet file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel, // XLSX/XLS
}

impl SheetFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Detect format from content type header
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Excel),
            "application/vnd.ms-excel" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Parsed sheet with per-row diagnostics
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub records: Vec<PatentRecord>,
    pub total_rows: usize,
    pub warnings: Vec<String>,
}

/// Parser for patent fee sheets
pub struct SheetParser {
    name_columns: Vec<String>,
    number_columns: Vec<String>,
    due_date_columns: Vec<String>,
    amount_columns: Vec<String>,
}

impl Default for SheetParser {
    fn default() -> Self {
        Self {
            name_columns: vec![
                "patent_name".to_string(),
                "patent name".to_string(),
                "name".to_string(),
                "专利名称".to_string(),
            ],
            number_columns: vec![
                "patent_number".to_string(),
                "patent number".to_string(),
                "number".to_string(),
                "专利号".to_string(),
            ],
            due_date_columns: vec![
                "due_date".to_string(),
                "due date".to_string(),
                "deadline".to_string(),
                "缴费截止日期".to_string(),
            ],
            amount_columns: vec![
                "fee_amount".to_string(),
                "fee amount".to_string(),
                "amount".to_string(),
                "缴费金额".to_string(),
            ],
        }
    }
}

impl SheetParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse sheet from bytes, detecting format from filename if not given
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<SheetFormat>,
    ) -> PatentwatchResult<ParsedSheet> {
        let format = format
            .or_else(|| SheetFormat::from_extension(Path::new(filename)))
            .ok_or_else(|| PatentwatchError::ingestion("Could not determine file format"))?;

        match format {
            SheetFormat::Csv => self.parse_csv(data),
            SheetFormat::Excel => self.parse_excel(data),
        }
    }

    fn parse_csv(&self, data: &[u8]) -> PatentwatchResult<ParsedSheet> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| PatentwatchError::ingestion(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_lowercase().trim().to_string())
            .collect();

        self.check_required_columns(&headers)?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut total_rows = 0;

        for (idx, result) in reader.records().enumerate() {
            total_rows += 1;
            match result {
                Ok(record) => {
                    let raw: HashMap<String, String> = headers
                        .iter()
                        .enumerate()
                        .filter_map(|(i, h)| record.get(i).map(|v| (h.clone(), v.to_string())))
                        .collect();

                    records.push(self.map_row(idx + 2, &raw)?);
                }
                Err(e) => {
                    warnings.push(format!("Row {}: parse error - {}", idx + 2, e));
                }
            }
        }

        Ok(ParsedSheet {
            records,
            total_rows,
            warnings,
        })
    }

    fn parse_excel(&self, data: &[u8]) -> PatentwatchResult<ParsedSheet> {
        use calamine::{open_workbook_auto_from_rs, DataType, Reader};

        // Sniffs the container, so ZIP-based XLSX and legacy binary XLS
        // uploads both open here
        let cursor = std::io::Cursor::new(data);
        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| PatentwatchError::ingestion(format!("Failed to open workbook: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PatentwatchError::ingestion("No sheets found in workbook"))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .ok_or_else(|| PatentwatchError::ingestion("Failed to read worksheet"))?
            .map_err(|e| PatentwatchError::ingestion(format!("Failed to read worksheet: {}", e)))?;

        let mut rows_iter = range.rows();

        // First row is headers
        let headers: Vec<String> = rows_iter
            .next()
            .ok_or_else(|| PatentwatchError::ingestion("Empty worksheet"))?
            .iter()
            .map(|cell: &DataType| cell.to_string().to_lowercase().trim().to_string())
            .collect();

        self.check_required_columns(&headers)?;

        let mut records = Vec::new();
        let mut total_rows = 0;

        for (idx, row) in rows_iter.enumerate() {
            total_rows += 1;
            let raw: HashMap<String, String> = headers
                .iter()
                .enumerate()
                .filter_map(|(i, h): (usize, &String)| {
                    row.get(i).map(|v: &DataType| (h.clone(), v.to_string()))
                })
                .collect();

            records.push(self.map_row(idx + 2, &raw)?);
        }

        Ok(ParsedSheet {
            records,
            total_rows,
            warnings: Vec::new(),
        })
    }

    /// Reject uploads missing any of the four required columns, naming them
    /// the way the original template does.
    fn check_required_columns(&self, headers: &[String]) -> PatentwatchResult<()> {
        let groups: [(&str, &[String]); 4] = [
            ("patent_name", &self.name_columns),
            ("patent_number", &self.number_columns),
            ("due_date", &self.due_date_columns),
            ("fee_amount", &self.amount_columns),
        ];

        let missing: Vec<&str> = groups
            .iter()
            .filter(|(_, candidates)| !candidates.iter().any(|c| headers.contains(c)))
            .map(|(label, _)| *label)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PatentwatchError::ingestion(format!(
                "Sheet is missing required columns: {}",
                missing.join(", ")
            )))
        }
    }

    fn map_row(&self, row_number: usize, raw: &HashMap<String, String>) -> PatentwatchResult<PatentRecord> {
        let name = self
            .find_value(&self.name_columns, raw)
            .ok_or_else(|| row_error(row_number, "patent_name", "value is missing"))?;
        let number = self
            .find_value(&self.number_columns, raw)
            .ok_or_else(|| row_error(row_number, "patent_number", "value is missing"))?;
        let due_raw = self
            .find_value(&self.due_date_columns, raw)
            .ok_or_else(|| row_error(row_number, "due_date", "value is missing"))?;
        let amount_raw = self
            .find_value(&self.amount_columns, raw)
            .ok_or_else(|| row_error(row_number, "fee_amount", "value is missing"))?;

        let due_date = parse_due_date(&due_raw)
            .ok_or_else(|| row_error(row_number, "due_date", format!("unparseable date '{}'", due_raw)))?;
        let fee_amount = parse_amount(&amount_raw)
            .ok_or_else(|| row_error(row_number, "fee_amount", format!("unparseable amount '{}'", amount_raw)))?;

        Ok(PatentRecord {
            number,
            name,
            due_date,
            fee_amount,
        })
    }

    /// Find value by checking multiple possible column names
    fn find_value(&self, candidates: &[String], data: &HashMap<String, String>) -> Option<String> {
        for candidate in candidates {
            if let Some(value) = data.get(candidate) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

fn row_error(row: usize, field: &str, message: impl Into<String>) -> PatentwatchError {
    PatentwatchError::validation(field, format!("row {}: {}", row, message.into()))
}

/// Parse a due date from common string layouts or an Excel day serial.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for layout in ["%Y-%m-%d", "%Y/%m/%d", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, layout) {
            return Some(date);
        }
        // Datetime layouts need the full parse then date truncation
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(value, layout) {
            return Some(datetime.date());
        }
    }

    // Excel stores dates as day counts from 1899-12-30
    if !value.contains(['-', '/']) {
        if let Ok(serial) = value.parse::<f64>() {
            if (1.0..=200_000.0).contains(&serial) {
                let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
                return epoch.checked_add_days(chrono::Days::new(serial as u64));
            }
        }
    }

    None
}

/// Parse a fee amount from a numeric or string cell.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    value.trim().parse::<Decimal>().ok()
}
