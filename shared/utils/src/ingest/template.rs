//! Sheet Template Generation
//!
//! Produces the downloadable CSV template with sample rows so users can see
//! the expected columns before their first upload.

use chrono::{Days, NaiveDate};

use crate::error::{PatentwatchError, PatentwatchResult};

pub const TEMPLATE_FILENAME: &str = "patent_fee_template.csv";

/// Build the sample template relative to `today`: one upcoming record, one
/// comfortably in the future, and one already expired.
pub fn generate_csv_template(today: NaiveDate) -> PatentwatchResult<Vec<u8>> {
    let rows = [
        ("Invention Patent A", "ZL202010000000", today.checked_add_days(Days::new(15)), "1300"),
        ("Utility Model B", "ZL202020000000", today.checked_add_days(Days::new(45)), "900"),
        ("Design Patent C", "ZL202030000000", today.checked_sub_days(Days::new(5)), "500"),
    ];

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["patent_name", "patent_number", "due_date", "fee_amount"])
        .map_err(|e| PatentwatchError::internal(format!("Failed to write template header: {}", e)))?;

    for (name, number, due, amount) in rows {
        let due = due.ok_or_else(|| PatentwatchError::internal("Template date out of range"))?;
        writer
            .write_record([name, number, &due.format("%Y-%m-%d").to_string(), amount])
            .map_err(|e| PatentwatchError::internal(format!("Failed to write template row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| PatentwatchError::internal(format!("Failed to finish template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SheetParser;

    #[test]
    fn test_template_parses_back() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let bytes = generate_csv_template(today).unwrap();

        let parser = SheetParser::new();
        let sheet = parser.parse_bytes(TEMPLATE_FILENAME, &bytes, None).unwrap();

        assert_eq!(sheet.records.len(), 3);
        assert_eq!(sheet.records[0].due_date, today.checked_add_days(Days::new(15)).unwrap());
        assert_eq!(sheet.records[2].due_date, today.checked_sub_days(Days::new(5)).unwrap());
    }
}
