//! Spreadsheet Ingestion
//!
//! Parses uploaded patent fee sheets (CSV/Excel) into validated
//! `PatentRecord`s and generates the downloadable sheet template.
//! Validation happens here, at the boundary; the reminder core assumes
//! well-formed records.

pub mod parser;
pub mod template;

pub use parser::*;
pub use template::*;
