//! edt-ics - timetable spreadsheets to iCalendar
//!
//! Reads the "EDT P1" / "EDT P2" sheets of a class schedule workbook and
//! writes one calendar event per timetable row.
//!
//! # Features
//!
//! - xlsx, xlsm, xls, xlsb and ods input
//! - Header detection with configurable column positions as fallback
//! - Malformed rows are skipped and reported, never fatal
//! - Stable event UIDs: re-importing updates instead of duplicating
//! - CLI and HTTP upload server
//!
//! # Example
//!
//! ```no_run
//! use edt_ics::{Converter, ConverterConfig};
//! use std::path::Path;
//!
//! let converter = Converter::new(ConverterConfig::default())?;
//! let conversion = converter.convert_file(Path::new("edt.xlsx"))?;
//!
//! println!("Events: {}", conversion.report.total_events());
//! println!("Skipped rows: {}", conversion.report.total_skipped());
//! std::fs::write("edt.ics", &conversion.calendar)?;
//! # Ok::<(), edt_ics::error::ConvertError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod excel;
pub mod ics;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::ConverterConfig;
pub use converter::{Conversion, Converter};
pub use error::{ConvertError, ConvertResult};
pub use types::{ConversionReport, MalformedRow, ScheduleEntry, SkipReason};
