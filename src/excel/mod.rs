//! Spreadsheet side of the conversion
//!
//! - Locate the timetable sheets by name
//! - Extract schedule entries row by row
//! - Write blank timetable templates

mod cells;
mod extractor;
mod locator;
mod template;

pub use cells::{normalize_header, parse_date_str, serial_to_datetime, CellParser};
pub use extractor::{ResolvedColumns, RowExtractor};
pub use locator::{is_recognized, locate_sheets, normalize_sheet_name, SheetMatch};
pub use template::TemplateWriter;
