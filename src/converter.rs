//! Conversion pipeline
//!
//! load workbook → locate sheets → extract rows → serialize events.
//! One call owns its input buffer and returns the finished document.

use crate::config::ConverterConfig;
use crate::error::ConvertResult;
use crate::excel::{locate_sheets, CellParser, RowExtractor};
use crate::ics::EventSerializer;
use crate::types::{ConversionReport, ScheduleEntry, SheetReport};
use calamine::{open_workbook_auto_from_rs, Reader};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Entries read from one sheet.
#[derive(Debug, Clone)]
pub struct SheetEntries {
    pub name: String,
    pub entries: Vec<ScheduleEntry>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The complete iCalendar document.
    pub calendar: String,
    pub report: ConversionReport,
    pub sheets: Vec<SheetEntries>,
    /// DTSTAMP written on every event.
    pub stamp: DateTime<Utc>,
}

impl Conversion {
    /// All entries, sheet by sheet then row by row.
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.sheets.iter().flat_map(|s| s.entries.iter())
    }
}

/// Converts timetable workbooks into calendars.
pub struct Converter {
    config: ConverterConfig,
    parser: CellParser,
    stamp: Option<DateTime<Utc>>,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> ConvertResult<Self> {
        config.validate()?;
        let parser = CellParser::new(&config.list_separators)?;
        Ok(Self {
            config,
            parser,
            stamp: None,
        })
    }

    /// Fix the DTSTAMP instead of using the conversion time.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = Some(stamp);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Read a workbook from disk and convert it.
    pub fn convert_file(&self, path: &Path) -> ConvertResult<Conversion> {
        let bytes = fs::read(path)?;
        self.convert_bytes(bytes)
    }

    /// Convert an in-memory workbook (xlsx, xlsm, xls, xlsb or ods).
    pub fn convert_bytes(&self, bytes: Vec<u8>) -> ConvertResult<Conversion> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let sheet_names = workbook.sheet_names();
        let matched = locate_sheets(&sheet_names, &self.config.sheets)?;

        let mut report = ConversionReport {
            sheets_found: sheet_names,
            sheets: Vec::with_capacity(matched.len()),
        };
        let mut sheets = Vec::with_capacity(matched.len());

        for sheet in matched {
            let range = workbook.worksheet_range(&sheet.actual)?;
            let mut entries = Vec::new();
            let mut skipped = Vec::new();

            for outcome in RowExtractor::new(&sheet.recognized, &range, &self.config, &self.parser) {
                match outcome {
                    Ok(entry) => entries.push(entry),
                    Err(row) => {
                        debug!(%row, "skipping row");
                        skipped.push(row);
                    }
                }
            }

            debug!(
                sheet = %sheet.actual,
                events = entries.len(),
                skipped = skipped.len(),
                "sheet converted"
            );
            report.sheets.push(SheetReport {
                name: sheet.recognized.clone(),
                events: entries.len(),
                skipped,
            });
            sheets.push(SheetEntries {
                name: sheet.recognized,
                entries,
            });
        }

        let stamp = self.stamp.unwrap_or_else(Utc::now);
        let serializer = EventSerializer::new(&self.config)?.with_stamp(stamp);
        let calendar = serializer.serialize(sheets.iter().flat_map(|s| s.entries.iter()));

        info!(
            events = report.total_events(),
            skipped = report.total_skipped(),
            sheets = report.sheets.len(),
            "conversion complete"
        );

        Ok(Conversion {
            calendar,
            report,
            sheets,
            stamp,
        })
    }

    /// One calendar per converted sheet, as `(sheet name, document)`.
    pub fn split(&self, conversion: &Conversion) -> ConvertResult<Vec<(String, String)>> {
        conversion
            .sheets
            .iter()
            .map(|sheet| {
                let serializer = EventSerializer::new(&self.config)?
                    .with_stamp(conversion.stamp)
                    .with_calendar_name(format!("{} ({})", self.config.calendar_name, sheet.name));
                Ok((sheet.name.clone(), serializer.serialize(&sheet.entries)))
            })
            .collect()
    }
}

/// Sheet names of a workbook, in workbook order.
pub fn list_sheets(bytes: Vec<u8>) -> ConvertResult<Vec<String>> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    Ok(workbook.sheet_names())
}

/// File name for a per-sheet calendar: "EDT P1" → "EDT P1.ics".
pub fn sheet_file_name(sheet: &str) -> String {
    let cleaned: String = sheet
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();
    format!("{}.ics", cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    #[test]
    fn test_sheet_file_name() {
        assert_eq!(sheet_file_name("EDT P1"), "EDT P1.ics");
        assert_eq!(sheet_file_name(" S1/S2 "), "S1_S2.ics");
    }

    #[test]
    fn test_garbage_bytes_are_a_workbook_error() {
        let converter = Converter::new(ConverterConfig::default()).unwrap();
        let err = converter
            .convert_bytes(b"definitely not a spreadsheet".to_vec())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Workbook(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let converter = Converter::new(ConverterConfig::default()).unwrap();
        let err = converter
            .convert_file(Path::new("/nonexistent/edt.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ConverterConfig {
            timezone: "Nowhere/Special".to_string(),
            ..Default::default()
        };
        assert!(Converter::new(config).is_err());
    }
}
