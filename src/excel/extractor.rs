//! Row extractor: timetable rows → schedule entries
//!
//! Rows are read lazily and independently. A malformed row yields
//! `Err(MalformedRow)` and the iterator moves on to the next one.

use crate::config::{ColumnLayout, ConverterConfig, FieldColumn};
use crate::excel::cells::{normalize_header, CellParser};
use crate::types::{EntryFields, MalformedRow, ScheduleEntry, SkipReason};
use calamine::{Data, Range};
use chrono::NaiveDate;
use tracing::debug;

/// Column positions relative to the range, after header detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub date: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub subject: Option<usize>,
    pub teachers: Option<usize>,
    pub groups: Option<usize>,
    pub location: Option<usize>,
    pub notes: Option<usize>,
}

/// Lazy iterator over the entries of one sheet.
pub struct RowExtractor<'a> {
    sheet: &'a str,
    range: &'a Range<Data>,
    parser: &'a CellParser,
    columns: ResolvedColumns,
    header_row: Option<usize>,
    date_headers: Vec<String>,
    fill_down_dates: bool,
    last_date: Option<NaiveDate>,
    next_row: usize,
    first_row_number: usize,
}

impl<'a> RowExtractor<'a> {
    pub fn new(
        sheet: &'a str,
        range: &'a Range<Data>,
        config: &ConverterConfig,
        parser: &'a CellParser,
    ) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let header_row = find_header_row(range, &config.columns, config.header_scan_rows);
        let columns = match header_row {
            Some(row) => resolve_from_header(range, row, &config.columns, col_offset),
            None => resolve_positional(&config.columns, col_offset),
        };
        debug!(
            sheet,
            header_row = ?header_row.map(|r| r + row_offset + 1),
            ?columns,
            "resolved timetable columns"
        );

        Self {
            sheet,
            range,
            parser,
            columns,
            header_row,
            date_headers: normalized_aliases(&config.columns.date),
            fill_down_dates: config.fill_down_dates,
            last_date: None,
            next_row: header_row.map_or(0, |r| r + 1),
            first_row_number: row_offset + 1,
        }
    }

    /// Where each field is read from, after header detection.
    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    /// 0-based index (within the used range) of the detected header row.
    pub fn header_row(&self) -> Option<usize> {
        self.header_row
    }

    fn cell(&self, row: usize, col: Option<usize>) -> &'a Data {
        const EMPTY: &Data = &Data::Empty;
        col.and_then(|c| self.range.get((row, c))).unwrap_or(EMPTY)
    }

    fn is_blank(&self, row: usize) -> bool {
        let (_, width) = self.range.get_size();
        (0..width).all(|c| self.parser.text(self.cell(row, Some(c))).is_none())
    }

    /// Header lines repeated further down the sheet (one per week, say).
    fn is_repeated_header(&self, row: usize) -> bool {
        self.header_row.is_some()
            && self
                .parser
                .text(self.cell(row, self.columns.date))
                .map(|t| self.date_headers.contains(&normalize_header(&t)))
                .unwrap_or(false)
    }

    fn read_row(&mut self, row: usize) -> Result<ScheduleEntry, MalformedRow> {
        let row_number = self.first_row_number + row;
        let cols = self.columns.clone();

        let mut date = self.parser.date(self.cell(row, cols.date));
        if self.fill_down_dates {
            match date {
                Some(d) => self.last_date = Some(d),
                None => date = self.last_date,
            }
        }
        let date = date.ok_or_else(|| MalformedRow {
            sheet: self.sheet.to_string(),
            row: row_number,
            reason: SkipReason::MissingDate,
        })?;

        let fields = EntryFields {
            subject: self.parser.text(self.cell(row, cols.subject)).unwrap_or_default(),
            teachers: self.parser.list(self.cell(row, cols.teachers)),
            groups: self.parser.list(self.cell(row, cols.groups)),
            start: self
                .parser
                .time(self.cell(row, cols.start))
                .map(|t| date.and_time(t)),
            end: self
                .parser
                .time(self.cell(row, cols.end))
                .map(|t| date.and_time(t)),
            location: self.parser.text(self.cell(row, cols.location)),
            notes: self.parser.text(self.cell(row, cols.notes)),
        };

        ScheduleEntry::new(self.sheet, row_number, fields)
    }
}

impl Iterator for RowExtractor<'_> {
    type Item = Result<ScheduleEntry, MalformedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let (height, _) = self.range.get_size();
        while self.next_row < height {
            let row = self.next_row;
            self.next_row += 1;

            if self.is_blank(row) || self.is_repeated_header(row) {
                continue;
            }
            return Some(self.read_row(row));
        }
        None
    }
}

fn normalized_aliases(field: &FieldColumn) -> Vec<String> {
    field.headers.iter().map(|h| normalize_header(h)).collect()
}

/// Find the column whose header text matches one of the field's aliases.
fn header_column(row_labels: &[Option<String>], field: &FieldColumn) -> Option<usize> {
    let aliases = normalized_aliases(field);
    row_labels.iter().position(|label| {
        label
            .as_ref()
            .map(|l| aliases.contains(l))
            .unwrap_or(false)
    })
}

fn row_labels(range: &Range<Data>, row: usize) -> Vec<Option<String>> {
    let (_, width) = range.get_size();
    (0..width)
        .map(|c| match range.get((row, c)) {
            Some(Data::String(s)) if !s.trim().is_empty() => Some(normalize_header(s)),
            _ => None,
        })
        .collect()
}

/// A header row names both the date and the subject column.
fn find_header_row(range: &Range<Data>, layout: &ColumnLayout, scan_rows: usize) -> Option<usize> {
    let (height, _) = range.get_size();
    (0..height.min(scan_rows)).find(|&row| {
        let labels = row_labels(range, row);
        header_column(&labels, &layout.date).is_some()
            && header_column(&labels, &layout.subject).is_some()
    })
}

fn resolve_from_header(
    range: &Range<Data>,
    row: usize,
    layout: &ColumnLayout,
    col_offset: usize,
) -> ResolvedColumns {
    let labels = row_labels(range, row);
    let fields = [
        &layout.date,
        &layout.start,
        &layout.end,
        &layout.subject,
        &layout.teachers,
        &layout.groups,
        &layout.location,
        &layout.notes,
    ];

    let mut resolved: Vec<Option<usize>> =
        fields.iter().map(|f| header_column(&labels, f)).collect();

    // Fields the header does not name keep their position, unless another
    // field already claimed that column by name.
    let claimed: Vec<usize> = resolved.iter().flatten().copied().collect();
    for (slot, field) in resolved.iter_mut().zip(fields.iter()) {
        if slot.is_none() {
            *slot = positional(field, col_offset).filter(|c| !claimed.contains(c));
        }
    }

    ResolvedColumns {
        date: resolved[0],
        start: resolved[1],
        end: resolved[2],
        subject: resolved[3],
        teachers: resolved[4],
        groups: resolved[5],
        location: resolved[6],
        notes: resolved[7],
    }
}

fn resolve_positional(layout: &ColumnLayout, col_offset: usize) -> ResolvedColumns {
    ResolvedColumns {
        date: positional(&layout.date, col_offset),
        start: positional(&layout.start, col_offset),
        end: positional(&layout.end, col_offset),
        subject: positional(&layout.subject, col_offset),
        teachers: positional(&layout.teachers, col_offset),
        groups: positional(&layout.groups, col_offset),
        location: positional(&layout.location, col_offset),
        notes: positional(&layout.notes, col_offset),
    }
}

/// Configured sheet column → column within a range starting at `col_offset`.
fn positional(field: &FieldColumn, col_offset: usize) -> Option<usize> {
    field.index.and_then(|i| i.checked_sub(col_offset))
}
