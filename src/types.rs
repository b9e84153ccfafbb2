use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

//==============================================================================
// Schedule Entry
//==============================================================================

/// One class session read from a timetable row.
///
/// Built only through [`ScheduleEntry::new`], which enforces a non-empty
/// subject and `start < end`. Fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    subject: String,
    teachers: Vec<String>,
    groups: Vec<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    location: Option<String>,
    notes: Option<String>,
    description: String,
    sheet: String,
    row: usize,
}

/// Raw values of a row, before validation.
#[derive(Debug, Clone, Default)]
pub struct EntryFields {
    pub subject: String,
    pub teachers: Vec<String>,
    pub groups: Vec<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl ScheduleEntry {
    /// Validate row values and build the entry.
    ///
    /// `row` is the 1-based spreadsheet row number, kept for reporting and
    /// for deriving stable event identifiers.
    pub fn new(sheet: &str, row: usize, fields: EntryFields) -> Result<Self, MalformedRow> {
        let malformed = |reason| MalformedRow {
            sheet: sheet.to_string(),
            row,
            reason,
        };

        let subject = fields.subject.trim().to_string();
        let start = fields.start.ok_or_else(|| malformed(SkipReason::MissingStart))?;
        let end = fields.end.ok_or_else(|| malformed(SkipReason::MissingEnd))?;
        if subject.is_empty() {
            return Err(malformed(SkipReason::EmptySubject));
        }
        if end <= start {
            return Err(malformed(SkipReason::EndNotAfterStart));
        }

        let location = fields.location.filter(|l| !l.trim().is_empty());
        let notes = fields.notes.filter(|n| !n.trim().is_empty());
        let description = compose_description(&subject, &fields.teachers, &fields.groups, notes.as_deref());

        Ok(Self {
            subject,
            teachers: fields.teachers,
            groups: fields.groups,
            start,
            end,
            location,
            notes,
            description,
            sheet: sheet.to_string(),
            row,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn teachers(&self) -> &[String] {
        &self.teachers
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Event body: subject, teachers, groups and notes, one per line.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn row(&self) -> usize {
        self.row
    }
}

fn compose_description(
    subject: &str,
    teachers: &[String],
    groups: &[String],
    notes: Option<&str>,
) -> String {
    let mut lines = vec![subject.to_string()];
    if !teachers.is_empty() {
        lines.push(format!("Enseignant(s) : {}", teachers.join(", ")));
    }
    if !groups.is_empty() {
        lines.push(format!("Groupe(s) : {}", groups.join(", ")));
    }
    if let Some(notes) = notes {
        lines.push(notes.trim().to_string());
    }
    lines.join("\n")
}

//==============================================================================
// Skipped rows
//==============================================================================

/// Why a row did not produce an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingDate,
    MissingStart,
    MissingEnd,
    EmptySubject,
    EndNotAfterStart,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingDate => "missing or unreadable date",
            SkipReason::MissingStart => "missing or unreadable start time",
            SkipReason::MissingEnd => "missing or unreadable end time",
            SkipReason::EmptySubject => "empty subject",
            SkipReason::EndNotAfterStart => "end time is not after start time",
        };
        f.write_str(text)
    }
}

/// A row that was skipped instead of converted. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    pub sheet: String,
    pub row: usize,
    pub reason: SkipReason,
}

impl fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}: {}", self.sheet, self.row, self.reason)
    }
}

//==============================================================================
// Reports
//==============================================================================

/// Outcome of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub events: usize,
    pub skipped: Vec<MalformedRow>,
}

/// Outcome of one conversion, suitable for showing to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Every sheet name present in the workbook, in workbook order.
    pub sheets_found: Vec<String>,
    /// Sheets that were converted, in processing order.
    pub sheets: Vec<SheetReport>,
}

impl ConversionReport {
    pub fn total_events(&self) -> usize {
        self.sheets.iter().map(|s| s.events).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.sheets.iter().map(|s| s.skipped.len()).sum()
    }
}
