//! Converter configuration
//!
//! Sheet names and column positions vary between timetable files, so they
//! are configuration rather than constants. Every field has a default and a
//! YAML file only needs to list what differs.

use crate::error::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Where one logical field lives in a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldColumn {
    /// 0-based column used when no header row is found, or when the header
    /// row does not name this field. `None` means header lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Header texts that identify this column.
    #[serde(default)]
    pub headers: Vec<String>,
}

impl FieldColumn {
    fn new(index: Option<usize>, headers: &[&str]) -> Self {
        Self {
            index,
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// Column layout of a timetable sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: FieldColumn,
    pub start: FieldColumn,
    pub end: FieldColumn,
    pub subject: FieldColumn,
    pub teachers: FieldColumn,
    pub groups: FieldColumn,
    pub location: FieldColumn,
    pub notes: FieldColumn,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: FieldColumn::new(Some(0), &["Date", "Jour", "Start"]),
            start: FieldColumn::new(
                Some(1),
                &["Heure Début", "Début", "Heure de début", "Start_time", "Start time"],
            ),
            end: FieldColumn::new(
                Some(2),
                &["Heure Fin", "Fin", "Heure de fin", "End_time", "End time"],
            ),
            subject: FieldColumn::new(
                Some(3),
                &["Matière", "Titre", "Cours", "Intitulé", "Summary", "Subject"],
            ),
            teachers: FieldColumn::new(
                Some(4),
                &[
                    "Enseignant",
                    "Enseignants",
                    "Enseignant(s)",
                    "Professeur",
                    "Prof",
                    "Teacher",
                    "Teachers",
                ],
            ),
            groups: FieldColumn::new(
                Some(5),
                &["Groupe", "Groupes", "Groupe(s)", "Group", "Groups"],
            ),
            // Optional columns: only read when the header row names them
            location: FieldColumn::new(None, &["Lieu", "Salle", "Location", "Room"]),
            notes: FieldColumn::new(None, &["Description", "Remarque", "Remarques", "Notes"]),
        }
    }
}

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Recognized sheet names, in processing order.
    pub sheets: Vec<String>,
    /// IANA zone the timetable's wall-clock times belong to.
    pub timezone: String,
    /// Written as X-WR-CALNAME.
    pub calendar_name: String,
    /// Write UTC timestamps instead of TZID-qualified local times.
    pub utc: bool,
    /// How many leading rows may hold the header row.
    pub header_scan_rows: usize,
    /// Reuse the previous row's date when the date cell is empty.
    pub fill_down_dates: bool,
    /// Characters separating names in teacher and group cells.
    pub list_separators: String,
    pub columns: ColumnLayout,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            sheets: vec!["EDT P1".to_string(), "EDT P2".to_string()],
            timezone: "Europe/Paris".to_string(),
            calendar_name: "Emploi du temps".to_string(),
            utc: false,
            header_scan_rows: 10,
            fill_down_dates: false,
            list_separators: ",;/&+\n".to_string(),
            columns: ColumnLayout::default(),
        }
    }
}

impl ConverterConfig {
    /// Load a YAML configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ConvertResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ConvertResult<Self> {
        let config: ConverterConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> ConvertResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> ConvertResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the recognized sheet names, e.g. from `--sheet` flags.
    pub fn with_sheets(mut self, sheets: Vec<String>) -> Self {
        if !sheets.is_empty() {
            self.sheets = sheets;
        }
        self
    }

    pub fn validate(&self) -> ConvertResult<()> {
        if self.sheets.iter().all(|s| s.trim().is_empty()) {
            return Err(ConvertError::Config(
                "at least one sheet name is required".to_string(),
            ));
        }
        if self.list_separators.is_empty() {
            return Err(ConvertError::Config(
                "list_separators must not be empty".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed timezone.
    pub fn tz(&self) -> ConvertResult<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(&self.timezone)
            .map_err(|_| ConvertError::Timezone(self.timezone.clone()))
    }
}
