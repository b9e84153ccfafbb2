//! Sheet locator: find the timetable sheets in a workbook

use crate::error::{ConvertError, ConvertResult};

/// A workbook sheet that matched one of the recognized names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetMatch {
    /// The recognized name, as configured (used for reports and file names).
    pub recognized: String,
    /// The sheet name exactly as it appears in the workbook.
    pub actual: String,
}

/// Compare sheet names ignoring case and all whitespace.
pub fn normalize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Select the workbook sheets matching `recognized`, in `recognized` order.
///
/// Each recognized name matches at most one sheet (the first in workbook
/// order). Fails with `NoMatchingSheet` when nothing matches.
pub fn locate_sheets(sheet_names: &[String], recognized: &[String]) -> ConvertResult<Vec<SheetMatch>> {
    let mut matches: Vec<SheetMatch> = Vec::new();

    for wanted in recognized {
        let key = normalize_sheet_name(wanted);
        if key.is_empty() {
            continue;
        }
        let found = sheet_names
            .iter()
            .find(|name| normalize_sheet_name(name) == key);
        if let Some(actual) = found {
            if matches.iter().all(|m| &m.actual != actual) {
                matches.push(SheetMatch {
                    recognized: wanted.trim().to_string(),
                    actual: actual.clone(),
                });
            }
        }
    }

    if matches.is_empty() {
        return Err(ConvertError::NoMatchingSheet {
            expected: recognized.to_vec(),
            found: sheet_names.to_vec(),
        });
    }
    Ok(matches)
}

/// True if `name` is one of the recognized sheet names.
pub fn is_recognized(name: &str, recognized: &[String]) -> bool {
    let key = normalize_sheet_name(name);
    recognized.iter().any(|r| normalize_sheet_name(r) == key)
}
