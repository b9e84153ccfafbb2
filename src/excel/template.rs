//! Blank timetable workbook
//!
//! Writes one worksheet per recognized sheet name with the header row the
//! extractor looks for, so new timetables start in a readable layout.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, ConvertResult};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// Template writer for new timetable files.
pub struct TemplateWriter<'a> {
    config: &'a ConverterConfig,
}

impl<'a> TemplateWriter<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Header labels in positional order: the first alias of each field.
    pub fn headers(&self) -> Vec<String> {
        let columns = &self.config.columns;
        let mut fields = vec![
            &columns.date,
            &columns.start,
            &columns.end,
            &columns.subject,
            &columns.teachers,
            &columns.groups,
            &columns.location,
            &columns.notes,
        ];
        // Positioned fields first, in column order; header-only fields after
        fields.sort_by_key(|f| f.index.unwrap_or(usize::MAX));
        fields
            .into_iter()
            .filter_map(|f| f.headers.first().cloned())
            .collect()
    }

    /// Build the workbook and save it to `output_path`.
    pub fn write(&self, output_path: &Path) -> ConvertResult<()> {
        let mut workbook = Workbook::new();
        let headers = self.headers();

        for sheet_name in &self.config.sheets {
            let worksheet = workbook.add_worksheet();
            self.write_sheet(worksheet, sheet_name.trim(), &headers)?;
        }

        workbook
            .save(output_path)
            .map_err(|e| ConvertError::Template(format!("Failed to save template: {}", e)))?;
        Ok(())
    }

    fn write_sheet(&self, worksheet: &mut Worksheet, name: &str, headers: &[String]) -> ConvertResult<()> {
        worksheet
            .set_name(name)
            .map_err(|e| ConvertError::Template(format!("Invalid sheet name '{}': {}", name, e)))?;

        let bold = Format::new().set_bold();
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, header, &bold)
                .map_err(|e| ConvertError::Template(format!("Failed to write header: {}", e)))?;
            worksheet
                .set_column_width(col as u16, 18)
                .map_err(|e| ConvertError::Template(format!("Failed to size column: {}", e)))?;
        }
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| ConvertError::Template(format!("Failed to freeze header: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    #[test]
    fn test_headers_follow_positions() {
        let config = ConverterConfig::default();
        let headers = TemplateWriter::new(&config).headers();
        assert_eq!(
            headers,
            vec![
                "Date",
                "Heure Début",
                "Heure Fin",
                "Matière",
                "Enseignant",
                "Groupe",
                "Lieu",
                "Description"
            ]
        );
    }

    #[test]
    fn test_template_has_recognized_sheets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("template.xlsx");

        let config = ConverterConfig::default();
        TemplateWriter::new(&config).write(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["EDT P1", "EDT P2"]);

        let range = workbook.worksheet_range("EDT P1").unwrap();
        assert_eq!(range.get((0, 0)), Some(&Data::String("Date".to_string())));
        assert_eq!(range.get((0, 3)), Some(&Data::String("Matière".to_string())));
    }

    #[test]
    fn test_template_rejects_invalid_sheet_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.xlsx");

        let config = ConverterConfig {
            sheets: vec!["EDT [P1]".to_string()],
            ..Default::default()
        };
        let err = TemplateWriter::new(&config).write(&path).unwrap_err();
        assert!(matches!(err, ConvertError::Template(_)));
    }
}
