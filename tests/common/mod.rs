//! Workbook fixtures shared by the integration tests.

#![allow(dead_code)]

use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

/// One cell of a fixture sheet.
pub enum Cell {
    Text(String),
    /// Date serial shown with a date format, so it reads back as a date.
    Date(f64),
    /// Day fraction shown with a time format.
    Time(f64),
    Number(f64),
    Empty,
}

pub fn t(text: &str) -> Cell {
    Cell::Text(text.to_string())
}

/// Excel serial of 2024-09-02.
pub const SEPT_2_2024: f64 = 45537.0;

pub fn hours(h: u32, m: u32) -> Cell {
    Cell::Time((h as f64 * 60.0 + m as f64) / 1440.0)
}

pub fn header() -> Vec<Cell> {
    ["Date", "Heure Début", "Heure Fin", "Matière", "Enseignant", "Groupe"]
        .iter()
        .map(|h| t(h))
        .collect()
}

/// A text-only timetable row.
pub fn row(date: &str, start: &str, end: &str, subject: &str, teachers: &str, groups: &str) -> Vec<Cell> {
    [date, start, end, subject, teachers, groups]
        .iter()
        .map(|v| if v.is_empty() { Cell::Empty } else { t(v) })
        .collect()
}

pub type Sheet<'a> = (&'a str, Vec<Vec<Cell>>);

/// Build an .xlsx workbook in memory.
pub fn workbook_bytes(sheets: Vec<Sheet<'_>>) -> Vec<u8> {
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let time_format = Format::new().set_num_format("hh:mm");

    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).unwrap();
        for (r, cells) in rows.into_iter().enumerate() {
            for (c, cell) in cells.into_iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s).unwrap();
                    }
                    Cell::Date(v) => {
                        worksheet.write_number_with_format(r, c, v, &date_format).unwrap();
                    }
                    Cell::Time(v) => {
                        worksheet.write_number_with_format(r, c, v, &time_format).unwrap();
                    }
                    Cell::Number(v) => {
                        worksheet.write_number(r, c, v).unwrap();
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Write an .xlsx workbook to `dir/name`.
pub fn write_workbook(dir: &Path, name: &str, sheets: Vec<Sheet<'_>>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, workbook_bytes(sheets)).unwrap();
    path
}

/// The single-course timetable: Algèbre on 2024-09-02, 08:00-10:00.
pub fn algebre_sheet() -> Vec<Vec<Cell>> {
    vec![
        header(),
        row("02/09/2024", "08:00", "10:00", "Algèbre", "Dupont", "G1"),
    ]
}
