//! Cell interpretation: dates, times, text and name lists
//!
//! Timetables mix typed Excel dates, raw serial numbers and free text
//! ("lundi 02/09/2024", "8h30"), so every reader accepts several shapes and
//! returns `None` rather than failing.

use crate::error::{ConvertError, ConvertResult};
use calamine::{Data, ExcelDateTime};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// First serial past 9999-12-31, the last day Excel can represent.
const SERIAL_LIMIT: f64 = 2_958_466.0;

/// Reads typed values out of calamine cells.
pub struct CellParser {
    time_pattern: Regex,
    duration_pattern: Regex,
    separators: Vec<char>,
}

impl CellParser {
    /// Create a parser splitting lists on any of `separators`.
    pub fn new(separators: &str) -> ConvertResult<Self> {
        // 08:00, 8:00:00, 8h, 8h30, 08 H 30
        let time_pattern = Regex::new(r"^(\d{1,2})\s*(?:[:hH]\s*(\d{1,2})?(?:\s*:\s*(\d{1,2}))?)?$")
            .map_err(|e| ConvertError::Config(format!("Regex error: {}", e)))?;
        // ISO 8601 durations written by OpenDocument sheets: PT8H30M0S
        let duration_pattern =
            Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?$")
                .map_err(|e| ConvertError::Config(format!("Regex error: {}", e)))?;

        Ok(Self {
            time_pattern,
            duration_pattern,
            separators: separators.chars().collect(),
        })
    }

    /// Trimmed text of a cell, `None` when blank or an error value.
    pub fn text(&self, cell: &Data) -> Option<String> {
        let text = match cell {
            Data::Empty | Data::Error(_) => return None,
            Data::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Split a teacher or group cell into names, dropping empty parts.
    pub fn list(&self, cell: &Data) -> Vec<String> {
        match self.text(cell) {
            Some(text) => text
                .split(|c: char| self.separators.contains(&c))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Calendar date held by a cell.
    pub fn date(&self, cell: &Data) -> Option<NaiveDate> {
        match cell {
            Data::DateTime(dt) => {
                if dt.is_duration() || !(1.0..SERIAL_LIMIT).contains(&dt.as_f64()) {
                    return None;
                }
                dt.as_datetime().map(|d| d.date())
            }
            Data::Float(f) => serial_to_datetime(*f).map(|d| d.date()),
            Data::Int(i) => serial_to_datetime(*i as f64).map(|d| d.date()),
            Data::String(s) | Data::DateTimeIso(s) => parse_date_str(s),
            _ => None,
        }
    }

    /// Wall-clock time held by a cell.
    pub fn time(&self, cell: &Data) -> Option<NaiveTime> {
        match cell {
            Data::DateTime(dt) => excel_datetime_time(dt),
            Data::Float(f) => numeric_time(*f),
            Data::Int(i) => numeric_time(*i as f64),
            Data::String(s) => self.parse_time_str(s),
            Data::DateTimeIso(s) => parse_iso_time(s),
            Data::DurationIso(s) => self.parse_duration_str(s),
            _ => None,
        }
    }

    fn parse_time_str(&self, s: &str) -> Option<NaiveTime> {
        let s = s.trim();
        if let Some(caps) = self.time_pattern.captures(s) {
            let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
            let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
            let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
            return NaiveTime::from_hms_opt(hour, minute, second);
        }
        if let Some(time) = self.parse_duration_str(s) {
            return Some(time);
        }
        parse_iso_time(s)
    }

    fn parse_duration_str(&self, s: &str) -> Option<NaiveTime> {
        let caps = self.duration_pattern.captures(s.trim())?;
        let part = |i: usize, unit: u32| -> Option<u32> {
            caps.get(i)
                .map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?
                .checked_mul(unit)
        };
        let seconds = part(1, 3600)?
            .checked_add(part(2, 60)?)?
            .checked_add(part(3, 1)?)?;
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
    }
}

/// Convert an Excel serial (1900 date system) to a date-time.
///
/// Serials below 1 are pure times and have no date. Serials past
/// 9999-12-31 are not dates Excel can hold.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(1.0..SERIAL_LIMIT).contains(&serial) {
        return None;
    }
    // Day 0 is 1899-12-30 once Excel's phantom 1900-02-29 is accounted for
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * SECONDS_PER_DAY).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Numeric time cells: day fractions (0.354 = 08:30), the fractional part of
/// a date-time serial, or a bare hour (8 = 08:00).
fn numeric_time(value: f64) -> Option<NaiveTime> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let fraction = value.fract();
    if value >= 1.0 && fraction == 0.0 {
        if value < 24.0 {
            return NaiveTime::from_hms_opt(value as u32, 0, 0);
        }
        // A whole-day serial carries no time of day
        return None;
    }
    fraction_to_time(fraction)
}

fn fraction_to_time(fraction: f64) -> Option<NaiveTime> {
    let seconds = (fraction * SECONDS_PER_DAY).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

fn excel_datetime_time(dt: &ExcelDateTime) -> Option<NaiveTime> {
    if dt.is_duration() {
        let seconds = dt.as_duration()?.num_seconds();
        if !(0..SECONDS_PER_DAY as i64).contains(&seconds) {
            return None;
        }
        return NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, 0);
    }
    if dt.as_f64() < 1.0 {
        return fraction_to_time(dt.as_f64());
    }
    if dt.as_f64() >= SERIAL_LIMIT {
        return None;
    }
    dt.as_datetime().map(|d| d.time())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Parse a text date. Day-first, optionally led by a weekday name.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = strip_weekday(s.trim());
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            // %Y happily reads "24" as year 24
            if d.year() >= 1900 {
                return Some(d);
            }
        }
    }
    SHORT_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Drop a leading weekday word: "lundi 02/09/2024", "Mon. 2/9/2024".
fn strip_weekday(s: &str) -> &str {
    match s.split_once(char::is_whitespace) {
        Some((first, rest))
            if first
                .trim_end_matches(&[',', '.'][..])
                .chars()
                .all(char::is_alphabetic) =>
        {
            rest.trim_start()
        }
        _ => s,
    }
}

fn parse_iso_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.time());
        }
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()
}

/// Fold a header label for comparison: lowercase, no accents, no spacing
/// or punctuation separators.
pub fn normalize_header(label: &str) -> String {
    label
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.' | ':'))
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        other => other,
    }
}
