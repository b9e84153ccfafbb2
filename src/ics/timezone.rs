//! VTIMEZONE block for the zone named by DTSTART/DTEND TZID parameters.
//!
//! chrono-tz exposes offsets, not rules, so the block lists the actual
//! transitions of the years the calendar covers instead of RRULEs.

use chrono::{Duration, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::{OffsetComponents, OffsetName, Tz};
use std::ops::RangeInclusive;

/// One observance: from `start` (local wall-clock time before the change),
/// the zone is at `offset_to` seconds east of UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observance {
    daylight: bool,
    start: NaiveDateTime,
    offset_from: i32,
    offset_to: i32,
    name: String,
}

/// Render the VTIMEZONE component covering `years`, CRLF-terminated.
pub fn vtimezone(tz: Tz, years: RangeInclusive<i32>) -> String {
    let mut lines = vec!["BEGIN:VTIMEZONE".to_string(), format!("TZID:{}", tz.name())];
    for obs in observances(tz, years) {
        let kind = if obs.daylight { "DAYLIGHT" } else { "STANDARD" };
        lines.push(format!("BEGIN:{}", kind));
        lines.push(format!("DTSTART:{}", obs.start.format("%Y%m%dT%H%M%S")));
        lines.push(format!("TZOFFSETFROM:{}", format_offset(obs.offset_from)));
        lines.push(format!("TZOFFSETTO:{}", format_offset(obs.offset_to)));
        lines.push(format!("TZNAME:{}", obs.name));
        lines.push(format!("END:{}", kind));
    }
    lines.push("END:VTIMEZONE".to_string());

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

fn observances(tz: Tz, years: RangeInclusive<i32>) -> Vec<Observance> {
    let (first, last) = (*years.start(), *years.end());
    let Some(mut cursor) = year_start(first) else {
        return Vec::new();
    };
    let end = year_start(last.saturating_add(1)).unwrap_or(cursor);

    // Offset in force when the covered period opens, from local midnight
    let opening = utc_offset(tz, cursor);
    let mut result = vec![observance(tz, cursor, opening, cursor)];

    let step = Duration::days(1);
    while cursor < end {
        let next = cursor + step;
        if utc_offset(tz, next) != utc_offset(tz, cursor) {
            let change = find_change(tz, cursor, next);
            let before = utc_offset(tz, change - Duration::seconds(1));
            result.push(observance(tz, change, before, change + Duration::seconds(before as i64)));
        }
        cursor = next;
    }
    result
}

fn observance(tz: Tz, at_utc: NaiveDateTime, offset_from: i32, start: NaiveDateTime) -> Observance {
    let offset = tz.offset_from_utc_datetime(&at_utc);
    Observance {
        daylight: offset.dst_offset() != Duration::zero(),
        start,
        offset_from,
        offset_to: offset.fix().local_minus_utc(),
        name: offset.abbreviation().to_string(),
    }
}

/// First UTC second at which the offset differs from the one at `lo`.
fn find_change(tz: Tz, mut lo: NaiveDateTime, mut hi: NaiveDateTime) -> NaiveDateTime {
    let before = utc_offset(tz, lo);
    while hi - lo > Duration::seconds(1) {
        let mid = lo + (hi - lo) / 2;
        if utc_offset(tz, mid) == before {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

fn utc_offset(tz: Tz, at_utc: NaiveDateTime) -> i32 {
    tz.offset_from_utc_datetime(&at_utc).fix().local_minus_utc()
}

fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// `+0100`, `-0330`, `+054517` when seconds are present.
fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let (h, m, s) = (abs / 3600, abs % 3600 / 60, abs % 60);
    if s == 0 {
        format!("{}{:02}{:02}", sign, h, m)
    } else {
        format!("{}{:02}{:02}{:02}", sign, h, m, s)
    }
}
