//! ICS document generation.

use crate::config::ConverterConfig;
use crate::error::ConvertResult;
use crate::types::ScheduleEntry;
use super::timezone::vtimezone;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};
use uuid::Uuid;

pub const PRODID: &str = "-//EDT Export//FR";

/// Stable identifier for an entry: the same row of the same timetable always
/// gets the same UID, so re-importing a calendar updates instead of
/// duplicating.
pub fn event_uid(entry: &ScheduleEntry) -> String {
    let key = format!(
        "{}|{}|{}|{}|{}",
        entry.sheet(),
        entry.row(),
        entry.subject(),
        entry.start(),
        entry.end()
    );
    format!("{}@edt-ics", Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
}

/// Writes schedule entries as VEVENTs of one VCALENDAR.
pub struct EventSerializer {
    tz: Tz,
    calendar_name: String,
    utc: bool,
    stamp: DateTime<Utc>,
}

impl EventSerializer {
    pub fn new(config: &ConverterConfig) -> ConvertResult<Self> {
        Ok(Self {
            tz: config.tz()?,
            calendar_name: config.calendar_name.clone(),
            utc: config.utc,
            stamp: Utc::now(),
        })
    }

    /// Use a fixed DTSTAMP instead of the current time.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    /// Override the X-WR-CALNAME value.
    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    /// Build the VEVENT for one entry.
    pub fn event(&self, entry: &ScheduleEntry) -> icalendar::Event {
        let mut event = icalendar::Event::new();
        event.uid(&event_uid(entry));
        event.add_property("DTSTAMP", self.stamp.format("%Y%m%dT%H%M%SZ").to_string());
        self.add_datetime_property(&mut event, "DTSTART", entry.start());
        self.add_datetime_property(&mut event, "DTEND", entry.end());
        event.summary(entry.subject());
        event.description(entry.description());
        if let Some(location) = entry.location() {
            event.location(location);
        }
        event.done()
    }

    /// Serialize all entries, in iteration order, into one document.
    pub fn serialize<'e, I>(&self, entries: I) -> String
    where
        I: IntoIterator<Item = &'e ScheduleEntry>,
    {
        let mut cal = Calendar::new();
        cal.name(&self.calendar_name);
        if !self.utc {
            cal.timezone(self.tz.name());
        }
        let mut years: Option<(i32, i32)> = None;
        for entry in entries {
            let (first, last) = (entry.start().year(), entry.end().year());
            years = Some(match years {
                Some((lo, hi)) => (lo.min(first), hi.max(last)),
                None => (first, last),
            });
            cal.push(self.event(entry));
        }
        let cal = cal.done();

        let ics = replace_prodid(&cal.to_string());
        match years {
            // Every TZID needs a matching VTIMEZONE
            Some((first, last)) if !self.utc => {
                insert_before_events(&ics, &vtimezone(self.tz, first..=last))
            }
            _ => ics,
        }
    }

    fn add_datetime_property(&self, event: &mut icalendar::Event, name: &str, local: NaiveDateTime) {
        if self.utc {
            let utc = local_to_utc(self.tz, local);
            event.add_property(name, utc.format("%Y%m%dT%H%M%SZ").to_string());
        } else {
            let mut prop = Property::new(name, local.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", self.tz.name());
            event.append_property(prop);
        }
    }
}

/// Resolve a wall-clock time in `tz`. Ambiguous times (DST fall-back) take
/// the earlier instant; times inside a spring-forward gap are moved one
/// hour later.
fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// The icalendar crate writes its own PRODID; identify as this tool instead.
fn replace_prodid(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }
    result
}

/// Put `block` ahead of the first VEVENT.
fn insert_before_events(ics: &str, block: &str) -> String {
    match ics.find("BEGIN:VEVENT\r\n") {
        Some(at) => format!("{}{}{}", &ics[..at], block, &ics[at..]),
        None => ics.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryFields;
    use chrono::NaiveDate;
    use icalendar::{parser::unfold, CalendarDateTime, DatePerhapsTime};
    use std::str::FromStr;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn entry(row: usize, subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> ScheduleEntry {
        ScheduleEntry::new(
            "EDT P1",
            row,
            EntryFields {
                subject: subject.to_string(),
                teachers: vec!["Dupont".to_string()],
                groups: vec!["G1".to_string()],
                start: Some(start),
                end: Some(end),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap()
    }

    fn serializer(config: &ConverterConfig) -> EventSerializer {
        EventSerializer::new(config).unwrap().with_stamp(stamp())
    }

    #[test]
    fn test_single_event_document() {
        let e = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let ics = serializer(&ConverterConfig::default()).serialize([&e]);
        let text = unfold(&ics);

        assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(text.trim_end().ends_with("END:VCALENDAR"));
        assert!(text.contains("PRODID:-//EDT Export//FR\r\n"));
        assert!(text.contains("DTSTART;TZID=Europe/Paris:20240902T080000"));
        assert!(text.contains("DTEND;TZID=Europe/Paris:20240902T100000"));
        assert!(text.contains("SUMMARY:Algèbre"));
        assert!(text.contains("DTSTAMP:20240830T120000Z"));
        let description = text
            .lines()
            .find(|l| l.starts_with("DESCRIPTION:"))
            .unwrap();
        assert!(description.contains("Algèbre"));
        assert!(description.contains("Dupont"));
        assert!(description.contains("G1"));
        assert_eq!(text.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_document_parses_back() {
        let entries = vec![
            entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0)),
            entry(3, "Analyse", at(2024, 9, 2, 10, 15), at(2024, 9, 2, 12, 15)),
        ];
        let ics = serializer(&ConverterConfig::default()).serialize(&entries);

        let calendar = icalendar::Calendar::from_str(&ics).unwrap();
        let events: Vec<_> = calendar
            .components
            .iter()
            .filter_map(|c| c.as_event())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get_summary(), Some("Algèbre"));
        assert_eq!(events[1].get_summary(), Some("Analyse"));

        match events[1].get_start() {
            Some(DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid })) => {
                assert_eq!(date_time, at(2024, 9, 2, 10, 15));
                assert_eq!(tzid, "Europe/Paris");
            }
            other => panic!("Unexpected DTSTART: {:?}", other),
        }

        let uids: Vec<_> = events.iter().map(|e| e.get_uid().unwrap()).collect();
        assert_ne!(uids[0], uids[1]);
    }

    #[test]
    fn test_location_written_when_present() {
        let e = ScheduleEntry::new(
            "EDT P1",
            2,
            EntryFields {
                subject: "TP Réseaux".to_string(),
                start: Some(at(2024, 9, 2, 8, 0)),
                end: Some(at(2024, 9, 2, 10, 0)),
                location: Some("Salle B12".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let ics = serializer(&ConverterConfig::default()).serialize([&e]);
        assert!(unfold(&ics).contains("LOCATION:Salle B12"));
    }

    #[test]
    fn test_utc_output() {
        let config = ConverterConfig {
            utc: true,
            ..Default::default()
        };
        let summer = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let winter = entry(3, "Algèbre", at(2024, 12, 2, 8, 0), at(2024, 12, 2, 10, 0));
        let text = unfold(&serializer(&config).serialize([&summer, &winter]));

        assert!(text.contains("DTSTART:20240902T060000Z"));
        assert!(text.contains("DTEND:20240902T080000Z"));
        assert!(text.contains("DTSTART:20241202T070000Z"));
        assert!(!text.contains("TZID="));
        assert!(!text.contains("BEGIN:VTIMEZONE"));
    }

    #[test]
    fn test_local_output_defines_its_timezone() {
        let september = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let april = entry(3, "Analyse", at(2025, 4, 7, 8, 0), at(2025, 4, 7, 10, 0));
        let ics = serializer(&ConverterConfig::default()).serialize([&september, &april]);

        assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
        assert!(ics.contains("BEGIN:VTIMEZONE\r\nTZID:Europe/Paris\r\n"));
        assert!(ics.find("END:VTIMEZONE").unwrap() < ics.find("BEGIN:VEVENT").unwrap());
        // Both years of the school year are covered
        assert!(ics.contains("DTSTART:20241027T030000"));
        assert!(ics.contains("DTSTART:20250330T020000"));

        let calendar = icalendar::Calendar::from_str(&ics).unwrap();
        let events = calendar
            .components
            .iter()
            .filter_map(|c| c.as_event())
            .count();
        assert_eq!(events, 2);
    }

    #[test]
    fn test_local_to_utc_handles_dst_edges() {
        let tz: Tz = "Europe/Paris".parse().unwrap();
        // 2024-03-31 02:30 does not exist in Paris
        let gap = local_to_utc(tz, at(2024, 3, 31, 2, 30));
        assert_eq!(gap, Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap());
        // 2024-10-27 02:30 happens twice; the first one is CEST
        let ambiguous = local_to_utc(tz, at(2024, 10, 27, 2, 30));
        assert_eq!(ambiguous, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_uid_is_stable_and_distinct() {
        let a = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let a_again = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let b = entry(3, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));

        assert_eq!(event_uid(&a), event_uid(&a_again));
        assert_ne!(event_uid(&a), event_uid(&b));
        assert!(event_uid(&a).ends_with("@edt-ics"));
    }

    #[test]
    fn test_serialization_is_deterministic_with_fixed_stamp() {
        let e = entry(2, "Algèbre", at(2024, 9, 2, 8, 0), at(2024, 9, 2, 10, 0));
        let config = ConverterConfig::default();
        assert_eq!(
            serializer(&config).serialize([&e]),
            serializer(&config).serialize([&e])
        );
    }

    #[test]
    fn test_empty_calendar_is_well_formed() {
        let ics = serializer(&ConverterConfig::default()).serialize(std::iter::empty());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(!ics.contains("BEGIN:VEVENT"));
        assert!(!ics.contains("BEGIN:VTIMEZONE"));
    }

    #[test]
    fn test_insert_before_events() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        assert_eq!(
            insert_before_events(ics, "X-BLOCK:1\r\n"),
            "BEGIN:VCALENDAR\r\nX-BLOCK:1\r\nBEGIN:VEVENT\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
        );
    }

    #[test]
    fn test_replace_prodid() {
        let out = replace_prodid("BEGIN:VCALENDAR\r\nPRODID:ICALENDAR-RS\r\nEND:VCALENDAR\r\n");
        assert_eq!(
            out,
            "BEGIN:VCALENDAR\r\nPRODID:-//EDT Export//FR\r\nEND:VCALENDAR\r\n"
        );
    }
}
