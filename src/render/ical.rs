// src/render/ical.rs
//! iCalendar (RFC 5545) output: one VEVENT per tournament.

use chrono::{DateTime, Utc};

use crate::render::{description_html, location};
use crate::tracker::EnrichedEvent;

const PRODID: &str = "-//egf-calendar//EN";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone)]
pub struct CalendarMeta {
    pub name: String,
    pub timezone: String,
}

/// Stable per-content id: identity and fingerprint, `::`-joined.
pub fn uid(e: &EnrichedEvent) -> String {
    format!("{}::{}", e.identity, e.fingerprint)
}

pub fn render_calendar(events: &[EnrichedEvent], meta: &CalendarMeta) -> String {
    let mut out = String::new();
    push(&mut out, "BEGIN", "VCALENDAR");
    push(&mut out, "VERSION", "2.0");
    push(&mut out, "PRODID", PRODID);
    push(&mut out, "CALSCALE", "GREGORIAN");
    push(&mut out, "METHOD", "PUBLISH");
    push(&mut out, "X-WR-CALNAME", &escape_text(&meta.name));
    push(&mut out, "X-WR-TIMEZONE", &escape_text(&meta.timezone));
    for e in events {
        push_event(&mut out, e);
    }
    push(&mut out, "END", "VCALENDAR");
    out
}

fn push_event(out: &mut String, e: &EnrichedEvent) {
    push(out, "BEGIN", "VEVENT");
    push(out, "UID", &escape_text(&uid(e)));
    push(out, "DTSTAMP", &stamp(e.generated_at));
    push(out, "DTSTART", &stamp(e.event.start));
    push(out, "DTEND", &stamp(e.event.end));
    push(out, "CREATED", &stamp(e.created));
    push(out, "LAST-MODIFIED", &stamp(e.modified));
    push(out, "SUMMARY", &escape_text(&e.event.title));
    push(out, "LOCATION", &escape_text(&location(e)));
    if let Some(url) = &e.event.url {
        push(out, "URL", url);
    }
    push(out, "DESCRIPTION", &escape_text(&description_html(e)));
    push(out, "END", "VEVENT");
}

fn stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

fn push(out: &mut String, name: &str, value: &str) {
    let line = format!("{name}:{value}");
    fold_into(out, &line);
}

/// TEXT value escaping: backslash, semicolon, comma, newline.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Append `line` CRLF-terminated, folded so no physical line exceeds 75 octets.
/// Continuation lines start with one space. Never splits a UTF-8 sequence.
fn fold_into(out: &mut String, line: &str) {
    let mut width = 0usize;
    for ch in line.chars() {
        let n = ch.len_utf8();
        if width + n > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += n;
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::sample;

    fn meta() -> CalendarMeta {
        CalendarMeta {
            name: "EGF Tournaments".into(),
            timezone: "Europe/Belgrade".into(),
        }
    }

    #[test]
    fn one_vevent_per_event_with_timestamps() {
        let ics = render_calendar(&[sample(None), sample(Some("https://x.example/"))], &meta());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("\r\nDTSTART:20240412T080000Z\r\n"));
        assert!(ics.contains("\r\nDTEND:20240414T160000Z\r\n"));
        assert!(ics.contains("\r\nCREATED:20240110T080000Z\r\n"));
        assert!(ics.contains("\r\nLAST-MODIFIED:20240301T080000Z\r\n"));
        assert!(ics.contains("\r\nDTSTAMP:20240301T093000Z\r\n"));
        assert!(ics.contains("\r\nLOCATION:Paris\\, FR\r\n"));
        assert_eq!(ics.matches("\r\nURL:").count(), 1);
    }

    #[test]
    fn uid_joins_identity_and_fingerprint() {
        assert_eq!(uid(&sample(None)), "2024::Paris, FR::Cup A & Friends::ab12");
    }

    #[test]
    fn long_lines_are_folded() {
        let ics = render_calendar(&[sample(None)], &meta());
        for line in ics.split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS, "too long: {line:?}");
        }
        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains("DESCRIPTION:<h3><a href=\"#\">Cup A &amp\\; Friends</a></h3>"));
    }

    #[test]
    fn folding_respects_utf8_boundaries() {
        let mut out = String::new();
        fold_into(&mut out, &"č".repeat(100));
        for line in out.split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS);
        }
        assert_eq!(out.replace("\r\n ", "").trim_end(), "č".repeat(100));
    }

    #[test]
    fn text_escaping() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }
}
