// src/ingest/extract.rs
//! Row extractor for the tournament listing page.
//!
//! The page carries one `<h2>European Tournaments</h2>` heading, followed by a
//! `<div>` whose direct child `<table>` lists the events. The first row holds
//! `<th>` column names; every further row is one event. A free-standing
//! `Last updated: YYYY-MM-DD HH:MM` marker dates the whole document.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use crate::ingest::types::{ExtractedPage, RawEvent};

pub const SECTION_HEADING: &str = "European Tournaments";

pub const COL_EVENT: &str = "Event";
pub const COL_CITY: &str = "City";
pub const COL_COUNTRY: &str = "Co";
pub const COL_FROM: &str = "From";
pub const COL_TO: &str = "To";
pub const COL_CONTACT: &str = "Contact Address";

const DATE_FORMAT: &str = "%d.%m.%Y";
const UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M";

// Tournaments are listed by day only; the page convention is 08:00 to 16:00.
const START_HOUR: u32 = 8;
const END_HOUR: u32 = 16;

static SEL_H2_OR_DIV: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, div").expect("static selector"));
static SEL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static RE_UPDATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Last updated: (\d{4}-\d{2}-\d{2} \d{2}:\d{2})").expect("static regex")
});
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Parse a full listing document into raw events plus its last-updated stamp.
///
/// Any deviation from the expected page shape is an error: a half-parsed page
/// must never reach the renderers, or a good feed gets overwritten by an empty one.
pub fn extract_page(html: &str) -> Result<ExtractedPage> {
    let t0 = std::time::Instant::now();
    let doc = Html::parse_document(html);

    let last_updated = extract_last_updated(&doc)?;
    let table = find_event_table(&doc)?;
    let rows = table_rows(table);

    let Some((header_row, body_rows)) = rows.split_first() else {
        bail!("event table has no rows");
    };
    let headers: Vec<String> = child_elements(*header_row, "th")
        .map(|th| collapse_ws(&th.text().collect::<Vec<_>>().join(" ")))
        .collect();
    for required in [
        COL_EVENT,
        COL_CITY,
        COL_COUNTRY,
        COL_FROM,
        COL_TO,
        COL_CONTACT,
    ] {
        if !headers.iter().any(|h| h == required) {
            bail!("event table is missing column {required:?} (found {headers:?})");
        }
    }

    let mut events = Vec::with_capacity(body_rows.len());
    for (idx, row) in body_rows.iter().enumerate() {
        let ev = extract_row(*row, &headers).with_context(|| format!("event row {}", idx + 1))?;
        events.push(ev);
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("extract_parse_ms").record(ms);
    counter!("extract_rows_total").increment(events.len() as u64);
    tracing::debug!(target: "extract", rows = events.len(), %last_updated, "page extracted");

    Ok(ExtractedPage {
        events,
        last_updated,
    })
}

fn extract_last_updated(doc: &Html) -> Result<DateTime<Utc>> {
    let stamp = doc
        .root_element()
        .text()
        .find_map(|t| RE_UPDATED.captures(t))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("no 'Last updated:' marker in document"))?;
    let naive = NaiveDateTime::parse_from_str(&stamp, UPDATED_FORMAT)
        .with_context(|| format!("parsing last-updated stamp {stamp:?}"))?;
    Ok(naive.and_utc())
}

fn find_event_table(doc: &Html) -> Result<ElementRef<'_>> {
    // Document order: the first <div> after the heading, not one enclosing it.
    let mut after_heading = false;
    let mut section = None;
    for el in doc.select(&SEL_H2_OR_DIV) {
        match el.value().name() {
            "h2" if !after_heading => {
                after_heading = collapse_ws(&el.text().collect::<String>()) == SECTION_HEADING;
            }
            "div" if after_heading => {
                section = Some(el);
                break;
            }
            _ => {}
        }
    }
    if !after_heading {
        bail!("heading {SECTION_HEADING:?} not found");
    }
    let section = section.ok_or_else(|| anyhow!("no <div> after {SECTION_HEADING:?}"))?;
    child_elements(section, "table")
        .next()
        .ok_or_else(|| anyhow!("no <table> directly inside the {SECTION_HEADING:?} section"))
}

/// Rows of this table only, never of tables nested in its cells.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child_elements(child, "tr")),
            _ => {}
        }
    }
    rows
}

fn extract_row(row: ElementRef<'_>, headers: &[String]) -> Result<RawEvent> {
    let cells: HashMap<&str, ElementRef<'_>> = headers
        .iter()
        .map(String::as_str)
        .zip(child_elements(row, "td"))
        .collect();
    let cell = |name: &str| {
        cells
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("row has no {name:?} cell"))
    };

    let event = cell(COL_EVENT)?;
    let title = collapse_ws(&event.text().collect::<Vec<_>>().join(" "));
    let url = event
        .select(&SEL_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    let start = parse_day(cell(COL_FROM)?, START_HOUR).context("start date")?;
    let end = parse_day(cell(COL_TO)?, END_HOUR).context("end date")?;

    Ok(RawEvent {
        title,
        city: cell_text(cell(COL_CITY)?),
        country: cell_text(cell(COL_COUNTRY)?),
        start,
        end,
        contact: cell(COL_CONTACT)?.inner_html().trim().to_string(),
        url,
        source_fragment: row.html(),
    })
}

fn parse_day(cell: ElementRef<'_>, hour: u32) -> Result<DateTime<Utc>> {
    let raw = cell_text(cell);
    let day = NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .with_context(|| format!("parsing {raw:?} as DD.MM.YYYY"))?;
    let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| anyhow!("bad hour {hour}"))?;
    Ok(day.and_time(time).and_utc())
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_ws(&cell.text().collect::<String>())
}

/// Trim and collapse every whitespace run to one space.
pub(crate) fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}
