// src/render/rss.rs
//! RSS 2.0 change feed. Every edit of an event yields a fresh guid, so feed
//! readers surface it as a new item.

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::render::description_html;
use crate::tracker::EnrichedEvent;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
    /// Public URL of this feed.
    pub link: String,
    /// Item link for events without a website.
    pub default_link: String,
    pub ttl_minutes: u32,
}

/// Feed guid: identity and fingerprint, `_`-joined.
pub fn guid(e: &EnrichedEvent) -> String {
    format!("{}_{}", e.identity, e.fingerprint)
}

pub fn render_feed(events: &[EnrichedEvent], meta: &FeedMeta) -> Result<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0"), ("xmlns:atom", ATOM_NS)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut w, "title", &meta.title)?;
    text_element(&mut w, "description", &meta.description)?;
    text_element(&mut w, "link", &meta.link)?;
    w.create_element("atom:link")
        .with_attributes([
            ("href", meta.link.as_str()),
            ("rel", "self"),
            ("type", "application/rss+xml"),
        ])
        .write_empty()?;
    text_element(&mut w, "ttl", &meta.ttl_minutes.to_string())?;

    for e in events {
        write_item(&mut w, e, meta)?;
    }

    w.write_event(Event::End(BytesEnd::new("channel")))?;
    w.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(w.into_inner()).context("feed is not valid UTF-8")
}

fn write_item(w: &mut Writer<Vec<u8>>, e: &EnrichedEvent, meta: &FeedMeta) -> Result<()> {
    let link = e.event.url.as_deref().unwrap_or(&meta.default_link);
    w.write_event(Event::Start(BytesStart::new("item")))?;
    text_element(w, "title", &e.event.title)?;
    text_element(w, "link", link)?;
    w.create_element("guid")
        .with_attribute(("isPermaLink", "false"))
        .write_text_content(BytesText::new(&guid(e)))?;
    text_element(w, "pubDate", &e.last_updated.to_rfc2822())?;
    text_element(w, "description", &description_html(e))?;
    w.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    w.create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}
