// src/render/mod.rs
pub mod ical;
pub mod rss;

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::tracker::EnrichedEvent;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// HTML summary shared by calendar entries and feed items.
///
/// Title, place and link are escaped; the contact markup is passed through as
/// published, links included.
pub fn description_html(e: &EnrichedEvent) -> String {
    let ev = &e.event;
    let url = ev.url.as_deref().unwrap_or("#");
    format!(
        concat!(
            r#"<h3><a href="{url}">{title}</a></h3>"#,
            r#"<dl style="width: 100%;">"#,
            r#"<dt style="width: 30%; float: left;">Location:</dt>"#,
            r#"<dd style="width: 70%; float: left;">{city}, {country}</dd>"#,
            r#"<dt style="width: 30%; float: left;">Dates:</dt>"#,
            r#"<dd style="width: 70%; float: left;">{start} - {end}</dd>"#,
            r#"<dt style="width: 30%; float: left;">Contact:</dt>"#,
            r#"<dd style="width: 70%; float: left;">{contact}</dd></dl>"#,
        ),
        url = html_escape::encode_double_quoted_attribute(url),
        title = html_escape::encode_text(&ev.title),
        city = html_escape::encode_text(&ev.city),
        country = html_escape::encode_text(&ev.country),
        start = ev.start.format(DATE_FORMAT),
        end = ev.end.format(DATE_FORMAT),
        contact = ev.contact,
    )
}

/// `City, CC`
pub fn location(e: &EnrichedEvent) -> String {
    format!("{}, {}", e.event.city, e.event.country)
}

/// Replace `path` with `content` via a sibling temp file + rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    let res = write_and_rename(tmp, path, content);
    if res.is_err() {
        let _ = fs::remove_file(tmp);
    }
    res
}

fn write_and_rename(tmp: &Path, path: &Path, content: &str) -> Result<()> {
    let mut f = fs::File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("syncing {}", tmp.display()))?;
    fs::rename(tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::sample;
    use super::*;

    #[test]
    fn description_escapes_fields_but_keeps_contact_markup() {
        let html = description_html(&sample(Some("https://cup-a.example/?a=1&b=2")));
        assert!(html.contains(r#"<a href="https://cup-a.example/?a=1&amp;b=2">"#));
        assert!(html.contains("Cup A &amp; Friends"));
        assert!(html.contains("12.04.2024 - 14.04.2024"));
        assert!(html.contains(r#"<a href="mailto:j@example.org">"#));
    }

    #[test]
    fn description_without_url_links_nowhere() {
        let html = description_html(&sample(None));
        assert!(html.starts_with(r##"<h3><a href="#">"##));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out").join("a.ics");
        write_atomic(&p, "one").unwrap();
        write_atomic(&p, "two").unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "two");
        assert!(!dir.path().join("out").join("a.ics.tmp").exists());
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the rename fail.
        let p = dir.path().join("a.rss");
        fs::create_dir_all(p.join("occupied")).unwrap();
        assert!(write_atomic(&p, "feed").is_err());
        assert!(!dir.path().join("a.rss.tmp").exists());
        assert!(p.join("occupied").is_dir());
    }
}
