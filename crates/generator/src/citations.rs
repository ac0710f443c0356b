//! `[@key]` citation markers resolved against a BibTeX bibliography.
//!
//! Inline markers become numbered superscript links and a References
//! section is appended to the document. Numbering follows first mention.
//! The configured citation style file travels with the transform payload;
//! rendering here uses the numeric style.

use docsite_kit_core::{Error, Result};
use hayagriva::io::from_biblatex_str;
use hayagriva::types::Person;
use hayagriva::Entry;
use once_cell::sync::Lazy;
use pulldown_cmark::{CowStr, Event};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::page::html_escape;

static CITE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[@([^\]]+)\]").expect("valid regex"));

/// Bibliography entries loaded once per build.
#[derive(Debug, Default)]
pub struct Bibliography {
    entries: HashMap<String, Entry>,
}

impl Bibliography {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_bibtex(&content)
    }

    pub fn from_bibtex(content: &str) -> Result<Self> {
        let library = from_biblatex_str(content).map_err(|errors| {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Error::InvalidData(format!("Failed to parse bibliography: {}", joined))
        })?;

        let entries = library
            .iter()
            .map(|entry| (entry.key().to_string(), entry.clone()))
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One pass over the event stream: rewrite markers, then append the
/// numbered reference list for every key mentioned.
pub struct CitationPass<'a> {
    bibliography: &'a Bibliography,
    order: Vec<String>,
    numbers: HashMap<String, usize>,
}

impl<'a> CitationPass<'a> {
    pub fn new(bibliography: &'a Bibliography) -> Self {
        Self {
            bibliography,
            order: Vec::new(),
            numbers: HashMap::new(),
        }
    }

    pub fn apply<'e>(mut self, events: Vec<Event<'e>>) -> Vec<Event<'e>> {
        let mut out = Vec::with_capacity(events.len());

        for event in events {
            match event {
                Event::Text(text) if CITE_RE.is_match(&text) => {
                    self.rewrite_text(&text, &mut out);
                }
                other => out.push(other),
            }
        }

        if let Some(references) = self.render_references() {
            out.push(Event::Html(CowStr::from(references)));
        }

        out
    }

    fn rewrite_text<'e>(&mut self, text: &str, out: &mut Vec<Event<'e>>) {
        let mut cursor = 0;
        for caps in CITE_RE.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if m.start() > cursor {
                out.push(Event::Text(CowStr::from(text[cursor..m.start()].to_string())));
            }
            let keys = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
            out.push(Event::Html(CowStr::from(self.render_marker(keys))));
            cursor = m.end();
        }
        if cursor < text.len() {
            out.push(Event::Text(CowStr::from(text[cursor..].to_string())));
        }
    }

    fn render_marker(&mut self, raw_keys: &str) -> String {
        let keys: Vec<&str> = raw_keys
            .split([';', ','])
            .map(|k| k.trim().trim_start_matches('@'))
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return format!("[{}]", html_escape(raw_keys));
        }

        let numbers: Vec<usize> = keys.iter().map(|k| self.number_for(k)).collect();
        let label = numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "<sup class=\"citation\"><a href=\"#reference-{}\">[{}]</a></sup>",
            numbers[0], label
        )
    }

    fn number_for(&mut self, key: &str) -> usize {
        if let Some(n) = self.numbers.get(key) {
            return *n;
        }
        let n = self.order.len() + 1;
        self.order.push(key.to_string());
        self.numbers.insert(key.to_string(), n);
        n
    }

    fn render_references(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }

        let mut html = String::from(
            "<section class=\"references\"><h2>References</h2><ol class=\"reference-list\">",
        );
        for (idx, key) in self.order.iter().enumerate() {
            let number = idx + 1;
            html.push_str(&format!("<li id=\"reference-{}\">", number));
            match self.bibliography.get(key) {
                Some(entry) => html.push_str(&format_entry(entry)),
                None => html.push_str(&format!(
                    "<em>Missing bibliography entry: {}</em>",
                    html_escape(key)
                )),
            }
            html.push_str("</li>");
        }
        html.push_str("</ol></section>");
        Some(html)
    }
}

fn format_entry(entry: &Entry) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(authors) = entry.authors() {
        if !authors.is_empty() {
            parts.push(format_authors(authors));
        }
    }

    if let Some(date) = entry.date() {
        parts.push(format!("({})", date.year));
    }

    if let Some(title) = entry.title() {
        parts.push(format!(
            "<span class=\"reference-title\">{}</span>",
            html_escape(&title.to_string())
        ));
    }

    if let Some(parent) = entry.parents().first().and_then(|p| p.title()) {
        parts.push(format!("<em>{}</em>", html_escape(&parent.to_string())));
    }

    if let Some(url) = entry.url() {
        let escaped = html_escape(&url.to_string());
        parts.push(format!("<a href=\"{0}\">{0}</a>", escaped));
    }

    if parts.is_empty() {
        html_escape(entry.key())
    } else {
        parts.join(". ")
    }
}

fn format_authors(authors: &[Person]) -> String {
    let names: Vec<String> = authors
        .iter()
        .map(|p| html_escape(&p.name_first(true, false)))
        .collect();

    match names.len() {
        0 => String::new(),
        1 => names[0].clone(),
        2 => format!("{} and {}", names[0], names[1]),
        _ => format!("{} et al.", names[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::Parser;

    const BIBTEX: &str = r#"
@book{knuth1997,
  author = {Knuth, Donald E.},
  title = {The Art of Computer Programming},
  year = {1997},
  publisher = {Addison-Wesley},
}

@article{shannon1948,
  author = {Shannon, Claude E.},
  title = {A Mathematical Theory of Communication},
  journal = {Bell System Technical Journal},
  year = {1948},
}
"#;

    fn compile_with_citations(md: &str, bib: &Bibliography) -> String {
        let events: Vec<Event<'_>> = Parser::new(md).collect();
        let events = CitationPass::new(bib).apply(events);
        let mut out = String::new();
        pulldown_cmark::html::push_html(&mut out, events.into_iter());
        out
    }

    #[test]
    fn test_load_bibtex() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        assert_eq!(bib.len(), 2);
        assert!(bib.get("knuth1997").is_some());
        assert!(bib.get("missing").is_none());
    }

    #[test]
    fn test_invalid_bibtex_rejected() {
        let result = Bibliography::from_bibtex("@book{broken");
        assert!(result.is_err());
    }

    #[test]
    fn test_inline_citation_numbered_by_first_mention() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations(
            "As shown [@shannon1948], and again [@knuth1997], and once more [@shannon1948].",
            &bib,
        );

        // shannon is cited first, so it gets number 1
        assert!(html.contains("href=\"#reference-1\">[1]"));
        assert!(html.contains("href=\"#reference-2\">[2]"));
        assert_eq!(html.matches("href=\"#reference-1\"").count(), 2);
    }

    #[test]
    fn test_references_section_appended() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations("See [@knuth1997].", &bib);

        assert!(html.contains("<h2>References</h2>"));
        assert!(html.contains("id=\"reference-1\""));
        assert!(html.contains("The Art of Computer Programming"));
        assert!(html.contains("Knuth"));
        assert!(html.contains("(1997)"));
    }

    #[test]
    fn test_multiple_keys_in_one_marker() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations("Both [@knuth1997; @shannon1948] agree.", &bib);
        assert!(html.contains("[1, 2]"));
        assert!(html.contains("id=\"reference-2\""));
    }

    #[test]
    fn test_missing_key_still_renders() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations("See [@nobody2020].", &bib);
        assert!(html.contains("Missing bibliography entry: nobody2020"));
    }

    #[test]
    fn test_no_citations_no_references_section() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations("No citations here.", &bib);
        assert!(!html.contains("References"));
    }

    #[test]
    fn test_surrounding_text_preserved() {
        let bib = Bibliography::from_bibtex(BIBTEX).unwrap();
        let html = compile_with_citations("before [@knuth1997] after", &bib);
        assert!(html.contains("before "));
        assert!(html.contains(" after"));
    }
}
