//! Static site generation: markdown compilation plus Leptos SSR components,
//! assembled into a complete page set. All file reading happens here; all
//! file writing stays in the CLI.

pub mod citations;
pub mod components;
pub mod markdown;
pub mod page;

use docsite_kit_core::{ContentSection, Result, SectionKind, Site, Transform};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use citations::Bibliography;
use page::Chrome;

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (route, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Generate the complete site from the parsed configuration and the content
/// tree rooted at `root`. Routes are site-relative; the configured base URL
/// only appears inside the emitted HTML.
pub fn generate_site(root: &Path, site: &Site) -> Result<GeneratedSite> {
    let bibliography = load_bibliography(root, site)?;
    let chrome = Chrome::for_site(site);

    let mut pages: Vec<(String, String)> = Vec::new();

    // Homepage: hero plus the feature cards
    let home_body = format!(
        "{}\n{}",
        components::hero_html(site),
        components::feature_list_html()
    );
    pages.push((
        "/".to_string(),
        page::render_page(site, &chrome, None, &site.meta.tagline, &home_body),
    ));

    for section in &site.sections {
        let dir = root.join(&section.path);
        let docs = scan_section(&dir, section);
        let mut listing: Vec<(String, String)> = Vec::new();
        let mut has_index = false;

        for rel in &docs {
            let source = std::fs::read_to_string(dir.join(rel))?;
            let compiled = markdown::compile(&source, &site.pipeline, bibliography.as_ref());

            let title = compiled
                .title
                .clone()
                .unwrap_or_else(|| title_from_stem(rel));
            let route = section.doc_route(rel);
            if route == section.base_route() {
                has_index = true;
            } else {
                listing.push((route.clone(), title.clone()));
            }

            let meta_line = doc_meta_line(section, &dir.join(rel), compiled.word_count);
            let body = match meta_line {
                Some(line) => format!("<p class=\"doc-meta\">{}</p>\n{}", line, compiled.html),
                None => compiled.html,
            };

            pages.push((
                route,
                page::render_page(site, &chrome, Some(&title), &title, &body),
            ));
        }

        // Sections without an authored index get a generated listing page
        if !has_index {
            let title = title_from_id(&section.id);
            let body = render_listing(site, &title, &listing);
            pages.push((
                section.base_route(),
                page::render_page(site, &chrome, Some(&title), &title, &body),
            ));
        }
    }

    Ok(GeneratedSite {
        pages,
        assets: vec![(
            "assets/site.css".to_string(),
            page::SITE_CSS.as_bytes().to_vec(),
        )],
    })
}

fn load_bibliography(root: &Path, site: &Site) -> Result<Option<Bibliography>> {
    for transform in &site.pipeline {
        if let Transform::Citations(config) = transform {
            return Ok(Some(Bibliography::load(&root.join(&config.bibliography))?));
        }
    }
    Ok(None)
}

/// Section documents as paths relative to the section directory, sorted for
/// deterministic output.
pub fn scan_section(dir: &Path, section: &ContentSection) -> Vec<PathBuf> {
    let mut docs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && section.matches_include(&name)
        })
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(|p| p.to_path_buf()))
        .collect();

    docs.sort();
    docs
}

fn doc_meta_line(section: &ContentSection, path: &Path, word_count: usize) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if section.kind == SectionKind::Blog && section.show_reading_time {
        parts.push(format!("{} min read", reading_minutes(word_count)));
    }

    if section.show_last_update {
        if let Some(date) = last_modified_date(path) {
            parts.push(format!("Last updated on {}", date));
        }
    }

    if let Some(edit_url) = &section.edit_url {
        parts.push(format!(
            "<a href=\"{}\">Edit this page</a>",
            page::html_escape(edit_url)
        ));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

fn reading_minutes(word_count: usize) -> usize {
    // 200 words per minute, never less than a minute
    std::cmp::max(1, word_count.div_ceil(200))
}

fn last_modified_date(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let datetime: chrono::DateTime<chrono::Local> = modified.into();
    Some(datetime.format("%Y-%m-%d").to_string())
}

fn render_listing(site: &Site, title: &str, entries: &[(String, String)]) -> String {
    let mut html = format!(
        "<h1>{}</h1>\n<ul class=\"doc-listing\">\n",
        page::html_escape(title)
    );
    for (route, entry_title) in entries {
        html.push_str(&format!(
            "  <li><a href=\"{}\">{}</a></li>\n",
            site.absolute_route(route),
            page::html_escape(entry_title)
        ));
    }
    html.push_str("</ul>\n");
    html
}

/// "data-science-notes" -> "Data Science Notes"
fn title_from_id(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_from_stem(rel: &Path) -> String {
    let stem = rel
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled");
    title_from_id(stem)
}
