//! Configuration and content validation.
//!
//! Everything here is advisory until the build runs: the report carries
//! errors (build-aborting under the configured policies), warnings, and
//! informational notes. No file is modified.

use docsite_kit_core::{ContentSection, LinkPolicy, Site};
use pulldown_cmark::{Event, Parser, Tag};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn note(&mut self, msg: impl Into<String>) {
        self.info.push(msg.into());
    }

    /// File a finding as error or warning depending on the link policy.
    fn finding(&mut self, policy: LinkPolicy, msg: String) {
        match policy {
            LinkPolicy::Throw => self.error(msg),
            LinkPolicy::Warn => self.warn(msg),
        }
    }
}

/// Validate a parsed site against the content tree rooted at `root`.
pub fn validate_site(root: &Path, site: &Site) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_route_uniqueness(site, &mut report);

    // Collect every document up front; the route set doubles as the link
    // target universe for navbar, footer, and in-document checks.
    let mut routes: HashSet<String> = HashSet::new();
    routes.insert("/".to_string());
    let mut documents: Vec<(usize, PathBuf)> = Vec::new();

    for (idx, section) in site.sections.iter().enumerate() {
        let dir = root.join(&section.path);
        if !dir.is_dir() {
            report.error(format!(
                "Section '{}': content directory '{}' does not exist",
                section.id,
                section.path.display()
            ));
            continue;
        }

        let docs = collect_documents(&dir, section);
        if docs.is_empty() {
            report.warn(format!(
                "Section '{}': no documents matching {:?} under '{}'",
                section.id,
                section.include,
                section.path.display()
            ));
        } else {
            report.note(format!(
                "Section '{}': {} document(s)",
                section.id,
                docs.len()
            ));
        }

        routes.insert(section.base_route());
        for rel in &docs {
            routes.insert(section.doc_route(rel));
            documents.push((idx, rel.clone()));
        }
    }

    check_assets(root, site, &mut report);
    check_navigation(site, &routes, &mut report);

    for (idx, rel) in &documents {
        let section = &site.sections[*idx];
        check_document_links(root, site, section, rel, &routes, &mut report);
    }

    report
}

/// Collect section documents as paths relative to the section directory.
pub fn collect_documents(dir: &Path, section: &ContentSection) -> Vec<PathBuf> {
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

    // Stable ordering for deterministic routes and reports
    docs.sort();
    docs
}

fn check_route_uniqueness(site: &Site, report: &mut ValidationReport) {
    let mut seen: HashSet<&str> = HashSet::new();
    for section in &site.sections {
        if !seen.insert(section.route_prefix.as_str()) {
            report.error(format!(
                "Duplicate route prefix '{}' across content sections",
                section.route_prefix
            ));
        }
    }
}

fn check_assets(root: &Path, site: &Site, report: &mut ValidationReport) {
    check_asset_file(root, &site.meta.favicon, "site.favicon", report);

    if let Some(logo) = &site.navbar.logo {
        check_asset_file(root, &logo.src, "navbar.logo", report);
    }

    if let Some(citations) = &site.citations {
        if !root.join(&citations.bibliography).is_file() {
            report.error(format!(
                "Bibliography file '{}' does not exist",
                citations.bibliography.display()
            ));
        }
        if !root.join(&citations.style).is_file() {
            report.error(format!(
                "Citation style file '{}' does not exist",
                citations.style.display()
            ));
        }
    }
}

fn check_asset_file(root: &Path, rel: &Path, field: &str, report: &mut ValidationReport) {
    let path = root.join(rel);
    if !path.is_file() {
        report.error(format!("{}: file '{}' does not exist", field, rel.display()));
        return;
    }

    // Raster formats get a decode check; SVG and ICO are passed through as-is.
    let is_raster = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| RASTER_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);

    if is_raster {
        match image::ImageReader::open(&path) {
            Ok(reader) => {
                if let Err(err) = reader.decode() {
                    report.error(format!(
                        "{}: '{}' is not a decodable image: {}",
                        field,
                        rel.display(),
                        err
                    ));
                }
            }
            Err(err) => {
                report.error(format!(
                    "{}: failed to read '{}': {}",
                    field,
                    rel.display(),
                    err
                ));
            }
        }
    }
}

fn check_navigation(site: &Site, routes: &HashSet<String>, report: &mut ValidationReport) {
    let policy = site.meta.on_broken_links;

    for item in &site.navbar.items {
        if item.is_internal() && !route_exists(routes, item.destination()) {
            report.finding(
                policy,
                format!(
                    "Navbar item '{}' points at '{}', which is not a known route",
                    item.label,
                    item.destination()
                ),
            );
        }
    }

    for group in &site.footer.groups {
        for link in &group.links {
            if link.is_internal() && !route_exists(routes, &link.to) {
                report.finding(
                    policy,
                    format!(
                        "Footer link '{}' points at '{}', which is not a known route",
                        link.label, link.to
                    ),
                );
            }
        }
    }
}

fn check_document_links(
    root: &Path,
    site: &Site,
    section: &ContentSection,
    rel: &Path,
    routes: &HashSet<String>,
    report: &mut ValidationReport,
) {
    let path = root.join(&section.path).join(rel);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(err) => {
            report.error(format!("Failed to read '{}': {}", path.display(), err));
            return;
        }
    };

    let doc_label = format!("{}/{}", section.path.display(), rel.display());

    for event in Parser::new(&content) {
        let Event::Start(Tag::Link { dest_url, .. }) = event else {
            continue;
        };
        let dest = dest_url.as_ref();

        // External links and in-page anchors are out of scope here
        if dest.contains("://") || dest.starts_with('#') || dest.starts_with("mailto:") {
            continue;
        }

        let target = dest.split('#').next().unwrap_or_default();
        if target.is_empty() {
            continue;
        }

        if target.ends_with(".md") || target.ends_with(".mdx") {
            // Direct file reference, resolved against the document's directory
            let base = path.parent().unwrap_or(root);
            if !base.join(target).is_file() {
                report.finding(
                    site.meta.on_broken_markdown_links,
                    format!(
                        "{}: markdown link '{}' does not resolve to a file",
                        doc_label, dest
                    ),
                );
            }
        } else if target.starts_with('/') && !route_exists(routes, target) {
            report.finding(
                site.meta.on_broken_links,
                format!("{}: link '{}' is not a known route", doc_label, dest),
            );
        }
    }
}

fn route_exists(routes: &HashSet<String>, dest: &str) -> bool {
    let target = dest.split('#').next().unwrap_or_default();
    let normalized = if target.len() > 1 {
        target.trim_end_matches('/')
    } else {
        target
    };
    routes.contains(normalized)
}
