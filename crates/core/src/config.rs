use crate::error::{Error, Result};
use crate::transforms::{resolve_pipeline, Transform};
use crate::types::*;
use chrono::{Datelike, Local};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSiteMeta,
    #[serde(default)]
    section: Vec<RawSection>,
    pipeline: RawPipeline,
    citations: Option<RawCitations>,
    navbar: RawNavbar,
    footer: RawFooter,
    #[serde(default)]
    theme: ThemeConfig,
    analytics: Option<Analytics>,
}

#[derive(Debug, Deserialize)]
struct RawSiteMeta {
    title: String,
    tagline: String,
    url: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    favicon: String, // Convert to PathBuf
    organization: String,
    project: String,
    #[serde(default = "default_link_policy")]
    on_broken_links: LinkPolicy,
    #[serde(default = "default_markdown_link_policy")]
    on_broken_markdown_links: LinkPolicy,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    id: String,
    path: String, // Convert to PathBuf
    route_prefix: String,
    #[serde(default = "default_section_kind")]
    kind: SectionKind,
    #[serde(default = "default_include")]
    include: Vec<String>,
    edit_url: Option<String>,
    #[serde(default)]
    show_last_update: bool,
    #[serde(default)]
    show_reading_time: bool,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    transforms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCitations {
    bibliography: String, // Convert to PathBuf
    style: String,        // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawNavbar {
    title: String,
    logo: Option<RawLogo>,
    #[serde(default)]
    hide_on_scroll: bool,
    #[serde(default)]
    items: Vec<NavbarItem>,
}

#[derive(Debug, Deserialize)]
struct RawLogo {
    src: String, // Convert to PathBuf
    alt: String,
}

#[derive(Debug, Deserialize)]
struct RawFooter {
    #[serde(default = "default_footer_style")]
    style: String,
    copyright_owner: String,
    #[serde(default)]
    groups: Vec<FooterGroup>,
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_link_policy() -> LinkPolicy {
    LinkPolicy::Throw
}

fn default_markdown_link_policy() -> LinkPolicy {
    LinkPolicy::Warn
}

fn default_section_kind() -> SectionKind {
    SectionKind::Docs
}

fn default_include() -> Vec<String> {
    vec!["*.md".to_string(), "*.mdx".to_string()]
}

fn default_footer_style() -> String {
    "dark".to_string()
}

/// Parse site.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<Site> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse site.toml from a string (useful for testing)
///
/// Performs the full one-shot assembly: deserialization, path safety checks,
/// uniqueness invariants across content sections, transform-pipeline
/// resolution, and the copyright line for the current calendar year. The
/// result is deterministic apart from that one year-derived field.
pub fn parse_site_toml_str(content: &str) -> Result<Site> {
    let raw: RawConfig = toml::from_str(content)?;

    let meta = SiteMeta {
        title: raw.site.title,
        tagline: raw.site.tagline,
        url: raw.site.url,
        base_url: normalize_base_url(&raw.site.base_url),
        favicon: validate_path(&raw.site.favicon, "site.favicon")?,
        organization: raw.site.organization,
        project: raw.site.project,
        on_broken_links: raw.site.on_broken_links,
        on_broken_markdown_links: raw.site.on_broken_markdown_links,
    };

    // Convert sections, enforcing id and route-prefix uniqueness
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_prefixes: HashSet<String> = HashSet::new();
    let mut sections = Vec::with_capacity(raw.section.len());
    for s in raw.section {
        if s.id.trim().is_empty() {
            return Err(Error::ConfigParse("Empty section id".to_string()));
        }
        let route_prefix = s.route_prefix.trim_matches('/').to_string();
        if route_prefix.is_empty() {
            return Err(Error::ConfigParse(format!(
                "Empty route_prefix in section '{}'",
                s.id
            )));
        }
        if !seen_ids.insert(s.id.clone()) {
            return Err(Error::ConfigParse(format!(
                "Duplicate section id '{}'",
                s.id
            )));
        }
        if !seen_prefixes.insert(route_prefix.clone()) {
            return Err(Error::DuplicateRoute(route_prefix));
        }

        sections.push(ContentSection {
            path: validate_path(&s.path, &format!("section.{}.path", s.id))?,
            id: s.id,
            route_prefix,
            kind: s.kind,
            include: s.include,
            edit_url: s.edit_url,
            show_last_update: s.show_last_update,
            show_reading_time: s.show_reading_time,
        });
    }

    let citations = match raw.citations {
        Some(c) => Some(CitationsConfig {
            bibliography: validate_path(&c.bibliography, "citations.bibliography")?,
            style: validate_path(&c.style, "citations.style")?,
        }),
        None => None,
    };

    let pipeline: Vec<Transform> =
        resolve_pipeline(&raw.pipeline.transforms, citations.as_ref())?;

    let logo = match raw.navbar.logo {
        Some(l) => Some(Logo {
            src: validate_path(&l.src, "navbar.logo.src")?,
            alt: l.alt,
        }),
        None => None,
    };

    for item in &raw.navbar.items {
        match (&item.to, &item.href) {
            (Some(_), Some(_)) => {
                return Err(Error::ConfigParse(format!(
                    "Navbar item '{}' sets both 'to' and 'href'",
                    item.label
                )));
            }
            (None, None) => {
                return Err(Error::ConfigParse(format!(
                    "Navbar item '{}' sets neither 'to' nor 'href'",
                    item.label
                )));
            }
            _ => {}
        }
        if item.label.trim().is_empty() {
            return Err(Error::ConfigParse("Empty navbar item label".to_string()));
        }
    }

    let navbar = Navbar {
        title: raw.navbar.title,
        logo,
        hide_on_scroll: raw.navbar.hide_on_scroll,
        items: raw.navbar.items,
    };

    for group in &raw.footer.groups {
        if group.title.trim().is_empty() {
            return Err(Error::ConfigParse("Empty footer group title".to_string()));
        }
    }

    let footer = Footer {
        style: raw.footer.style,
        groups: raw.footer.groups,
        copyright: copyright_line(&raw.footer.copyright_owner),
    };

    Ok(Site {
        meta,
        sections,
        pipeline,
        citations,
        navbar,
        footer,
        theme: raw.theme,
        analytics: raw.analytics,
    })
}

/// Copyright line for the footer, stamped with the current calendar year.
/// The only non-deterministic field the assembly produces.
fn copyright_line(owner: &str) -> String {
    format!(
        "Copyright © {} {} Built with docsite-kit.",
        Local::now().year(),
        owner
    )
}

/// Ensure the base URL starts and ends with a slash.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Validate and convert a path string to PathBuf.
///
/// Configuration paths are always relative to the site root. Absolute paths
/// and parent directory references are rejected so a site.toml can never
/// reach outside its own directory.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // Reject absolute paths
    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    // Check for parent directory references
    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    // Ensure path is not empty
    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE_TOML: &str = r##"
[site]
title = "Make Use of Data"
tagline = "A collection of useful data-related notes, considerations, and articles"
url = "https://www.makeuseofdata.com"
base_url = "/"
favicon = "static/img/favicon.ico"
organization = "make-use-of-data"
project = "website"
on_broken_links = "throw"
on_broken_markdown_links = "warn"

[[section]]
id = "docs"
path = "docs"
route_prefix = "docs"
show_last_update = true
edit_url = "https://github.com/make-use-of-data/website/tree/main/website"

[[section]]
id = "data-science-notes"
path = "data-science-notes"
route_prefix = "data-science-notes"

[[section]]
id = "making-use-of-data"
path = "making-use-of-data"
route_prefix = "making-use-of-data"

[[section]]
id = "blog"
path = "blog"
route_prefix = "blog"
kind = "blog"
show_reading_time = true

[pipeline]
transforms = [
    "gfm",
    "definition-lists",
    "heading-ids",
    "smart-punctuation",
    "math",
    "autolink-headings",
    "citations",
]

[citations]
bibliography = "references.bib"
style = "operations-research.csl"

[navbar]
title = "MakeUseofData"
hide_on_scroll = true
logo = { src = "static/img/logo-simple.svg", alt = "MakeUseofData logo" }

[[navbar.items]]
to = "/docs/intro"
label = "About"
position = "left"
active_base_regex = "/docs/"

[[navbar.items]]
to = "/data-science-notes/intro"
label = "Data Science Notes"
position = "left"
active_base_regex = "/data-science-notes/"

[[navbar.items]]
to = "/making-use-of-data/intro"
label = "Making Use of Data"
position = "left"
active_base_regex = "/making-use-of-data/"

[[navbar.items]]
to = "/blog"
label = "OneLoneDatum Blog"
position = "left"

[[navbar.items]]
href = "https://github.com/make-use-of-data/website"
label = "GitHub"
position = "right"

[footer]
style = "dark"
copyright_owner = "MakeUseofData.com"

[[footer.groups]]
title = "Site Content"
links = [{ label = "Data Science Notes", to = "/docs/intro" }]

[[footer.groups]]
title = "Community"
links = [{ label = "GitHub", to = "https://github.com/make-use-of-data" }]

[[footer.groups]]
title = "More"
links = [
    { label = "Blog", to = "/blog" },
    { label = "GitHub", to = "https://github.com/make-use-of-data/website" },
]

[theme.image_zoom]
selector = ".markdown img"
margin = 24
background = "#8c3232"
scroll_offset = 0

[theme.code_theme]
light = "github"
dark = "dracula"

[analytics]
tracking_id = "G-VKV4WP95W2"
anonymize_ip = true
"##;

    #[test]
    fn test_parse_full_config() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();

        assert_eq!(site.meta.title, "Make Use of Data");
        assert_eq!(
            site.meta.tagline,
            "A collection of useful data-related notes, considerations, and articles"
        );
        assert_eq!(site.meta.on_broken_links, LinkPolicy::Throw);
        assert_eq!(site.meta.on_broken_markdown_links, LinkPolicy::Warn);

        assert_eq!(site.sections.len(), 4);
        assert_eq!(site.sections[3].kind, SectionKind::Blog);
        assert!(site.sections[3].show_reading_time);
        assert_eq!(site.sections[0].include, vec!["*.md", "*.mdx"]);

        assert_eq!(site.pipeline.len(), 7);
        assert_eq!(site.pipeline[0], Transform::Gfm);
        assert!(matches!(site.pipeline[6], Transform::Citations(_)));

        assert_eq!(site.navbar.items.len(), 5);
        assert_eq!(site.navbar.items[0].position, NavPosition::Left);
        assert_eq!(site.navbar.items[4].position, NavPosition::Right);

        assert_eq!(site.footer.groups.len(), 3);
        assert_eq!(site.theme.image_zoom.margin, 24);
        assert_eq!(site.theme.code_theme.dark, "dracula");
        assert_eq!(site.analytics.as_ref().unwrap().tracking_id, "G-VKV4WP95W2");
    }

    #[test]
    fn test_parse_is_deterministic() {
        // Same input, same output, byte for byte; the copyright year is the
        // same within one test run.
        let first = parse_site_toml_str(SITE_TOML).unwrap();
        let second = parse_site_toml_str(SITE_TOML).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_copyright_contains_current_year() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let year = Local::now().year().to_string();
        assert!(site.footer.copyright.contains(&year));
        assert!(site.footer.copyright.contains("MakeUseofData.com"));
    }

    #[test]
    fn test_route_prefixes_pairwise_distinct() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let mut prefixes: Vec<_> = site
            .sections
            .iter()
            .map(|s| s.route_prefix.clone())
            .collect();
        let before = prefixes.len();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), before);
    }

    #[test]
    fn test_duplicate_route_prefix_rejected() {
        let toml = SITE_TOML.replace(
            "route_prefix = \"data-science-notes\"",
            "route_prefix = \"docs\"",
        );
        let result = parse_site_toml_str(&toml);
        assert!(matches!(result, Err(Error::DuplicateRoute(ref p)) if p == "docs"));
    }

    #[test]
    fn test_duplicate_section_id_rejected() {
        let toml = SITE_TOML.replace("id = \"data-science-notes\"", "id = \"docs\"");
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Duplicate section id")
        );
    }

    #[test]
    fn test_route_prefix_normalized() {
        let toml = SITE_TOML.replace("route_prefix = \"docs\"", "route_prefix = \"/docs/\"");
        let site = parse_site_toml_str(&toml).unwrap();
        assert_eq!(site.sections[0].route_prefix, "docs");
    }

    #[test]
    fn test_unknown_transform_rejected() {
        let toml = SITE_TOML.replace("\"math\",", "\"mermaid\",");
        let result = parse_site_toml_str(&toml);
        assert!(matches!(result, Err(Error::UnknownTransform(ref n)) if n == "mermaid"));
    }

    #[test]
    fn test_citations_transform_requires_citations_table() {
        let start = SITE_TOML.find("[citations]").unwrap();
        let end = SITE_TOML.find("[navbar]").unwrap();
        let toml = format!("{}{}", &SITE_TOML[..start], &SITE_TOML[end..]);
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("no [citations] table")
        );
    }

    #[test]
    fn test_rejects_absolute_section_path() {
        let toml = SITE_TOML.replace("path = \"docs\"", "path = \"/etc/docs\"");
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Absolute paths not allowed")
        );
    }

    #[test]
    fn test_rejects_parent_dir_in_favicon() {
        let toml = SITE_TOML.replace(
            "favicon = \"static/img/favicon.ico\"",
            "favicon = \"../favicon.ico\"",
        );
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );
    }

    #[test]
    fn test_navbar_item_requires_exactly_one_destination() {
        let toml = SITE_TOML.replace(
            "to = \"/docs/intro\"\nlabel = \"About\"",
            "to = \"/docs/intro\"\nhref = \"https://example.com\"\nlabel = \"About\"",
        );
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("both 'to' and 'href'"));

        let toml = SITE_TOML.replace(
            "to = \"/docs/intro\"\nlabel = \"About\"",
            "label = \"About\"",
        );
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("neither 'to' nor 'href'")
        );
    }

    #[test]
    fn test_empty_footer_group_title_rejected() {
        let toml = SITE_TOML.replace("title = \"Site Content\"", "title = \"\"");
        let result = parse_site_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Empty footer group title")
        );
    }

    #[test]
    fn test_defaults_applied() {
        let toml = r##"
[site]
title = "Minimal"
tagline = "Just enough"
url = "https://minimal.example.com"
favicon = "static/favicon.ico"
organization = "minimal"
project = "site"

[[section]]
id = "docs"
path = "docs"
route_prefix = "docs"

[pipeline]
transforms = ["gfm"]

[navbar]
title = "Minimal"

[footer]
copyright_owner = "Minimal"
"##;

        let site = parse_site_toml_str(toml).unwrap();
        assert_eq!(site.meta.base_url, "/");
        assert_eq!(site.meta.on_broken_links, LinkPolicy::Throw);
        assert_eq!(site.meta.on_broken_markdown_links, LinkPolicy::Warn);
        assert_eq!(site.sections[0].kind, SectionKind::Docs);
        assert_eq!(site.footer.style, "dark");
        assert_eq!(site.theme.image_zoom.selector, ".markdown img");
        assert!(site.analytics.is_none());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("/"), "/");
        assert_eq!(normalize_base_url(""), "/");
        assert_eq!(normalize_base_url("site"), "/site/");
        assert_eq!(normalize_base_url("/site/"), "/site/");
    }
}
