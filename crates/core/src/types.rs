use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::transforms::Transform;

/// Complete site configuration, assembled once from site.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub meta: SiteMeta,
    pub sections: Vec<ContentSection>,
    pub pipeline: Vec<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<CitationsConfig>,
    pub navbar: Navbar,
    pub footer: Footer,
    pub theme: ThemeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
}

impl Site {
    /// Join a site-relative path onto the configured base URL.
    ///
    /// `absolute_route("/docs/intro")` with `base_url = "/"` yields
    /// `/docs/intro`; with `base_url = "/site/"` it yields `/site/docs/intro`.
    pub fn absolute_route(&self, path: &str) -> String {
        let base = self.meta.base_url.trim_end_matches('/');
        let rest = path.trim_start_matches('/');
        if rest.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}", base, rest)
        }
    }

    /// URL for a configured asset path. The `static/` directory is copied
    /// to the output root at build time, so its prefix drops out of URLs.
    pub fn asset_url(&self, path: &std::path::Path) -> String {
        let rel = path.strip_prefix("static").unwrap_or(path);
        self.absolute_route(&rel.to_string_lossy())
    }
}

/// Site identity and link-checking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMeta {
    pub title: String,
    pub tagline: String,
    pub url: String,
    pub base_url: String,
    pub favicon: PathBuf,
    pub organization: String,
    pub project: String,
    pub on_broken_links: LinkPolicy,
    pub on_broken_markdown_links: LinkPolicy,
}

/// What to do when a link target does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Abort the build
    Throw,
    /// Report and continue
    Warn,
}

/// A registered (directory, route-prefix) pair defining one documentation subsite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub id: String,
    pub path: PathBuf,
    pub route_prefix: String,
    pub kind: SectionKind,
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
    pub show_last_update: bool,
    pub show_reading_time: bool,
}

impl ContentSection {
    /// Route under which this section's pages are served, without base URL.
    pub fn base_route(&self) -> String {
        format!("/{}", self.route_prefix)
    }

    /// Whether a file name matches the section's include patterns.
    /// Patterns are simple `*.ext` globs, matched against the name only.
    pub fn matches_include(&self, file_name: &str) -> bool {
        self.include.iter().any(|pattern| {
            match pattern.strip_prefix('*') {
                Some(suffix) => file_name.ends_with(suffix),
                None => file_name == pattern,
            }
        })
    }

    /// Route for a document at `rel_path` inside this section's directory.
    ///
    /// The extension is dropped and an `index` stem collapses onto its
    /// parent, so `intro.md` serves at `/<prefix>/intro` and `index.md`
    /// at `/<prefix>`.
    pub fn doc_route(&self, rel_path: &std::path::Path) -> String {
        let mut parts: Vec<String> = vec![self.route_prefix.clone()];
        if let Some(parent) = rel_path.parent() {
            for component in parent.components() {
                parts.push(component.as_os_str().to_string_lossy().to_string());
            }
        }
        let stem = rel_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if stem != "index" && !stem.is_empty() {
            parts.push(stem.to_string());
        }
        format!("/{}", parts.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Docs,
    Blog,
}

/// Bibliography and citation style inputs for the citations transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationsConfig {
    pub bibliography: PathBuf,
    pub style: PathBuf,
}

/// Top navigation bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navbar {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    pub hide_on_scroll: bool,
    pub items: Vec<NavbarItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logo {
    pub src: PathBuf,
    pub alt: String,
}

/// One navbar entry; exactly one of `to` (internal) or `href` (external) is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavbarItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub label: String,
    pub position: NavPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_base_regex: Option<String>,
}

impl NavbarItem {
    pub fn destination(&self) -> &str {
        self.to
            .as_deref()
            .or(self.href.as_deref())
            .unwrap_or_default()
    }

    pub fn is_internal(&self) -> bool {
        self.to.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavPosition {
    Left,
    Right,
}

/// Footer link groups plus the assembled copyright line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub style: String,
    pub groups: Vec<FooterGroup>,
    pub copyright: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterGroup {
    pub title: String,
    pub links: Vec<FooterLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub to: String,
}

impl FooterLink {
    /// External links carry a scheme; everything else is an internal route.
    pub fn is_internal(&self) -> bool {
        !self.to.contains("://")
    }
}

/// Display options passed through to the generated pages unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ThemeConfig {
    #[serde(default)]
    pub image_zoom: ImageZoom,
    #[serde(default)]
    pub code_theme: CodeTheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageZoom {
    pub selector: String,
    pub margin: u32,
    pub background: String,
    pub scroll_offset: u32,
}

impl Default for ImageZoom {
    fn default() -> Self {
        Self {
            selector: ".markdown img".to_string(),
            margin: 24,
            background: "#8c3232".to_string(),
            scroll_offset: 0,
        }
    }
}

/// Syntax-highlighting color theme names for light and dark mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTheme {
    pub light: String,
    pub dark: String,
}

impl Default for CodeTheme {
    fn default() -> Self {
        Self {
            light: "github".to_string(),
            dark: "dracula".to_string(),
        }
    }
}

/// Analytics tracking identifier, forwarded to the gtag snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub tracking_id: String,
    pub anonymize_ip: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn site_with_base(base_url: &str) -> Site {
        Site {
            meta: SiteMeta {
                title: "t".to_string(),
                tagline: "tg".to_string(),
                url: "https://example.com".to_string(),
                base_url: base_url.to_string(),
                favicon: PathBuf::from("static/img/favicon.ico"),
                organization: "org".to_string(),
                project: "proj".to_string(),
                on_broken_links: LinkPolicy::Throw,
                on_broken_markdown_links: LinkPolicy::Warn,
            },
            sections: vec![],
            pipeline: vec![],
            citations: None,
            navbar: Navbar {
                title: "t".to_string(),
                logo: None,
                hide_on_scroll: false,
                items: vec![],
            },
            footer: Footer {
                style: "dark".to_string(),
                groups: vec![],
                copyright: String::new(),
            },
            theme: ThemeConfig::default(),
            analytics: None,
        }
    }

    #[test]
    fn test_absolute_route_root_base() {
        let site = site_with_base("/");
        assert_eq!(site.absolute_route("/docs/intro"), "/docs/intro");
        assert_eq!(site.absolute_route("blog"), "/blog");
        assert_eq!(site.absolute_route("/"), "/");
    }

    #[test]
    fn test_absolute_route_nested_base() {
        let site = site_with_base("/site/");
        assert_eq!(site.absolute_route("/docs/intro"), "/site/docs/intro");
        assert_eq!(site.absolute_route(""), "/site/");
    }

    #[test]
    fn test_asset_url_strips_static_prefix() {
        let site = site_with_base("/");
        assert_eq!(
            site.asset_url(Path::new("static/img/favicon.ico")),
            "/img/favicon.ico"
        );
        assert_eq!(site.asset_url(Path::new("img/logo.svg")), "/img/logo.svg");
    }

    #[test]
    fn test_navbar_item_destination() {
        let item = NavbarItem {
            to: Some("/docs/intro".to_string()),
            href: None,
            label: "About".to_string(),
            position: NavPosition::Left,
            active_base_regex: None,
        };
        assert_eq!(item.destination(), "/docs/intro");
        assert!(item.is_internal());

        let external = NavbarItem {
            to: None,
            href: Some("https://github.com/make-use-of-data/website".to_string()),
            label: "GitHub".to_string(),
            position: NavPosition::Right,
            active_base_regex: None,
        };
        assert_eq!(
            external.destination(),
            "https://github.com/make-use-of-data/website"
        );
        assert!(!external.is_internal());
    }

    #[test]
    fn test_matches_include() {
        let section = ContentSection {
            id: "docs".to_string(),
            path: PathBuf::from("docs"),
            route_prefix: "docs".to_string(),
            kind: SectionKind::Docs,
            include: vec!["*.md".to_string(), "*.mdx".to_string()],
            edit_url: None,
            show_last_update: false,
            show_reading_time: false,
        };
        assert!(section.matches_include("intro.md"));
        assert!(section.matches_include("widgets.mdx"));
        assert!(!section.matches_include("notes.txt"));
        assert!(!section.matches_include("intro.md.bak"));
    }

    #[test]
    fn test_doc_route() {
        let section = ContentSection {
            id: "docs".to_string(),
            path: PathBuf::from("docs"),
            route_prefix: "docs".to_string(),
            kind: SectionKind::Docs,
            include: vec!["*.md".to_string()],
            edit_url: None,
            show_last_update: false,
            show_reading_time: false,
        };
        assert_eq!(section.doc_route(Path::new("intro.md")), "/docs/intro");
        assert_eq!(section.doc_route(Path::new("index.md")), "/docs");
        assert_eq!(
            section.doc_route(Path::new("guides/setup.md")),
            "/docs/guides/setup"
        );
        assert_eq!(section.doc_route(Path::new("guides/index.md")), "/docs/guides");
    }

    #[test]
    fn test_footer_link_is_internal() {
        let internal = FooterLink {
            label: "Blog".to_string(),
            to: "/blog".to_string(),
        };
        assert!(internal.is_internal());

        let external = FooterLink {
            label: "GitHub".to_string(),
            to: "https://github.com/make-use-of-data".to_string(),
        };
        assert!(!external.is_internal());
    }
}
