use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SKIP_DIRS: &[&str] = &["static", "assets", "node_modules", "target"];
const MAX_SCAN_DEPTH: usize = 2; // Maximum directory depth for content scanning

/// Escape a string for safe inclusion in TOML per TOML v1.0.0 spec
///
/// Handles the required escape sequences for TOML basic strings. This manual
/// implementation is used instead of toml crate serialization because we're
/// generating a template with comments and specific formatting, not a
/// complete TOML document.
///
/// See: https://toml.io/en/v1.0.0#string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[derive(Debug)]
struct DetectedSection {
    name: String,
    document_count: usize,
}

/// Initialize a new site directory with smart defaults.
///
/// This command analyzes the given directory for existing markdown content:
/// - Top-level directories holding `.md`/`.mdx` files become content sections
/// - A directory named `blog` is registered as the blog section
/// - Without any content, a starter `docs/` + `blog/` structure is created
/// - Generates site.toml with commented defaults
/// - Writes placeholder static assets (favicon, logo, feature icons)
///
/// # Arguments
///
/// * `path` - Path to the directory to initialize (must exist)
/// * `title` - Optional site title for the generated configuration
/// * `tagline` - Optional site tagline
///
/// # Errors
///
/// Returns an error if the directory doesn't exist, site.toml already
/// exists, or file operations fail.
pub async fn run(path: PathBuf, title: Option<String>, tagline: Option<String>) -> Result<()> {
    println!("Initializing site directory: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Directory '{}' does not exist. Create it first: mkdir {}",
            path.display(),
            path.display()
        );
    }

    let site_toml_path = path.join("site.toml");
    if site_toml_path.exists() {
        anyhow::bail!(
            "site.toml already exists at {}\nHint: Delete it first or use a different directory",
            site_toml_path.display()
        );
    }

    println!("\nAnalyzing directory...");

    let sections = scan_content_dirs(&path)?;

    if sections.is_empty() {
        println!("⚠ No markdown content found");
        println!("Creating starter structure");
        create_default_structure(&path, title.as_deref(), tagline.as_deref())?;
        return Ok(());
    }

    println!("✓ Found {} content section(s)", sections.len());
    for section in &sections {
        println!("   {} ({} document(s))", section.name, section.document_count);
    }

    write_static_assets(&path)?;
    generate_site_toml(&path, &sections, title.as_deref(), tagline.as_deref())?;

    println!("\n✓ Initialization complete!");
    println!("\nGenerated structure:");
    println!("  {}/", path.display());
    println!("  ├── site.toml             ← Edit this to set title, navbar, footer");
    for section in &sections {
        println!("  ├── {}/", section.name);
    }
    println!("  └── static/img/           ← Placeholder favicon, logo, feature icons");

    println!("\nNext steps:");
    println!("  1. Edit site.toml (set title, organization, project)");
    println!("  2. Replace the placeholder images in static/img/");
    println!("  3. Preview: docsite-kit preview {}", path.display());

    Ok(())
}

/// Scan for top-level directories that hold markdown content.
///
/// Hidden directories and build/static directories are skipped; each
/// remaining directory is searched up to `MAX_SCAN_DEPTH` levels for
/// `.md`/`.mdx` files.
fn scan_content_dirs(base: &Path) -> Result<Vec<DetectedSection>> {
    let mut sections = Vec::new();

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
            continue;
        }

        let document_count = markdown_file_count(&entry.path());
        if document_count > 0 {
            sections.push(DetectedSection {
                name,
                document_count,
            });
        }
    }

    // Sort by name for consistent ordering
    sections.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(sections)
}

fn markdown_file_count(dir: &Path) -> usize {
    WalkDir::new(dir)
        .max_depth(MAX_SCAN_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && (name.ends_with(".md") || name.ends_with(".mdx"))
        })
        .count()
}

/// "data-science-notes" -> "Data Science Notes"
fn section_label(name: &str) -> String {
    name.split(['-', '_'])
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

fn create_default_structure(base: &Path, title: Option<&str>, tagline: Option<&str>) -> Result<()> {
    fs::create_dir_all(base.join("docs"))?;
    fs::create_dir_all(base.join("blog"))?;

    fs::write(
        base.join("docs").join("intro.md"),
        r##"# Introduction

Welcome to your new documentation site. This page is served at `/docs/intro`.

Write documentation in markdown:

- **Bold** and *italic* text
- Lists, tables, and task lists
- Code blocks
- Math, citations, and more, depending on your transform pipeline
"##,
    )?;

    fs::write(
        base.join("blog").join("welcome.md"),
        r##"# Welcome

First post. Blog entries live in `blog/` and are served under `/blog`.
"##,
    )?;

    write_static_assets(base)?;

    let sections = vec![
        DetectedSection {
            name: "docs".to_string(),
            document_count: 1,
        },
        DetectedSection {
            name: "blog".to_string(),
            document_count: 1,
        },
    ];
    generate_site_toml(base, &sections, title, tagline)?;

    println!("\n✓ Created starter structure");
    println!("\nNext steps:");
    println!("  1. Edit site.toml (set title, organization, project)");
    println!("  2. Add documents to docs/ and blog/");
    println!("  3. Preview: docsite-kit preview {}", base.display());

    Ok(())
}

const FAVICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 32 32"><rect width="32" height="32" rx="6" fill="#8c3232"/><text x="16" y="22" font-family="sans-serif" font-size="16" fill="#fff" text-anchor="middle">d</text></svg>
"##;

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64"><circle cx="32" cy="32" r="28" fill="#8c3232"/><text x="32" y="40" font-family="sans-serif" font-size="24" fill="#fff" text-anchor="middle">ds</text></svg>
"##;

/// Placeholder feature icons referenced by the homepage cards.
const FEATURE_ICONS: &[(&str, &str)] = &[
    (
        "undraw_docusaurus_mountain.svg",
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120"><polygon points="60,20 100,100 20,100" fill="#8c3232"/></svg>
"##,
    ),
    (
        "undraw_docusaurus_tree.svg",
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120"><rect x="54" y="70" width="12" height="30" fill="#6e4a2f"/><circle cx="60" cy="50" r="30" fill="#3c7a3c"/></svg>
"##,
    ),
    (
        "undraw_docusaurus_react.svg",
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120"><circle cx="60" cy="60" r="8" fill="#8c3232"/><ellipse cx="60" cy="60" rx="45" ry="18" fill="none" stroke="#8c3232" stroke-width="3"/><ellipse cx="60" cy="60" rx="45" ry="18" fill="none" stroke="#8c3232" stroke-width="3" transform="rotate(60 60 60)"/><ellipse cx="60" cy="60" rx="45" ry="18" fill="none" stroke="#8c3232" stroke-width="3" transform="rotate(120 60 60)"/></svg>
"##,
    ),
];

/// Write placeholder images, skipping any that already exist.
fn write_static_assets(base: &Path) -> Result<()> {
    let img_dir = base.join("static").join("img");
    fs::create_dir_all(&img_dir)?;

    let mut assets: Vec<(&str, &str)> = vec![
        ("favicon.svg", FAVICON_SVG),
        ("logo.svg", LOGO_SVG),
    ];
    assets.extend_from_slice(FEATURE_ICONS);

    for (name, content) in assets {
        let dst = img_dir.join(name);
        if !dst.exists() {
            fs::write(&dst, content)?;
        }
    }

    Ok(())
}

fn generate_site_toml(
    base: &Path,
    sections: &[DetectedSection],
    title: Option<&str>,
    tagline: Option<&str>,
) -> Result<()> {
    let site_title = toml_escape_string(title.unwrap_or("My Site"));
    let site_tagline = toml_escape_string(tagline.unwrap_or("Notes, articles, and documentation"));

    let title_comment = if title.is_some() {
        ""
    } else {
        "  # TODO: Set site title"
    };
    let tagline_comment = if tagline.is_some() {
        ""
    } else {
        "  # TODO: Set tagline"
    };

    let mut toml = format!(
        "# Generated by docsite-kit init\n\
# Edit this file to customize your site\n\
\n\
[site]\n\
title = \"{site_title}\"{title_comment}\n\
tagline = \"{site_tagline}\"{tagline_comment}\n\
url = \"https://example.com\"  # TODO: Set site URL\n\
base_url = \"/\"\n\
favicon = \"static/img/favicon.svg\"\n\
organization = \"my-org\"  # TODO: GitHub organization or user\n\
project = \"my-site\"  # TODO: GitHub repository name\n\
on_broken_links = \"throw\"\n\
on_broken_markdown_links = \"warn\"\n\
\n\
"
    );

    toml.push_str("# One [[section]] per content directory\n");
    for section in sections {
        let name = toml_escape_string(&section.name);
        toml.push_str("[[section]]\n");
        toml.push_str(&format!("id = \"{}\"\n", name));
        toml.push_str(&format!("path = \"{}\"\n", name));
        toml.push_str(&format!("route_prefix = \"{}\"\n", name));
        if section.name == "blog" {
            toml.push_str("kind = \"blog\"\n");
            toml.push_str("show_reading_time = true\n");
        }
        toml.push('\n');
    }

    toml.push_str(
        r##"# Transforms are applied to every document, left to right
[pipeline]
transforms = [
    "gfm",
    "heading-ids",
    "smart-punctuation",
    "autolink-headings",
    # "math",
    # "citations",  # Requires the [citations] table below
]

# [citations]
# bibliography = "references.bib"
# style = "ieee.csl"

"##,
    );

    toml.push_str(&format!(
        "[navbar]\ntitle = \"{}\"\nhide_on_scroll = false\nlogo = {{ src = \"static/img/logo.svg\", alt = \"{} logo\" }}\n\n",
        site_title, site_title
    ));

    for section in sections {
        toml.push_str("[[navbar.items]]\n");
        toml.push_str(&format!("to = \"/{}\"\n", toml_escape_string(&section.name)));
        toml.push_str(&format!(
            "label = \"{}\"\n",
            toml_escape_string(&section_label(&section.name))
        ));
        toml.push_str("position = \"left\"\n");
        toml.push_str(&format!(
            "active_base_regex = \"/{}/\"\n\n",
            toml_escape_string(&section.name)
        ));
    }

    toml.push_str(&format!(
        "[footer]\nstyle = \"dark\"\ncopyright_owner = \"{}\"\n\n[[footer.groups]]\ntitle = \"Site Content\"\nlinks = [\n",
        site_title
    ));
    for section in sections {
        toml.push_str(&format!(
            "    {{ label = \"{}\", to = \"/{}\" }},\n",
            toml_escape_string(&section_label(&section.name)),
            toml_escape_string(&section.name)
        ));
    }
    toml.push_str("]\n\n");

    toml.push_str(
        r##"# [theme.image_zoom]
# selector = ".markdown img"
# margin = 24
# background = "#8c3232"
# scroll_offset = 0

# [theme.code_theme]
# light = "github"
# dark = "dracula"

# [analytics]
# tracking_id = "G-XXXXXXXXXX"
# anonymize_ip = true
"##,
    );

    // Validate the generated TOML assembles into a full site configuration
    docsite_kit_core::config::parse_site_toml_str(&toml)
        .context("Generated site.toml is invalid - this is a bug in the template generator")?;

    fs::write(base.join("site.toml"), toml)?;

    Ok(())
}
