use anyhow::{Context, Result};
use docsite_kit_core::{LinkPolicy, Site};
use docsite_kit_generator::generate_site;
use docsite_kit_validator::validate_site;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Build static site for deployment
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    build_static_site(&path, &output)?;

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!();
    println!("To test locally:");
    println!("   docsite-kit preview {}", path.display());
    println!();

    Ok(())
}

/// Parse, validate, generate, and write the site. Shared with deploy so
/// what gets published is exactly what a plain build produces.
pub fn build_static_site(path: &Path, output: &Path) -> Result<Site> {
    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }

    let site_toml_path = path.join("site.toml");
    if !site_toml_path.exists() {
        anyhow::bail!(
            "site.toml not found in {}\nRun 'docsite-kit init {}' first",
            path.display(),
            path.display()
        );
    }

    let site = docsite_kit_core::parse_site_toml(&site_toml_path)
        .context("Failed to parse site.toml")?;

    println!("✓ Loaded: {}", site.meta.title);
    println!("  Sections: {}", site.sections.len());

    // Validation gate: the throw policy turns broken links into hard errors,
    // which land in report.errors and abort here
    let report = validate_site(path, &site);
    for warning in &report.warnings {
        eprintln!("  ⚠ {}", warning);
    }
    if !report.is_ok() {
        for error in &report.errors {
            eprintln!("  ✗ {}", error);
        }
        let policy_note = match site.meta.on_broken_links {
            LinkPolicy::Throw => " (on_broken_links = \"throw\")",
            LinkPolicy::Warn => "",
        };
        anyhow::bail!(
            "Validation failed with {} error(s){}",
            report.errors.len(),
            policy_note
        );
    }

    println!("📄 Generating pages...");
    let generated = generate_site(path, &site).context("Failed to generate site")?;

    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut written = 0;
    for (route, html) in &generated.pages {
        let page_dir = route_to_dir(output, route);
        fs::create_dir_all(&page_dir)
            .with_context(|| format!("Failed to create {}", page_dir.display()))?;
        fs::write(page_dir.join("index.html"), html)
            .with_context(|| format!("Failed to write page for {}", route))?;
        written += 1;
    }
    println!("   ✓ Wrote {} page(s)", written);

    for (asset_path, data) in &generated.assets {
        let dst = output.join(asset_path);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dst, data)
            .with_context(|| format!("Failed to write asset {}", asset_path))?;
    }
    println!("   ✓ Wrote {} generated asset(s)", generated.assets.len());

    // Everything under static/ lands at the output root
    let static_dir = path.join("static");
    let mut copied = 0;
    if static_dir.exists() {
        for entry in WalkDir::new(&static_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let rel = entry
                .path()
                .strip_prefix(&static_dir)
                .expect("walked path under static dir");
            let dst = output.join(rel);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dst)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    println!("   ✓ Copied {} static file(s)", copied);

    Ok(site)
}

/// "/docs/intro" -> <output>/docs/intro; "/" -> <output>
fn route_to_dir(output: &Path, route: &str) -> PathBuf {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        output.to_path_buf()
    } else {
        output.join(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SITE_TOML: &str = r##"
[site]
title = "Test Site"
tagline = "Testing"
url = "https://test.example.com"
favicon = "static/img/favicon.svg"
organization = "test-org"
project = "test-site"

[[section]]
id = "docs"
path = "docs"
route_prefix = "docs"

[pipeline]
transforms = ["gfm"]

[navbar]
title = "Test"

[[navbar.items]]
to = "/docs/intro"
label = "About"
position = "left"

[footer]
copyright_owner = "Test"
"##;

    fn scaffold(dir: &TempDir) {
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::create_dir_all(dir.path().join("static/img")).unwrap();
        fs::write(dir.path().join("site.toml"), SITE_TOML).unwrap();
        fs::write(dir.path().join("docs/intro.md"), "# Intro\n\nHello.\n").unwrap();
        fs::write(
            dir.path().join("static/img/favicon.svg"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\"/>",
        )
        .unwrap();
    }

    #[test]
    fn test_build_writes_pages_and_assets() {
        let dir = TempDir::new().unwrap();
        scaffold(&dir);
        let output = TempDir::new().unwrap();

        let site = build_static_site(dir.path(), output.path()).unwrap();
        assert_eq!(site.meta.title, "Test Site");

        assert!(output.path().join("index.html").is_file());
        assert!(output.path().join("docs/intro/index.html").is_file());
        assert!(output.path().join("docs/index.html").is_file());
        assert!(output.path().join("assets/site.css").is_file());
        assert!(output.path().join("img/favicon.svg").is_file());

        let home = fs::read_to_string(output.path().join("index.html")).unwrap();
        assert!(home.contains("Test Site"));
    }

    #[test]
    fn test_build_fails_without_site_toml() {
        let dir = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let result = build_static_site(dir.path(), output.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("site.toml not found"));
    }

    #[test]
    fn test_build_aborts_on_validation_errors() {
        let dir = TempDir::new().unwrap();
        scaffold(&dir);
        // Break the navbar link target
        fs::remove_file(dir.path().join("docs/intro.md")).unwrap();
        fs::write(dir.path().join("docs/other.md"), "# Other\n").unwrap();
        let output = TempDir::new().unwrap();

        let result = build_static_site(dir.path(), output.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Validation failed"));
    }

    #[test]
    fn test_route_to_dir() {
        let output = Path::new("/tmp/out");
        assert_eq!(route_to_dir(output, "/"), PathBuf::from("/tmp/out"));
        assert_eq!(
            route_to_dir(output, "/docs/intro"),
            PathBuf::from("/tmp/out/docs/intro")
        );
    }
}
