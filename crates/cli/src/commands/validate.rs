use anyhow::Context;
use docsite_kit_core::parse_site_toml;
use docsite_kit_validator::validate_site;
use std::path::PathBuf;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating site at: {}", path.display());

    let config_path = path.join("site.toml");
    let site = parse_site_toml(&config_path).context("Failed to parse site.toml")?;

    println!("✓ site.toml valid");
    println!("  Site: {} - {}", site.meta.title, site.meta.tagline);
    println!("  Sections: {}", site.sections.len());
    let transforms: Vec<&str> = site.pipeline.iter().map(|t| t.name()).collect();
    println!("  Pipeline: {}", transforms.join(" -> "));

    let report = validate_site(&path, &site);

    if !report.info.is_empty() {
        println!();
        for line in &report.info {
            println!("  • {}", line);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        for line in &report.warnings {
            println!("  ⚠ {}", line);
        }
    }

    if !report.errors.is_empty() {
        println!();
        for line in &report.errors {
            println!("  ✗ {}", line);
        }
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!("\n✓ All checks passed");
    Ok(())
}
