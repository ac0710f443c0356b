use anyhow::{Context, Result};
use docsite_kit_core::parse_site_toml;
use docsite_kit_deployer::github::GithubClient;
use docsite_kit_deployer::{Deployer, GithubPagesDeployer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use super::build::build_static_site;

const DEFAULT_BRANCH: &str = "gh-pages";

/// Global configuration for deployments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub api_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl GithubConfig {
    fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }
}

/// Get path to global config file
fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    let config_dir = PathBuf::from(home).join(".docsite-kit");
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.toml"))
}

/// Load global config
fn load_config() -> Result<Option<GlobalConfig>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).context("Failed to read config file")?;
    let config: GlobalConfig = toml::from_str(&contents).context("Failed to parse config file")?;
    Ok(Some(config))
}

/// Save global config
fn save_config(config: &GlobalConfig) -> Result<()> {
    let path = config_path()?;
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, contents).context("Failed to write config file")?;
    println!("✅ Configuration saved to: {}", path.display());
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(message: &str) -> Result<bool> {
    let answer = prompt(message)?;
    Ok(matches!(answer.as_str(), "y" | "Y" | "yes"))
}

/// Interactively store the GitHub token and deploy branch.
pub async fn configure() -> Result<()> {
    println!("Configuring GitHub deployment");
    println!();
    println!("The token needs Contents read/write (to push the deploy branch)");
    println!("and Pages read (for status). Create one at:");
    println!("  https://github.com/settings/tokens");
    println!();

    let api_token = prompt("GitHub API token: ")?;
    if api_token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    let branch = prompt(&format!("Deploy branch [{}]: ", DEFAULT_BRANCH))?;
    let branch = if branch.is_empty() { None } else { Some(branch) };

    save_config(&GlobalConfig {
        github: GithubConfig { api_token, branch },
    })
}

/// Build the site and push it to the deploy branch on GitHub.
pub async fn publish(path: PathBuf, force: bool) -> Result<()> {
    let config = load_config()?
        .context("Not configured. Run 'docsite-kit deploy configure' first")?;

    println!("🔨 Building site for deployment...");
    let build_dir = TempDir::new().context("Failed to create build directory")?;
    let site = build_static_site(&path, build_dir.path())?;

    let files = collect_build_files(build_dir.path())?;

    println!();
    println!("Ready to deploy:");
    println!(
        "   Repository: {}/{}",
        site.meta.organization, site.meta.project
    );
    println!("   Branch: {}", config.github.branch());
    println!("   Files: {}", files.len());

    if !force && !confirm("\nContinue? [y/N] ")? {
        println!("Aborted.");
        return Ok(());
    }

    let deployer = GithubPagesDeployer::for_site(
        &site,
        &config.github.api_token,
        config.github.branch(),
        files,
    )?;

    println!("🚀 Publishing...");
    let result = deployer.deploy().await?;

    println!();
    println!("✅ Deployed commit {}", result.commit_sha);
    println!("   Site: {}", result.site_url);
    println!();
    println!("Note: GitHub Pages must be enabled for the '{}' branch", config.github.branch());
    println!("      (repository Settings -> Pages) on first deploy.");

    Ok(())
}

/// Show GitHub Pages status for the site's repository.
pub async fn status(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from("."));
    let site = parse_site_toml(path.join("site.toml")).context("Failed to parse site.toml")?;
    let config = load_config()?
        .context("Not configured. Run 'docsite-kit deploy configure' first")?;

    let client = GithubClient::new(
        &config.github.api_token,
        &site.meta.organization,
        &site.meta.project,
    )?;

    println!(
        "Deployment status for {}/{}",
        site.meta.organization, site.meta.project
    );

    match client.pages_info().await? {
        Some(info) => {
            if let Some(url) = &info.html_url {
                println!("   Site: {}", url);
            }
            if let Some(pages_status) = &info.status {
                println!("   Status: {}", pages_status);
            }
            if let Some(source) = &info.source {
                println!("   Branch: {}", source.branch);
            }
        }
        None => {
            println!("   GitHub Pages is not enabled for this repository.");
            println!("   Enable it under Settings -> Pages after the first publish.");
        }
    }

    Ok(())
}

/// Delete the deploy branch.
pub async fn teardown(path: PathBuf, force: bool) -> Result<()> {
    let site = parse_site_toml(path.join("site.toml")).context("Failed to parse site.toml")?;
    let config = load_config()?
        .context("Not configured. Run 'docsite-kit deploy configure' first")?;
    let branch = config.github.branch();

    println!(
        "This deletes branch '{}' from {}/{}",
        branch, site.meta.organization, site.meta.project
    );

    if !force && !confirm("Continue? [y/N] ")? {
        println!("Aborted.");
        return Ok(());
    }

    let client = GithubClient::new(
        &config.github.api_token,
        &site.meta.organization,
        &site.meta.project,
    )?;
    client.delete_branch(branch).await?;

    println!("✅ Branch '{}' deleted", branch);
    Ok(())
}

/// Collect the built tree as (repo-relative path, bytes) pairs.
fn collect_build_files(build_dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(build_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let rel = entry
            .path()
            .strip_prefix(build_dir)
            .expect("walked path under build dir");
        // Git tree paths always use forward slashes
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        files.push((rel, data));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_build_files_relative_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs/intro")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("docs/intro/index.html"), "intro").unwrap();

        let files = collect_build_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "docs/intro/index.html");
        assert_eq!(files[1].0, "index.html");
        assert_eq!(files[1].1, b"home");
    }

    #[test]
    fn test_github_config_branch_default() {
        let config = GithubConfig {
            api_token: "token".to_string(),
            branch: None,
        };
        assert_eq!(config.branch(), "gh-pages");

        let config = GithubConfig {
            api_token: "token".to_string(),
            branch: Some("deploy".to_string()),
        };
        assert_eq!(config.branch(), "deploy");
    }

    #[test]
    fn test_global_config_round_trips() {
        let config = GlobalConfig {
            github: GithubConfig {
                api_token: "ghp_example".to_string(),
                branch: Some("gh-pages".to_string()),
            },
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: GlobalConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.github.api_token, "ghp_example");
        assert_eq!(parsed.github.branch.as_deref(), Some("gh-pages"));
    }
}
