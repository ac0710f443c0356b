mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docsite-kit")]
#[command(version, about = "Static site generator for documentation and blog sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize new site directory
    Init {
        /// Path to create site directory
        path: PathBuf,

        /// Site title
        #[arg(long)]
        title: Option<String>,

        /// Site tagline
        #[arg(long)]
        tagline: Option<String>,
    },

    /// Validate site configuration and content
    Validate {
        /// Path to site directory
        path: PathBuf,
    },

    /// Preview site locally with hot reload
    Preview {
        /// Path to site directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Build site without deploying
    Build {
        /// Path to site directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Deploy site to hosting platform
    Deploy {
        #[command(subcommand)]
        command: DeployCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
enum DeployCommand {
    /// Configure GitHub credentials and deploy branch
    ///
    /// Required token permissions (fine-grained):
    ///   Contents: Read and write
    ///   Pages: Read
    ///
    /// Create token at: https://github.com/settings/tokens
    Configure,

    /// Publish site to GitHub Pages
    Publish {
        /// Path to site directory
        path: PathBuf,

        /// Skip confirmation prompts
        #[arg(long)]
        force: bool,
    },

    /// Show deployment status and info
    Status {
        /// Path to site directory (optional - scans current dir)
        path: Option<PathBuf>,
    },

    /// Delete the deploy branch from GitHub
    Teardown {
        /// Path to site directory
        path: PathBuf,

        /// Skip confirmation prompt (dangerous!)
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { path, title, tagline } => commands::init::run(path, title, tagline).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Deploy { command } => match command {
            DeployCommand::Configure => commands::deploy::configure().await,
            DeployCommand::Publish { path, force } => {
                commands::deploy::publish(path, force).await
            }
            DeployCommand::Status { path } => commands::deploy::status(path).await,
            DeployCommand::Teardown { path, force } => {
                commands::deploy::teardown(path, force).await
            }
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "docsite-kit", &mut io::stdout());
            Ok(())
        }
    }
}
