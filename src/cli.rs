use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{about-with-newline}

{usage-heading}
  {usage}

{tab}Commands:
{subcommands}

{tab}Global Options:
{options}

{after-help}
";

#[derive(Parser)]
#[command(name = "site-audit")]
#[command(version)]
#[command(about = "Audit a website for security, SEO, performance and accessibility")]
#[command(
    long_about = "site-audit submits a URL to a remote website audit service and renders\n\
    the returned scores and findings.\n\n\
    The service scales to zero when idle, so the first request after a quiet\n\
    period can take 10-30 seconds. Failed attempts are retried at a fixed\n\
    interval (default: 6 attempts, 4 s apart)."
)]
#[command(
    help_template = HELP_TEMPLATE,
    after_help = "Examples:\n\
    \n\
    Audit a site:\n\
      $ site-audit audit https://example.com\n\
    \n\
    Save the raw report as audit-report.json:\n\
      $ site-audit audit https://example.com --save\n\
    \n\
    Write an HTML page of the results:\n\
      $ site-audit audit https://example.com --format html --output report.html\n\
    \n\
    Check that the backend is up:\n\
      $ site-audit health"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    ///
    /// Default: <config dir>/site-audit/config.toml
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the audit service
    #[arg(long = "api", global = true, value_name = "URL")]
    pub api: Option<String>,

    /// Maximum number of attempts per audit
    #[arg(long = "attempts", global = true, value_name = "N")]
    pub attempts: Option<u32>,

    /// Delay between attempts in milliseconds
    #[arg(long = "delay-ms", global = true, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Verbose output
    ///
    /// Logs every attempt, including the retries.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a website
    ///
    /// Sends the URL to the audit service and shows scores, recommendations,
    /// passes and issues.
    ///
    /// Examples:
    ///   $ site-audit audit https://example.com
    ///   $ site-audit audit https://example.com --format json
    #[command(alias = "a")]
    Audit {
        /// URL to audit
        #[arg(value_name = "URL")]
        url: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write the rendered output to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Save the raw report as audit-report.json in DIR (default: current directory)
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
        save: Option<PathBuf>,

        /// Also print the raw JSON report (text format only)
        #[arg(long)]
        raw: bool,
    },

    /// Check that the audit service is reachable
    Health,

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Html,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Generate shell completion scripts
pub fn generate_completions(shell: &str, app: &mut clap::Command) {
    use clap_complete::{generate, shells};
    match shell {
        "zsh" => {
            generate(shells::Zsh, app, "site-audit", &mut std::io::stdout());
        }
        "fish" => {
            generate(shells::Fish, app, "site-audit", &mut std::io::stdout());
        }
        "bash" => {
            generate(shells::Bash, app, "site-audit", &mut std::io::stdout());
        }
        "powershell" => {
            generate(shells::PowerShell, app, "site-audit", &mut std::io::stdout());
        }
        _ => {
            eprintln!("Unsupported shell: {}", shell);
            eprintln!("Supported shells: zsh, fish, bash, powershell");
        }
    }
}
