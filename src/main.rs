mod cli;

use anyhow::Context;
use clap::CommandFactory;
use cli::{Commands, Format};
use site_audit::client::failure_message;
use site_audit::config::Config;
use site_audit::output::Output;
use site_audit::{AuditClient, AuditError, AuditSession};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize output system
    Output::init();

    // Check for completion generation request
    if let Ok(shell) = std::env::var("SITE_AUDIT_GENERATE_COMPLETIONS") {
        let mut app = cli::Cli::command();
        cli::generate_completions(&shell, &mut app);
        return Ok(());
    }

    let opts = cli::parse();
    init_tracing(opts.verbose);

    // Load configuration, flags win over the file
    let mut config = Config::load(opts.config.as_deref())?;
    if let Some(api) = &opts.api {
        config.api.base_url = api.trim_end_matches('/').to_string();
    }
    if let Some(attempts) = opts.attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(delay_ms) = opts.delay_ms {
        config.retry.delay_ms = delay_ms;
    }

    match &opts.command {
        Commands::Audit { url, format, output, save, raw } => {
            cmd_audit(&config, url, *format, output.as_deref(), save.as_deref(), *raw).await?;
        }
        Commands::Health => {
            cmd_health(&config).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn cmd_audit(
    config: &Config,
    url: &str,
    format: Format,
    output: Option<&Path>,
    save: Option<&Path>,
    raw: bool,
) -> anyhow::Result<()> {
    if format == Format::Text && output.is_some() {
        anyhow::bail!("--output needs --format json or --format html");
    }

    let client = AuditClient::from_config(config)?;
    let mut session = AuditSession::new(client);

    if url.trim().is_empty() {
        Output::error(&session.failure_message(&AuditError::EmptyInput));
        anyhow::bail!("no URL given");
    }

    let spinner = Output::spinner(&format!("Auditing {} ...", url.trim()));
    let result = session.run(url).await.map(|_| ());
    spinner.finish_and_clear();

    if let Err(err) = result {
        Output::error(&session.failure_message(&err));
        return Err(anyhow::anyhow!("audit failed"));
    }

    let view = session.view();
    match (format, output) {
        (Format::Text, _) => {
            Output::report(view, raw);
            if let Some(at) = session.completed_at() {
                Output::info(&format!("Completed {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
            }
        }
        (Format::Json, None) => println!("{}", view.raw_json),
        (Format::Json, Some(path)) => {
            std::fs::write(path, &view.raw_json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Output::success(&format!("Report written to {}", path.display()));
        }
        (Format::Html, None) => print!("{}", view.to_html_document()),
        (Format::Html, Some(path)) => {
            std::fs::write(path, view.to_html_document())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Output::success(&format!("HTML report written to {}", path.display()));
        }
    }

    if let Some(dir) = save {
        let target: PathBuf = dir.join(&config.output.report_file);
        let written = view.download_as(&target)?;
        Output::success(&format!("Saved {}", written.display()));
    }

    Ok(())
}

async fn cmd_health(config: &Config) -> anyhow::Result<()> {
    let client = AuditClient::from_config(config)?;
    Output::heading("🩺 Checking audit service");
    Output::url(client.base_url());

    match client.health().await {
        Ok(info) => {
            Output::service_info(client.base_url(), &info);
            Ok(())
        }
        Err(err) => {
            Output::error(&failure_message(client.base_url(), &err));
            Err(anyhow::anyhow!("health check failed"))
        }
    }
}
