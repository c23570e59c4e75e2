use crate::render::{ReportView, Severity};
use crate::report::AuditReport;
use crate::client::ServiceInfo;
use atty::Stream;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Formatted terminal output for site-audit
pub struct Output;

impl Output {
    /// Check if colors should be enabled
    pub(crate) fn colors_enabled() -> bool {
        atty::is(Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    /// Disable colors if terminal doesn't support them
    fn disable_colors_if_needed() {
        if !Self::colors_enabled() {
            colored::control::set_override(false);
        }
    }

    /// Initialize output system (call at startup)
    pub fn init() {
        Self::disable_colors_if_needed();
    }

    /// Show a success message
    pub fn success(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "✓".green().bold(), msg.green());
        } else {
            println!("✓ {}", msg);
        }
    }

    /// Show an error message
    pub fn error(msg: &str) {
        if Self::colors_enabled() {
            eprintln!("{} {}", "✗".red().bold(), msg.red());
        } else {
            eprintln!("✗ {}", msg);
        }
    }

    /// Show a warning message
    pub fn warning(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "⚠".yellow().bold(), msg.yellow());
        } else {
            println!("⚠ {}", msg);
        }
    }

    /// Show an info message
    pub fn info(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "ℹ".cyan().bold(), msg.cyan());
        } else {
            println!("ℹ {}", msg);
        }
    }

    /// Show a heading
    pub fn heading(msg: &str) {
        if Self::colors_enabled() {
            println!("\n{}", msg.bold().bright_blue());
        } else {
            println!("\n{}", msg);
        }
    }

    /// Show a section header
    pub fn section(msg: &str) {
        if Self::colors_enabled() {
            println!("\n{}", msg.bold());
        } else {
            println!("\n{}", msg);
        }
    }

    /// Show a list item
    pub fn list_item(item: &str) {
        if Self::colors_enabled() {
            println!("  {} {}", "•".cyan(), item);
        } else {
            println!("  • {}", item);
        }
    }

    /// Show a numbered list item
    pub fn numbered_item(n: usize, item: &str) {
        if Self::colors_enabled() {
            println!("  {} {}", format!("{}.", n).cyan(), item);
        } else {
            println!("  {}. {}", n, item);
        }
    }

    /// Create a table for displaying data
    pub fn table() -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        // Make table responsive to terminal width
        if let Some((_width, _)) = term_size::dimensions() {
            table.set_content_arrangement(ContentArrangement::Dynamic);
        }
        table
    }

    /// Spinner shown while an audit is in flight
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();

        let template = if Self::colors_enabled() {
            "{spinner:.green} [{elapsed_precise}] {msg}"
        } else {
            "[{elapsed_precise}] {msg}"
        };

        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Show the score badges in a table
    pub fn score_table(view: &ReportView) {
        let mut table = Self::table();
        table.set_header(vec!["Category", "Score", "Rating"]);

        for badge in &view.scores {
            let rating = badge.severity.map(|s| s.css_class()).unwrap_or("-");
            let score_cell = match (badge.severity, Self::colors_enabled()) {
                (Some(severity), true) => Cell::new(badge.text()).fg(severity_color(severity)),
                _ => Cell::new(badge.text()),
            };
            table.add_row(vec![
                Cell::new(badge.category.label()),
                score_cell,
                Cell::new(rating),
            ]);
        }

        println!("{}", table);
    }

    /// Show a rendered report
    pub fn report(view: &ReportView, show_raw: bool) {
        let report = match view.report() {
            Some(report) => report,
            None => {
                Self::warning("No report to display");
                return;
            }
        };

        match report.url() {
            Some(url) => Self::heading(&format!("🔎 Audit of {}", url)),
            None => Self::heading("🔎 Audit report"),
        }
        Self::page_summary(report);
        Self::score_table(view);

        let recommendations = report.recommendations();
        if !recommendations.is_empty() {
            Self::section("Recommendations");
            for (i, rec) in recommendations.iter().enumerate() {
                Self::numbered_item(i + 1, rec);
            }
        }

        let passes = report.passes();
        if !passes.is_empty() {
            Self::section("Passes");
            for pass in &passes {
                Self::check_item(true, pass);
            }
        }

        let issues = report.issues();
        if !issues.is_empty() {
            Self::section("Issues");
            for issue in &issues {
                Self::check_item(false, issue);
            }
        }

        if show_raw {
            Self::section("Raw report");
            println!("{}", view.raw_json);
        }
    }

    fn page_summary(report: &AuditReport) {
        if let Some(status) = report.status_code() {
            Self::list_item(&format!("HTTP status: {}", status));
        }
        if let Some(page) = report.page() {
            if let Some(title) = page.title.filter(|t| !t.is_empty()) {
                Self::list_item(&format!("Title: {}", title));
            }
            if let Some(size) = page.size_bytes {
                Self::list_item(&format!("Page size: {}", format_size(size)));
            }
            if let Some(count) = page.resource_count {
                Self::list_item(&format!("Resources: {}", count));
            }
        }
    }

    fn check_item(passed: bool, item: &str) {
        match (passed, Self::colors_enabled()) {
            (true, true) => println!("  {} {}", "✓".green(), item),
            (false, true) => println!("  {} {}", "✗".red(), item),
            (true, false) => println!("  ✓ {}", item),
            (false, false) => println!("  ✗ {}", item),
        }
    }

    /// Show the service's health response
    pub fn service_info(endpoint: &str, info: &ServiceInfo) {
        if info.ok {
            Self::success(&format!("{} is up", endpoint));
        } else {
            Self::warning(&format!("{} answered but did not report ok", endpoint));
        }
        if let Some(service) = &info.service {
            Self::list_item(&format!("Service: {}", service));
        }
        if let Some(docs) = &info.docs {
            Self::list_item(&format!("Docs: {}", docs));
        }
        if let Some(usage) = &info.try_audit {
            Self::list_item(&format!("Usage: {}", usage));
        }
    }

    /// Show a URL
    pub fn url(url: &str) {
        if Self::colors_enabled() {
            println!("  {} {}", "🔗".blue(), url.dimmed());
        } else {
            println!("  🔗 {}", url);
        }
    }
}

fn severity_color(severity: Severity) -> comfy_table::Color {
    match severity {
        Severity::Good => comfy_table::Color::Green,
        Severity::Ok => comfy_table::Color::Yellow,
        Severity::Bad => comfy_table::Color::Red,
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.1} {}", size, UNITS[unit_idx])
    }
}
