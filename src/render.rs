//! Report rendering against an explicit display state.
//!
//! [`ReportView`] holds everything the results page shows: score badges,
//! the escaped list fragments, the raw JSON and the state of the controls.
//! [`ReportRenderer`] fills it from an [`AuditReport`].

use crate::config::DEFAULT_REPORT_FILE;
use crate::report::{AuditReport, ScoreCategory};
use anyhow::{bail, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Severity class of a score badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Ok,
    Bad,
}

impl Severity {
    /// `good` from 80, `ok` from 50, `bad` below
    pub fn from_score(score: i64) -> Self {
        if score >= 80 {
            Severity::Good
        } else if score >= 50 {
            Severity::Ok
        } else {
            Severity::Bad
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Ok => "ok",
            Severity::Bad => "bad",
        }
    }
}

/// Escapes `& < > ' "` for insertion into HTML
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBadge {
    pub category: ScoreCategory,
    pub value: Option<i64>,
    pub severity: Option<Severity>,
}

impl ScoreBadge {
    fn empty(category: ScoreCategory) -> Self {
        ScoreBadge {
            category,
            value: None,
            severity: None,
        }
    }

    /// Class attribute of the badge, e.g. `score good`
    pub fn class_name(&self) -> String {
        match self.severity {
            Some(severity) => format!("score {}", severity.css_class()),
            None => "score".to_string(),
        }
    }

    pub fn text(&self) -> String {
        self.value.map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Display state of the audit page
#[derive(Debug, Clone)]
pub struct ReportView {
    pub scores: Vec<ScoreBadge>,
    pub recommendations_html: String,
    pub passes_html: String,
    pub issues_html: String,
    pub raw_json: String,
    pub results_visible: bool,
    pub spinner_visible: bool,
    /// Run control disabled while a request is in flight
    pub busy: bool,
    pub download_enabled: bool,
    report: Option<AuditReport>,
}

impl Default for ReportView {
    fn default() -> Self {
        ReportView {
            scores: ScoreCategory::ALL.iter().map(|c| ScoreBadge::empty(*c)).collect(),
            recommendations_html: String::new(),
            passes_html: String::new(),
            issues_html: String::new(),
            raw_json: String::new(),
            results_visible: false,
            spinner_visible: false,
            busy: false,
            download_enabled: false,
            report: None,
        }
    }
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn badge(&self, category: ScoreCategory) -> Option<&ScoreBadge> {
        self.scores.iter().find(|b| b.category == category)
    }

    /// Report currently on display
    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    /// Enter the in-flight state: control disabled, results hidden, spinner on
    pub fn begin_request(&mut self) {
        self.busy = true;
        self.download_enabled = false;
        self.results_visible = false;
        self.spinner_visible = true;
    }

    /// Leave the in-flight state, whatever the outcome
    pub fn end_request(&mut self) {
        self.spinner_visible = false;
        self.busy = false;
    }

    /// Writes the displayed report to `<dir>/audit-report.json`
    pub fn download(&self, dir: &Path) -> Result<PathBuf> {
        self.download_as(&dir.join(DEFAULT_REPORT_FILE))
    }

    /// Writes the displayed report to `path`
    pub fn download_as(&self, path: &Path) -> Result<PathBuf> {
        let report = match (&self.report, self.download_enabled) {
            (Some(report), true) => report,
            _ => bail!("No report available for download"),
        };
        report.save_json(path)?;
        Ok(path.to_path_buf())
    }

    /// Standalone HTML page with the rendered results
    pub fn to_html_document(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Website Audit Report</title>\n<style>\n");
        html.push_str(STYLE);
        html.push_str("</style>\n</head>\n<body>\n");

        if let Some(url) = self.report.as_ref().and_then(|r| r.url()) {
            let _ = writeln!(html, "<h1>Audit of {}</h1>", escape_html(url));
        } else {
            html.push_str("<h1>Website Audit Report</h1>\n");
        }

        html.push_str("<section id=\"results\">\n<div class=\"scores\">\n");
        for badge in &self.scores {
            let _ = writeln!(
                html,
                "<div class=\"card\"><span class=\"label\">{}</span><span id=\"{}\" class=\"{}\">{}</span></div>",
                badge.category.label(),
                badge.category.badge_id(),
                badge.class_name(),
                badge.text()
            );
        }
        html.push_str("</div>\n");

        let _ = writeln!(html, "<h2>Recommendations</h2>\n<ol id=\"recs\">{}</ol>", self.recommendations_html);
        let _ = writeln!(html, "<h2>Passes</h2>\n<div id=\"passes\">{}</div>", self.passes_html);
        let _ = writeln!(html, "<h2>Issues</h2>\n<div id=\"issues\">{}</div>", self.issues_html);
        let _ = writeln!(
            html,
            "<h2>Raw report</h2>\n<pre id=\"raw\">{}</pre>",
            escape_html(&self.raw_json)
        );
        html.push_str("</section>\n</body>\n</html>\n");
        html
    }
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; }
.scores { display: flex; gap: 1rem; }
.card { border: 1px solid #ddd; border-radius: 8px; padding: 1rem; }
.label { display: block; font-size: .85rem; color: #555; }
.score { font-size: 2rem; font-weight: 700; }
.good { color: #15803d; }
.ok { color: #b45309; }
.bad { color: #b91c1c; }
.chip { display: inline-block; padding: .2rem .6rem; border-radius: 999px; background: #eef; }
pre { background: #f6f8fa; padding: 1rem; overflow: auto; }
";

/// Maps a report onto a [`ReportView`]
pub struct ReportRenderer;

impl ReportRenderer {
    /// Renders `report` and makes it the displayed report
    pub fn render(report: AuditReport, view: &mut ReportView) -> &AuditReport {
        view.results_visible = true;
        view.scores = ScoreCategory::ALL
            .iter()
            .map(|&category| {
                let value = report.score(category);
                ScoreBadge {
                    category,
                    value,
                    severity: value.map(Severity::from_score),
                }
            })
            .collect();

        view.recommendations_html = report
            .recommendations()
            .iter()
            .map(|x| format!("<li>{}</li>", escape_html(x)))
            .collect::<String>();
        view.passes_html = chips(&report.passes());
        view.issues_html = chips(&report.issues());
        view.raw_json = report.to_pretty_json();

        view.download_enabled = true;
        view.report.insert(report)
    }
}

fn chips(items: &[String]) -> String {
    items
        .iter()
        .map(|x| format!("<span class=\"chip\">{}</span>", escape_html(x)))
        .collect::<Vec<_>>()
        .join(" ")
}
