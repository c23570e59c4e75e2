use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Request body for `POST /audit`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRequest {
    pub url: String,
}

/// The four fixed score categories, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreCategory {
    Security,
    Seo,
    Performance,
    Accessibility,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 4] = [
        ScoreCategory::Security,
        ScoreCategory::Seo,
        ScoreCategory::Performance,
        ScoreCategory::Accessibility,
    ];

    /// Key inside `scores`
    pub fn key(self) -> &'static str {
        match self {
            ScoreCategory::Security => "security",
            ScoreCategory::Seo => "seo",
            ScoreCategory::Performance => "performance",
            ScoreCategory::Accessibility => "accessibility",
        }
    }

    /// Id of the badge on the results page
    pub fn badge_id(self) -> &'static str {
        match self {
            ScoreCategory::Security => "sec",
            ScoreCategory::Seo => "seo",
            ScoreCategory::Performance => "perf",
            ScoreCategory::Accessibility => "a11y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Security => "Security",
            ScoreCategory::Seo => "SEO",
            ScoreCategory::Performance => "Performance",
            ScoreCategory::Accessibility => "Accessibility",
        }
    }
}

/// Page statistics reported alongside the scores
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageInfo {
    pub title: Option<String>,
    pub description_len: Option<u64>,
    pub size_bytes: Option<u64>,
    pub resource_count: Option<u64>,
}

/// An audit report as returned by the service.
///
/// The raw JSON value is kept exactly as received; accessors read from it
/// leniently, so a missing or ill-typed field comes back empty instead of
/// failing the whole report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditReport(Value);

impl AuditReport {
    pub fn from_value(value: Value) -> Self {
        AuditReport(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// Score for one category; fractional values are truncated
    pub fn score(&self, category: ScoreCategory) -> Option<i64> {
        let value = self.0.get("scores")?.get(category.key())?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn recommendations(&self) -> Vec<String> {
        self.summary_list("recommendations")
    }

    pub fn passes(&self) -> Vec<String> {
        self.summary_list("passes")
    }

    pub fn issues(&self) -> Vec<String> {
        self.summary_list("issues")
    }

    /// The audited URL as normalized by the service
    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    /// HTTP status the audited page answered with
    pub fn status_code(&self) -> Option<u16> {
        self.0
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    pub fn page(&self) -> Option<PageInfo> {
        let page = self.0.get("page")?;
        serde_json::from_value(page.clone()).ok()
    }

    /// Pretty-printed JSON (2-space indent)
    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", self.0)
    }

    /// Writes the raw report to `path`
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_pretty_json();
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn summary_list(&self, key: &str) -> Vec<String> {
        let items = match self
            .0
            .get("summary")
            .and_then(|s| s.get(key))
            .and_then(Value::as_array)
        {
            Some(items) => items,
            None => return Vec::new(),
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect()
    }
}

impl From<Value> for AuditReport {
    fn from(value: Value) -> Self {
        AuditReport(value)
    }
}
