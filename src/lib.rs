//! Client for a remote website audit service.
//!
//! [`AuditClient`] submits a URL with a fixed-interval retry that rides out
//! backend cold starts; [`ReportRenderer`] maps the returned report onto a
//! [`ReportView`]; [`AuditSession`] ties both together for one page.

pub mod client;
pub mod config;
pub mod output;
pub mod render;
pub mod report;
pub mod session;

pub use client::{AuditClient, AuditError, RetryPolicy, ServiceInfo};
pub use config::Config;
pub use render::{escape_html, ReportRenderer, ReportView, Severity};
pub use report::{AuditReport, AuditRequest, PageInfo, ScoreCategory};
pub use session::AuditSession;
