use crate::client::{failure_message, AuditClient, AuditError};
use crate::render::{ReportRenderer, ReportView};
use crate::report::AuditReport;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// One audit page: the client, its display state and the displayed report.
///
/// `run` takes `&mut self`, so a session has at most one request in flight.
pub struct AuditSession {
    client: AuditClient,
    view: ReportView,
    completed_at: Option<DateTime<Utc>>,
}

impl AuditSession {
    pub fn new(client: AuditClient) -> Self {
        AuditSession {
            client,
            view: ReportView::new(),
            completed_at: None,
        }
    }

    pub fn client(&self) -> &AuditClient {
        &self.client
    }

    pub fn view(&self) -> &ReportView {
        &self.view
    }

    /// When the displayed report arrived
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Validates `input`, runs the audit and renders the result.
    ///
    /// Empty or whitespace-only input fails with [`AuditError::EmptyInput`]
    /// before any request is made. On failure the previous results stay
    /// hidden and nothing partial is rendered.
    pub async fn run(&mut self, input: &str) -> Result<&AuditReport, AuditError> {
        let target = input.trim();
        if target.is_empty() {
            return Err(AuditError::EmptyInput);
        }

        self.view.begin_request();
        info!(url = target, endpoint = %self.client.endpoint(), "submitting audit");
        let result = self.client.submit_audit(target).await;
        self.view.end_request();

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                error!(error = %err, "audit failed");
                return Err(err);
            }
        };

        self.completed_at = Some(Utc::now());
        Ok(ReportRenderer::render(report, &mut self.view))
    }

    /// User-facing message for a failed run
    pub fn failure_message(&self, err: &AuditError) -> String {
        match err {
            AuditError::EmptyInput => err.to_string(),
            _ => failure_message(&self.client.endpoint(), err),
        }
    }
}
