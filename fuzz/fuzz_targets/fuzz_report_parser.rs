#![no_main]
use libfuzzer_sys::fuzz_target;
use site_audit::{AuditReport, ReportRenderer, ReportView};

fuzz_target!(|data: &[u8]| {
    // Any JSON the service might send must render without panicking
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let report = AuditReport::from_value(value);
        let mut view = ReportView::new();
        ReportRenderer::render(report, &mut view);
        let _ = view.to_html_document();
    }
});
