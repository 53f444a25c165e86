//! Notifier and run-complete tests with a recording mailer

mod common;

use common::{book, empty_sheet, today, Fixture, RecordingMailer, RENAMED_NAME, VERIFICATION_NAME};
use nautil_admin::mail::{default_body, send_verification_email, EmailRequest, XLSX_CONTENT_TYPE};
use nautil_admin::pipeline;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════════
// SEND EMAIL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_send_uses_configured_defaults_and_attaches_file() {
    let fx = Fixture::new();
    let mailer = RecordingMailer::default();

    let result = send_verification_email(&fx.config, &mailer, today(), &EmailRequest::default());
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Email sent to team@example.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.from, "robot@example.com");
    assert_eq!(email.to, "team@example.com");
    assert_eq!(email.subject, "Daily Verification NAUTIL - 15/06/2024");
    assert_eq!(email.html_body, default_body("15/06/2024"));
    assert!(email.html_body.contains("<strong>15/06/2024</strong>"));

    let attachment = email.attachment.as_ref().expect("attachment");
    assert_eq!(attachment.filename, VERIFICATION_NAME);
    assert_eq!(attachment.content_type, XLSX_CONTENT_TYPE);
    assert_eq!(
        attachment.content,
        std::fs::read(&fx.config.excel.verification_file).unwrap()
    );
    assert_eq!(
        result.logs,
        vec![
            format!("✅ Attachment: {}", VERIFICATION_NAME),
            "✅ Email sent to: team@example.com".to_string(),
            "   Subject: Daily Verification NAUTIL - 15/06/2024".to_string(),
        ]
    );
}

#[test]
fn test_send_applies_overrides_and_ignores_empty_values() {
    let fx = Fixture::new();
    let mailer = RecordingMailer::default();
    let request = EmailRequest {
        to: Some("boss@example.com".to_string()),
        from: Some(String::new()),
        subject: Some("Custom".to_string()),
        body: Some(String::new()),
    };

    let result = send_verification_email(&fx.config, &mailer, today(), &request);
    assert!(result.success);

    let email = &mailer.sent()[0];
    assert_eq!(email.to, "boss@example.com");
    assert_eq!(email.from, "robot@example.com");
    assert_eq!(email.subject, "Custom");
    assert_eq!(email.html_body, default_body("15/06/2024"));
}

#[test]
fn test_send_without_workbook_still_sends() {
    let mut fx = Fixture::new();
    fx.config.excel.verification_file = fx.path("absent.xlsx");
    let mailer = RecordingMailer::default();

    let result = send_verification_email(&fx.config, &mailer, today(), &EmailRequest::default());
    assert!(result.success);
    assert!(result.logs[0].starts_with("⚠️ Excel file not found"));
    assert!(mailer.sent()[0].attachment.is_none());
}

#[test]
fn test_send_unreadable_workbook_fails_with_log() {
    let mut fx = Fixture::new();
    let folder = fx.path("folder.xlsx");
    std::fs::create_dir(&folder).unwrap();
    fx.config.excel.verification_file = folder;
    let mailer = RecordingMailer::default();

    let result = send_verification_email(&fx.config, &mailer, today(), &EmailRequest::default());
    assert!(!result.success);
    assert!(result.message.starts_with("IO error"), "{}", result.message);
    assert_eq!(result.logs.len(), 1);
    assert!(result.logs[0].starts_with("❌ Unable to read attachment folder.xlsx"));
    assert!(mailer.sent().is_empty());
}

#[test]
fn test_send_transport_failure_is_reported() {
    let fx = Fixture::new();
    let mailer = RecordingMailer::failing("connection refused");

    let result = send_verification_email(&fx.config, &mailer, today(), &EmailRequest::default());
    assert!(!result.success);
    assert_eq!(result.message, "Mail transport error: connection refused");
    assert_eq!(
        result.logs.last().unwrap(),
        "❌ Send failed: Mail transport error: connection refused"
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN COMPLETE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_complete_sends_renamed_file() {
    let mut fx = Fixture::new();
    let mailer = RecordingMailer::default();

    let result = pipeline::run_complete(
        &mut fx.config,
        &mailer,
        today(),
        Some("ops@example.com".to_string()),
        None,
    );

    assert!(result.success, "{:?}", result.logs);
    assert_eq!(result.message, "Complete workflow finished successfully");
    assert!(result.logs.contains(&"=== STEP 6 : Send email ===".to_string()));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
    assert_eq!(sent[0].subject, "Daily Verification NAUTIL - 15/06/2024");
    assert_eq!(sent[0].attachment.as_ref().unwrap().filename, RENAMED_NAME);
}

#[test]
fn test_run_complete_skips_email_when_pipeline_fails() {
    let wb = book(&[("TX3", empty_sheet)]);
    let mut fx = Fixture::with_verification(VERIFICATION_NAME, wb);
    let mailer = RecordingMailer::failing("must not be called");

    let result = pipeline::run_complete(&mut fx.config, &mailer, today(), None, None);

    assert!(!result.success);
    assert!(
        result.message.starts_with("Excel processing error: Step 2 failed"),
        "{}",
        result.message
    );
    assert!(!result.message.contains("email"));
    assert!(!result.logs.iter().any(|l| l.contains("STEP 6")));
}

#[test]
fn test_run_complete_reports_email_failure() {
    let mut fx = Fixture::new();
    let mailer = RecordingMailer::failing("timeout");

    let result = pipeline::run_complete(
        &mut fx.config,
        &mailer,
        today(),
        None,
        Some("Subject override".to_string()),
    );

    assert!(!result.success);
    assert_eq!(
        result.message,
        "Excel OK, but email error: Mail transport error: timeout"
    );
    assert!(result.logs.iter().any(|l| l.contains("STEP 5")));
}
