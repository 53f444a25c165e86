//! Verification email
//!
//! Builds the daily message, attaches the verification workbook when it is on
//! disk, and hands it to a [`Mailer`].

mod smtp;

pub use smtp::SmtpMailer;

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use tracing::{info, warn};

use crate::config::{non_empty, AdminConfig};
use crate::error::{AdminError, AdminResult};
use crate::pipeline::steps::display_date;
use crate::types::TaskResult;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Caller overrides. Absent or empty fields fall back to configuration and defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailRequest {
    pub to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A fully resolved message ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

/// Mail transport seam
pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> AdminResult<()>;
}

pub fn default_subject(today: NaiveDate) -> String {
    format!("Daily Verification NAUTIL - {}", display_date(today))
}

pub fn default_body(date: &str) -> String {
    format!(
        "<html><body>\
         <h2>Daily Verification NAUTIL</h2>\
         <p>Hello,</p>\
         <p>Please find attached the daily verification file \
         of the NAUTIL acceptance environment for <strong>{}</strong>.</p>\
         <br/>\
         <p>This report was generated automatically by NAUTIL Admin.</p>\
         <br/>\
         <p>Regards,<br/>NAUTIL Admin System</p>\
         </body></html>",
        date
    )
}

/// Send the verification workbook by email.
///
/// A missing workbook is only a warning: the message goes out without it.
/// A workbook that is there but cannot be read fails the send.
pub fn send_verification_email(
    config: &AdminConfig,
    mailer: &dyn Mailer,
    today: NaiveDate,
    request: &EmailRequest,
) -> TaskResult {
    TaskResult::capture("send_email", |result| {
        let date = display_date(today);
        let subject = non_empty(&request.subject)
            .map(str::to_string)
            .unwrap_or_else(|| default_subject(today));
        let html_body = non_empty(&request.body)
            .map(str::to_string)
            .unwrap_or_else(|| default_body(&date));
        let to = non_empty(&request.to)
            .unwrap_or(config.email.default_to.as_str())
            .to_string();
        let from = non_empty(&request.from)
            .unwrap_or(config.email.from.as_str())
            .to_string();

        let path = &config.excel.verification_file;
        let attachment = if path.exists() {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "verification.xlsx".to_string());
            let content = fs::read(path).map_err(|e| {
                result.log(format!("❌ Unable to read attachment {}: {}", filename, e));
                AdminError::Io(e)
            })?;
            result.log(format!("✅ Attachment: {}", filename));
            Some(Attachment {
                filename,
                content_type: XLSX_CONTENT_TYPE.to_string(),
                content,
            })
        } else {
            warn!(path = %path.display(), "verification file missing, sending without attachment");
            result.log(format!("⚠️ Excel file not found: {}", path.display()));
            None
        };

        let email = OutgoingEmail {
            from,
            to,
            subject,
            html_body,
            attachment,
        };

        if let Err(e) = mailer.send(&email) {
            result.log(format!("❌ Send failed: {}", e));
            return Err(e);
        }

        info!(to = %email.to, "verification email sent");
        result.log(format!("✅ Email sent to: {}", email.to));
        result.log(format!("   Subject: {}", email.subject));
        Ok(format!("Email sent to {}", email.to))
    })
}
