//! SMTP transport backed by lettre

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{Mailer, OutgoingEmail};
use crate::config::SmtpSettings;
use crate::error::{AdminError, AdminResult};

pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> AdminResult<Self> {
        let builder = if settings.starttls {
            SmtpTransport::starttls_relay(&settings.host)
                .map_err(|e| AdminError::MailTransport(e.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(&settings.host)
        };

        let mut builder = builder.port(settings.port);
        if let (Some(user), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &OutgoingEmail) -> AdminResult<()> {
        let message = build_message(email)?;
        self.transport
            .send(&message)
            .map_err(|e| AdminError::MailTransport(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> AdminResult<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| AdminError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Build the multipart MIME message: HTML body, then the optional workbook.
pub(crate) fn build_message(email: &OutgoingEmail) -> AdminResult<Message> {
    let html = SinglePart::html(email.html_body.clone());
    let parts = match &email.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| AdminError::MailTransport(e.to_string()))?;
            MultiPart::mixed().singlepart(html).singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            )
        }
        None => MultiPart::mixed().singlepart(html),
    };

    Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone())
        .multipart(parts)
        .map_err(|e| AdminError::MailTransport(e.to_string()))
}
