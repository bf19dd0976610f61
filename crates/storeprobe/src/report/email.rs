//! Summary email rendering and SMTP delivery.

use crate::config::EmailConfig;
use crate::error::{PageResult, StoreProbeError};
use crate::report::attachments::ReportAttachment;
use crate::report::summary::RunSummary;
use crate::suite::reporter::escape_html;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

/// Rendered view of a [`RunSummary`]
#[derive(Debug, Clone)]
pub struct EmailReport {
    summary: RunSummary,
}

impl EmailReport {
    #[must_use]
    pub const fn new(summary: RunSummary) -> Self {
        Self { summary }
    }

    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// `[PASS]` when anything passed, `[FAIL]` otherwise
    #[must_use]
    pub fn subject(&self) -> String {
        let status = if self.summary.passed > 0 { "PASS" } else { "FAIL" };
        format!(
            "[{}] Test Report - {}",
            status,
            self.summary.generated_at.format("%Y-%m-%d %H:%M")
        )
    }

    /// HTML body: result counts, pass rate and session configuration
    #[must_use]
    pub fn html_body(&self) -> String {
        let s = &self.summary;
        let mut html = String::new();

        html.push_str(
            r#"<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; background-color: #f5f5f5; }
        .container { max-width: 800px; margin: 0 auto; background-color: white; padding: 20px; border-radius: 8px; }
        h1 { color: #333; border-bottom: 3px solid #007bff; padding-bottom: 10px; }
        table { border-collapse: collapse; margin: 20px 0; }
        td, th { padding: 8px 16px; text-align: left; border-bottom: 1px solid #ddd; }
        .passed { color: #28a745; font-weight: bold; }
        .failed { color: #dc3545; font-weight: bold; }
        .skipped { color: #ffc107; font-weight: bold; }
        .footer { color: #666; font-size: 12px; margin-top: 30px; }
    </style>
</head>
<body>
<div class="container">
    <h1>Automated Test Report</h1>
"#,
        );

        html.push_str(&format!(
            r#"    <h2>Summary</h2>
    <table>
        <tr><th>Passed</th><td class="passed">{}</td></tr>
        <tr><th>Failed</th><td class="failed">{}</td></tr>
        <tr><th>Skipped</th><td class="skipped">{}</td></tr>
        <tr><th>Pass rate</th><td>{:.1}%</td></tr>
    </table>
"#,
            s.passed,
            s.failed,
            s.skipped,
            s.pass_rate()
        ));

        html.push_str(&format!(
            r#"    <h2>Configuration</h2>
    <table>
        <tr><th>Browser</th><td>{}</td></tr>
        <tr><th>Headless</th><td>{}</td></tr>
        <tr><th>Base URL</th><td>{}</td></tr>
        <tr><th>Date/Time</th><td>{}</td></tr>
    </table>
"#,
            escape_html(&s.browser),
            if s.headless { "Yes" } else { "No" },
            escape_html(&s.base_url),
            s.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        html.push_str(
            r#"    <p>See the attached reports for details.</p>
    <div class="footer">This message was generated automatically by the storefront test suite.</div>
</div>
</body>
</html>
"#,
        );
        html
    }
}

/// Sends report emails over authenticated STARTTLS SMTP
#[derive(Debug, Clone)]
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Assemble the MIME message without sending it
    pub fn build_message(
        &self,
        report: &EmailReport,
        recipients: &[String],
        attachments: &[ReportAttachment],
    ) -> PageResult<Message> {
        if recipients.is_empty() {
            return Err(email_error("no recipients"));
        }

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.sender)?)
            .subject(report.subject())
            .date_now();
        for recipient in recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let octet_stream = ContentType::parse("application/octet-stream")
            .map_err(|e| email_error(e.to_string()))?;
        let mut body = MultiPart::mixed().singlepart(SinglePart::html(report.html_body()));
        for attachment in attachments {
            body = body.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), octet_stream.clone()),
            );
        }

        builder
            .multipart(body)
            .map_err(|e| email_error(e.to_string()))
    }

    /// Build and send the report to `recipients`
    pub fn send(
        &self,
        report: &EmailReport,
        recipients: &[String],
        attachments: &[ReportAttachment],
    ) -> PageResult<()> {
        info!("Preparing email for: {}", recipients.join(", "));
        let message = self.build_message(report, recipients, attachments)?;

        let transport = SmtpTransport::starttls_relay(&self.config.smtp_server)
            .map_err(|e| email_error(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.sender.clone(),
                self.config.password.clone(),
            ))
            .build();

        transport
            .send(&message)
            .map_err(|e| {
                email_error(format!("SMTP delivery to {}: {e}", self.config.smtp_server))
            })?;
        info!("Email sent to {} recipient(s)", recipients.len());
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> PageResult<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| email_error(format!("invalid address {address:?}: {e}")))
}

fn email_error(message: impl Into<String>) -> StoreProbeError {
    StoreProbeError::Email {
        message: message.into(),
    }
}
