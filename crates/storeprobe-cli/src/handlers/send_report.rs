//! `storeprobe send-report`

use crate::commands::SendReportArgs;
use crate::error::CliResult;
use crate::logging;
use storeprobe::{collect_attachments, EmailConfig, EmailReport, Mailer, RunSummary, SessionConfig};
use tracing::{error, info};

/// Whether the email step should run at all
#[must_use]
pub fn should_send(email: &EmailConfig) -> bool {
    email.enabled && !email.recipients.is_empty()
}

/// Summarize the reports directory and mail it.
///
/// A disabled email step or an empty recipient list is a successful no-op.
pub fn execute_send_report(args: &SendReportArgs, level: &str) -> CliResult<()> {
    logging::init(level, None)?;

    let email = EmailConfig::from_env();
    info!("Sending test report by email");
    info!("Send email: {}", email.enabled);
    info!("Recipients: {}", email.recipients.join(", "));
    if !should_send(&email) {
        info!("Email sending disabled, skipping");
        return Ok(());
    }

    let config = SessionConfig::from_env()?;
    let reports_dir = args
        .reports_dir
        .clone()
        .unwrap_or_else(|| config.reports_dir.clone());

    let summary = RunSummary::from_reports_dir(&reports_dir, &config);
    let attachments = collect_attachments(&reports_dir);
    let report = EmailReport::new(summary);

    if let Err(e) = Mailer::new(email.clone()).send(&report, &email.recipients, &attachments) {
        error!("Could not send the report: {}", e);
        error!("Check SENDER_EMAIL and SENDER_PASSWORD (an application password)");
        return Err(e.into());
    }
    info!("Report sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(send: &str, recipients: &str) -> EmailConfig {
        let (send, recipients) = (send.to_string(), recipients.to_string());
        EmailConfig::from_lookup(move |key| match key {
            "SEND_EMAIL" => Some(send.clone()),
            "EMAIL_RECIPIENTS" => Some(recipients.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_should_send() {
        assert!(should_send(&email("true", "qa@shop.test")));
        assert!(should_send(&email("TRUE", "qa@shop.test, dev@shop.test")));
        assert!(!should_send(&email("false", "qa@shop.test")));
        assert!(!should_send(&email("true", " , ")));
    }
}
