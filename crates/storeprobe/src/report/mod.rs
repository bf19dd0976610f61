//! Post-run reporting: summary reconstruction, email rendering and delivery.

pub mod attachments;
pub mod email;
pub mod summary;

pub use attachments::{collect_attachments, zip_dir, ReportAttachment};
pub use email::{EmailReport, Mailer};
pub use summary::{count_status_lines, RunSummary};
