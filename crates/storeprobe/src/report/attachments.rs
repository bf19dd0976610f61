//! Files attached to the report email.

use crate::error::PageResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// An in-memory file attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ReportAttachment {
    /// Read `path`, naming the attachment after its file name
    pub fn from_path(path: &Path) -> PageResult<Self> {
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().to_string());
        Ok(Self {
            filename,
            data: fs::read(path)?,
        })
    }
}

/// Gather `report.html` and a zip of `allure-results/` from `reports_dir`.
///
/// Anything missing or unreadable is skipped with a warning.
#[must_use]
pub fn collect_attachments(reports_dir: &Path) -> Vec<ReportAttachment> {
    let mut attachments = Vec::new();
    if !reports_dir.is_dir() {
        warn!("Reports directory not found: {}", reports_dir.display());
        return attachments;
    }

    let report = reports_dir.join("report.html");
    if report.is_file() {
        match ReportAttachment::from_path(&report) {
            Ok(attachment) => {
                info!("HTML report attached");
                attachments.push(attachment);
            }
            Err(e) => warn!("Could not attach report.html: {}", e),
        }
    }

    let results = reports_dir.join("allure-results");
    if results.is_dir() {
        let archive = reports_dir.join("allure-results.zip");
        match zip_dir(&results, &archive).and_then(|_| ReportAttachment::from_path(&archive)) {
            Ok(attachment) => {
                info!("Results archive attached");
                attachments.push(attachment);
            }
            Err(e) => warn!("Could not attach results archive: {}", e),
        }
    }

    attachments
}

/// Zip the contents of `dir` (relative paths) into `output`
pub fn zip_dir(dir: &Path, output: &Path) -> PageResult<usize> {
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();

    let mut zip = ZipWriter::new(File::create(output)?);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in &files {
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(path)?)?;
    }
    zip.finish()?;
    Ok(files.len())
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> PageResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
