//! Machine-readable results directory.
//!
//! One `<uuid>-result.json` file per scenario in the allure result layout,
//! with screenshot and video attachments copied next to it as
//! `<uuid>-attachment.<ext>`.

use crate::config::SessionConfig;
use crate::error::PageResult;
use crate::suite::reporter::TestRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Result file name suffix
pub const RESULT_SUFFIX: &str = "-result.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultFile<'a> {
    uuid: String,
    history_id: &'a str,
    name: &'a str,
    full_name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_details: Option<StatusDetails<'a>>,
    stage: &'static str,
    start: i64,
    stop: i64,
    labels: Vec<NameValue>,
    parameters: Vec<NameValue>,
    attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
struct StatusDetails<'a> {
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct NameValue {
    name: String,
    value: String,
}

impl NameValue {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Attachment {
    name: &'static str,
    source: String,
    #[serde(rename = "type")]
    mime: &'static str,
}

/// Writes one JSON document per scenario into the results directory
#[derive(Debug, Clone)]
pub struct ResultsWriter {
    dir: PathBuf,
    parameters: Vec<(String, String)>,
}

impl ResultsWriter {
    /// Target `dir`, tagging every result with the session parameters
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, config: &SessionConfig) -> Self {
        Self {
            dir: dir.into(),
            parameters: vec![
                ("browser".to_string(), config.browser.to_string()),
                ("headless".to_string(), config.headless.to_string()),
                ("base_url".to_string(), config.base_url.clone()),
            ],
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `record`, returning the path of the result file
    pub fn write(&self, record: &TestRecord) -> PageResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let uuid = Uuid::new_v4().to_string();

        let mut attachments = Vec::new();
        for (name, path, mime) in [
            ("screenshot", &record.screenshot, "image/png"),
            ("video", &record.video, "video/x-msvideo"),
        ] {
            let Some(path) = path else { continue };
            match self.copy_attachment(&uuid, path) {
                Ok(source) => attachments.push(Attachment { name, source, mime }),
                Err(e) => warn!("Could not attach {} {}: {}", name, path.display(), e),
            }
        }

        let mut labels = vec![NameValue::new("suite", "storefront")];
        labels.extend(record.tags.iter().map(|t| NameValue::new("tag", t.as_str())));

        let doc = ResultFile {
            uuid: uuid.clone(),
            history_id: &record.name,
            name: &record.name,
            full_name: format!("storefront.{}", record.name),
            status: record.status.as_str(),
            status_details: record
                .error
                .as_deref()
                .map(|message| StatusDetails { message }),
            stage: "finished",
            start: record.started_at.timestamp_millis(),
            stop: record.finished_at().timestamp_millis(),
            labels,
            parameters: self
                .parameters
                .iter()
                .map(|(k, v)| NameValue::new(k, v.as_str()))
                .collect(),
            attachments,
        };

        let path = self.dir.join(format!("{uuid}{RESULT_SUFFIX}"));
        fs::write(&path, serde_json::to_vec_pretty(&doc)?)?;
        debug!("Result written: {}", path.display());
        Ok(path)
    }

    fn copy_attachment(&self, uuid: &str, path: &Path) -> PageResult<String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("bin");
        let source = format!("{uuid}-attachment.{ext}");
        fs::copy(path, self.dir.join(&source))?;
        Ok(source)
    }
}

/// Count the result files in `dir`; a missing directory counts as zero
#[must_use]
pub fn count_result_files(dir: &Path) -> usize {
    fs::read_dir(dir).map_or(0, |entries| {
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(RESULT_SUFFIX))
            .count()
    })
}
