//! Background video capture.
//!
//! A [`VideoRecorder`] owns one worker thread that grabs frames from a
//! [`FrameSource`], scales them to the configured size, encodes them as JPEG
//! and appends them to an MJPEG AVI. The worker shares only a stop flag, a
//! frame counter and the writer with the caller. If a capture takes longer
//! than one frame interval the effective frame rate simply drops.

use crate::driver::BrowserDriver;
use crate::error::{PageResult, StoreProbeError};
use crate::media::avi::AviWriter;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

type SharedWriter = Arc<Mutex<Option<AviWriter<BufWriter<File>>>>>;

/// Video recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Recording has not started
    Idle,
    /// Worker is capturing frames
    Recording,
    /// Recording stopped and the file is closed
    Stopped,
}

/// Configuration for video recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Frames per second (1-30)
    pub fps: u8,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// How long `stop` waits for the worker before detaching it
    pub join_timeout: Duration,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 5,
            width: 1280,
            height: 720,
            jpeg_quality: 75,
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl VideoConfig {
    /// Create a new video configuration
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set frames per second (clamped to 1-30)
    #[must_use]
    pub fn with_fps(mut self, fps: u8) -> Self {
        self.fps = fps.clamp(1, 30);
        self
    }

    /// Set JPEG quality (clamped to 1-100)
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the bounded join timeout
    #[must_use]
    pub const fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Interval between capture cycles
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }

    /// Sleep that keeps a cycle which already took `spent` on the frame clock
    #[must_use]
    pub fn next_frame_delay(&self, spent: Duration) -> Duration {
        self.frame_duration().saturating_sub(spent)
    }
}

/// Supplies frames to the recorder
pub trait FrameSource: Send {
    /// Grab the current frame
    fn capture(&mut self) -> PageResult<DynamicImage>;
}

/// Captures the browser viewport through the driver's screenshot command.
///
/// Runs on the recorder thread and drives the async driver through a tokio
/// runtime handle, so the handle must belong to a multi-thread runtime when
/// the driver does real I/O.
#[derive(Debug)]
pub struct BrowserFrameSource {
    driver: Arc<dyn BrowserDriver>,
    runtime: tokio::runtime::Handle,
}

impl BrowserFrameSource {
    /// Create a frame source for a driver
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, runtime: tokio::runtime::Handle) -> Self {
        Self { driver, runtime }
    }
}

impl FrameSource for BrowserFrameSource {
    fn capture(&mut self) -> PageResult<DynamicImage> {
        let screenshot = self.runtime.block_on(self.driver.screenshot())?;
        image::load_from_memory_with_format(&screenshot.data, ImageFormat::Png).map_err(|e| {
            StoreProbeError::VideoRecording {
                message: format!("Failed to decode screenshot: {e}"),
            }
        })
    }
}

/// Scale to the output size and encode as JPEG
pub fn encode_frame(img: &DynamicImage, config: &VideoConfig) -> PageResult<Vec<u8>> {
    let img = if img.width() != config.width || img.height() != config.height {
        img.resize_exact(
            config.width,
            config.height,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img.clone()
    };

    let rgb = img.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
    encoder
        .encode(
            rgb.as_raw(),
            config.width,
            config.height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| StoreProbeError::VideoRecording {
            message: format!("JPEG encoding failed: {e}"),
        })?;
    Ok(buffer.into_inner())
}

/// Records a frame source to an AVI file on a background thread
pub struct VideoRecorder {
    path: PathBuf,
    config: VideoConfig,
    source: Option<Box<dyn FrameSource>>,
    state: RecordingState,
    stop_flag: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    writer: SharedWriter,
    done: Option<mpsc::Receiver<()>>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for VideoRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRecorder")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("frames", &self.frame_count())
            .finish_non_exhaustive()
    }
}

impl VideoRecorder {
    /// Create a recorder writing to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: VideoConfig, source: Box<dyn FrameSource>) -> Self {
        let path = path.into();
        info!(
            "Video recorder ready: {} ({}x{} @ {} fps)",
            path.display(),
            config.width,
            config.height,
            config.fps
        );
        Self {
            path,
            config,
            source: Some(source),
            state: RecordingState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(AtomicU64::new(0)),
            writer: Arc::new(Mutex::new(None)),
            done: None,
            worker: None,
        }
    }

    /// Output file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current recording state
    #[must_use]
    pub const fn state(&self) -> RecordingState {
        self.state
    }

    /// Frames written so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Open the output file and start the capture thread.
    ///
    /// Calling it while recording only logs a warning.
    pub fn start(&mut self) -> PageResult<()> {
        if self.state == RecordingState::Recording {
            warn!("Video recording already in progress: {}", self.path.display());
            return Ok(());
        }
        let Some(mut source) = self.source.take() else {
            return Err(StoreProbeError::VideoRecording {
                message: "frame source already consumed; create a new recorder".to_string(),
            });
        };

        let writer = AviWriter::create(
            &self.path,
            self.config.width,
            self.config.height,
            u32::from(self.config.fps),
        )?;
        *self.writer.lock().unwrap_or_else(PoisonError::into_inner) = Some(writer);

        let (done_tx, done_rx) = mpsc::channel();
        let stop = Arc::clone(&self.stop_flag);
        let frames = Arc::clone(&self.frames);
        let writer = Arc::clone(&self.writer);
        let config = self.config.clone();

        let worker = std::thread::Builder::new()
            .name("video-recorder".to_string())
            .spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    let cycle = Instant::now();
                    let written = source
                        .capture()
                        .and_then(|img| encode_frame(&img, &config))
                        .and_then(|jpeg| {
                            let mut guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
                            match guard.as_mut() {
                                Some(avi) => avi.write_frame(&jpeg),
                                None => Ok(()),
                            }
                        });
                    if let Err(e) = written {
                        error!("Video capture loop ended: {}", e);
                        break;
                    }
                    frames.fetch_add(1, Ordering::AcqRel);
                    std::thread::sleep(config.next_frame_delay(cycle.elapsed()));
                }
                let _ = done_tx.send(());
            })
            .map_err(|e| StoreProbeError::VideoRecording {
                message: format!("could not spawn recorder thread: {e}"),
            })?;

        self.worker = Some(worker);
        self.done = Some(done_rx);
        self.state = RecordingState::Recording;
        info!("Video recording started: {}", self.path.display());
        Ok(())
    }

    /// Signal the worker, wait for it (bounded) and close the file.
    ///
    /// Calling it when not recording only logs a warning.
    pub fn stop(&mut self) -> PageResult<()> {
        if self.state != RecordingState::Recording {
            warn!("Video recorder is not recording: {}", self.path.display());
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::Release);
        self.state = RecordingState::Stopped;

        if let Some(done) = self.done.take() {
            match done.recv_timeout(self.config.join_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if let Some(worker) = self.worker.take() {
                        let _ = worker.join();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Video worker did not stop within {:?}, detaching it",
                        self.config.join_timeout
                    );
                    self.worker = None;
                }
            }
        }

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(writer) = writer {
            writer.finish()?;
        }

        let size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        info!(
            "Video saved: {} ({} frames, {} bytes)",
            self.path.display(),
            self.frame_count(),
            size
        );
        Ok(())
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        if self.state == RecordingState::Recording {
            if let Err(e) = self.stop() {
                warn!("Video recorder stop on drop failed: {}", e);
            }
        }
    }
}
