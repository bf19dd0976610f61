//! Test run video capture.

pub mod avi;
pub mod video_recorder;

pub use avi::AviWriter;
pub use video_recorder::{
    encode_frame, BrowserFrameSource, FrameSource, RecordingState, VideoConfig, VideoRecorder,
};
