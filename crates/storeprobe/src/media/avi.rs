//! Motion-JPEG AVI container.
//!
//! Writes a single-stream RIFF AVI 1.0 file: `hdrl` header list, `movi`
//! frame list and `idx1` index. Frame counts and chunk sizes are written as
//! placeholders and patched by [`AviWriter::finish`].

use crate::error::{PageResult, StoreProbeError};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;

// Byte offsets of the fields patched on finish.
const RIFF_SIZE_AT: u64 = 4;
const AVIH_TOTAL_FRAMES_AT: u64 = 48;
const AVIH_BUFFER_SIZE_AT: u64 = 60;
const STRH_LENGTH_AT: u64 = 140;
const STRH_BUFFER_SIZE_AT: u64 = 144;
const MOVI_SIZE_AT: u64 = 216;

/// Streaming MJPEG AVI writer
#[derive(Debug)]
pub struct AviWriter<W: Write + Seek> {
    inner: W,
    width: u32,
    height: u32,
    fps: u32,
    index: Vec<(u32, u32)>,
    movi_len: u32,
    max_frame_len: u32,
}

impl AviWriter<BufWriter<File>> {
    /// Create the output file and write the header
    pub fn create(path: &Path, width: u32, height: u32, fps: u32) -> PageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?), width, height, fps)
    }
}

impl<W: Write + Seek> AviWriter<W> {
    /// Write the header into `inner`
    pub fn new(mut inner: W, width: u32, height: u32, fps: u32) -> PageResult<Self> {
        if width == 0 || height == 0 || fps == 0 {
            return Err(StoreProbeError::VideoRecording {
                message: format!("invalid video geometry {width}x{height} @ {fps} fps"),
            });
        }
        let (Ok(frame_width), Ok(frame_height)) = (u16::try_from(width), u16::try_from(height))
        else {
            return Err(StoreProbeError::VideoRecording {
                message: format!(
                    "video size {width}x{height} exceeds the AVI frame limit of {}",
                    u16::MAX
                ),
            });
        };
        write_header(&mut inner, frame_width, frame_height, fps)?;
        Ok(Self {
            inner,
            width,
            height,
            fps,
            index: Vec::new(),
            movi_len: 4,
            max_frame_len: 0,
        })
    }

    /// Frames written so far
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    /// Frame size in pixels
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames per second
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Append one JPEG-encoded frame
    pub fn write_frame(&mut self, jpeg: &[u8]) -> PageResult<()> {
        let len = u32::try_from(jpeg.len()).map_err(|_| StoreProbeError::VideoRecording {
            message: "frame too large for AVI".to_string(),
        })?;
        let offset = self.movi_len;

        self.inner.write_all(b"00dc")?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(jpeg)?;
        let padded = len + (len & 1);
        if padded != len {
            self.inner.write_all(&[0])?;
        }

        self.index.push((offset, len));
        self.movi_len += 8 + padded;
        self.max_frame_len = self.max_frame_len.max(len);
        Ok(())
    }

    /// Write the index, patch the header and return the flushed sink
    pub fn finish(mut self) -> PageResult<W> {
        let frames = self.index.len() as u32;

        self.inner.write_all(b"idx1")?;
        self.inner.write_all(&(frames * 16).to_le_bytes())?;
        for (offset, len) in &self.index {
            self.inner.write_all(b"00dc")?;
            self.inner.write_all(&AVIIF_KEYFRAME.to_le_bytes())?;
            self.inner.write_all(&offset.to_le_bytes())?;
            self.inner.write_all(&len.to_le_bytes())?;
        }

        let end = self.inner.stream_position()?;
        let riff_size = (end - 8) as u32;
        let buffer = self.max_frame_len + 8;

        patch(&mut self.inner, RIFF_SIZE_AT, riff_size)?;
        patch(&mut self.inner, AVIH_TOTAL_FRAMES_AT, frames)?;
        patch(&mut self.inner, AVIH_BUFFER_SIZE_AT, buffer)?;
        patch(&mut self.inner, STRH_LENGTH_AT, frames)?;
        patch(&mut self.inner, STRH_BUFFER_SIZE_AT, buffer)?;
        patch(&mut self.inner, MOVI_SIZE_AT, self.movi_len)?;

        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn patch<W: Write + Seek>(out: &mut W, at: u64, value: u32) -> std::io::Result<()> {
    out.seek(SeekFrom::Start(at))?;
    out.write_all(&value.to_le_bytes())
}

fn write_header<W: Write>(out: &mut W, frame_width: u16, frame_height: u16, fps: u32) -> std::io::Result<()> {
    let u32le = |v: u32| v.to_le_bytes();
    let u16le = |v: u16| v.to_le_bytes();
    let (width, height) = (u32::from(frame_width), u32::from(frame_height));

    out.write_all(b"RIFF")?;
    out.write_all(&u32le(0))?;
    out.write_all(b"AVI ")?;

    // hdrl: "hdrl" + avih chunk (8 + 56) + strl list (8 + 116)
    out.write_all(b"LIST")?;
    out.write_all(&u32le(4 + 64 + 124))?;
    out.write_all(b"hdrl")?;

    out.write_all(b"avih")?;
    out.write_all(&u32le(56))?;
    out.write_all(&u32le(1_000_000 / fps))?; // microseconds per frame
    out.write_all(&u32le(0))?; // max bytes per second
    out.write_all(&u32le(0))?; // padding granularity
    out.write_all(&u32le(AVIF_HASINDEX))?;
    out.write_all(&u32le(0))?; // total frames
    out.write_all(&u32le(0))?; // initial frames
    out.write_all(&u32le(1))?; // streams
    out.write_all(&u32le(0))?; // suggested buffer size
    out.write_all(&u32le(width))?;
    out.write_all(&u32le(height))?;
    out.write_all(&[0; 16])?;

    // strl: "strl" + strh chunk (8 + 56) + strf chunk (8 + 40)
    out.write_all(b"LIST")?;
    out.write_all(&u32le(4 + 64 + 48))?;
    out.write_all(b"strl")?;

    out.write_all(b"strh")?;
    out.write_all(&u32le(56))?;
    out.write_all(b"vids")?;
    out.write_all(b"MJPG")?;
    out.write_all(&u32le(0))?; // flags
    out.write_all(&u16le(0))?; // priority
    out.write_all(&u16le(0))?; // language
    out.write_all(&u32le(0))?; // initial frames
    out.write_all(&u32le(1))?; // scale
    out.write_all(&u32le(fps))?; // rate
    out.write_all(&u32le(0))?; // start
    out.write_all(&u32le(0))?; // length
    out.write_all(&u32le(0))?; // suggested buffer size
    out.write_all(&u32le(u32::MAX))?; // quality: driver default
    out.write_all(&u32le(0))?; // sample size
    out.write_all(&u16le(0))?;
    out.write_all(&u16le(0))?;
    out.write_all(&u16le(frame_width))?;
    out.write_all(&u16le(frame_height))?;

    out.write_all(b"strf")?;
    out.write_all(&u32le(40))?;
    out.write_all(&u32le(40))?;
    out.write_all(&u32le(width))?;
    out.write_all(&u32le(height))?;
    out.write_all(&u16le(1))?; // planes
    out.write_all(&u16le(24))?; // bit count
    out.write_all(b"MJPG")?;
    out.write_all(&u32le(width.saturating_mul(height).saturating_mul(3)))?;
    out.write_all(&[0; 16])?;

    out.write_all(b"LIST")?;
    out.write_all(&u32le(4))?;
    out.write_all(b"movi")?;
    Ok(())
}
