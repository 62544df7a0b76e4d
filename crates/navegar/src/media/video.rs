//! Failure video recording.
//!
//! [`VideoRecorder`] turns a stream of screenshots into an MJPEG-in-MP4
//! artifact. [`VideoCapture`] runs it for a whole batch: a background task
//! pulls periodic screenshots from the driver; stopping with a failed-test
//! title finalizes the artifact, stopping without one discards the frames
//! (videos of passing batches are never written).

use crate::driver::{BrowserDriver, Screenshot};
use crate::media::screenshots::sanitize_title;
use crate::result::{NavegarError, NavegarResult};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, trace};

/// Configuration for video recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Frames per second (1-60)
    pub fps: u8,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Maximum recording duration in seconds (0 = unlimited)
    pub max_duration_secs: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 4,
            width: 1280,
            height: 720,
            jpeg_quality: 80,
            max_duration_secs: 1800,
        }
    }
}

impl VideoConfig {
    /// Create a configuration for the given output dimensions
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set frames per second (clamped to 1-60)
    #[must_use]
    pub fn with_fps(mut self, fps: u8) -> Self {
        self.fps = fps.clamp(1, 60);
        self
    }

    /// Duration of one frame
    #[must_use]
    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }

    /// Container ticks per second
    #[must_use]
    pub fn timescale(&self) -> u32 {
        u32::from(self.fps) * 100
    }
}

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not started
    Idle,
    /// Capturing frames
    Recording,
    /// Stopped, frames flushed or discarded
    Stopped,
}

/// Encodes screenshots into an MJPEG/MP4 artifact
#[derive(Debug)]
pub struct VideoRecorder {
    config: VideoConfig,
    frames: Vec<Vec<u8>>,
    state: RecordingState,
    started_at: Option<Instant>,
}

impl VideoRecorder {
    /// Create a recorder with the given configuration
    #[must_use]
    pub fn new(config: VideoConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            state: RecordingState::Idle,
            started_at: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Number of buffered frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Begin recording
    pub fn start(&mut self) -> NavegarResult<()> {
        if self.state == RecordingState::Recording {
            return Err(NavegarError::VideoRecording {
                message: "recording already in progress".to_string(),
            });
        }
        self.frames.clear();
        self.state = RecordingState::Recording;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Buffer one screenshot as a frame
    pub fn capture_frame(&mut self, screenshot: &Screenshot) -> NavegarResult<()> {
        self.check_recording()?;
        let cursor = Cursor::new(&screenshot.data);
        let img = image::load(cursor, image::ImageFormat::Png).map_err(|e| {
            NavegarError::VideoRecording {
                message: format!("failed to decode screenshot: {e}"),
            }
        })?;
        self.push_image(&img)
    }

    /// Buffer one raw RGBA frame
    pub fn capture_raw_frame(&mut self, data: &[u8], width: u32, height: u32) -> NavegarResult<()> {
        self.check_recording()?;
        let img = image::RgbaImage::from_raw(width, height, data.to_vec()).ok_or_else(|| {
            NavegarError::VideoRecording {
                message: "invalid raw frame dimensions".to_string(),
            }
        })?;
        self.push_image(&DynamicImage::ImageRgba8(img))
    }

    /// Stop and return the MP4 bytes
    pub fn stop(&mut self) -> NavegarResult<Vec<u8>> {
        if self.state != RecordingState::Recording {
            return Err(NavegarError::VideoRecording {
                message: "recording not in progress".to_string(),
            });
        }
        self.state = RecordingState::Stopped;
        if self.frames.is_empty() {
            return Err(NavegarError::VideoRecording {
                message: "no frames captured".to_string(),
            });
        }
        Ok(self.render_mp4())
    }

    /// Stop and drop all buffered frames
    pub fn discard(&mut self) {
        self.frames.clear();
        self.state = RecordingState::Stopped;
    }

    fn check_recording(&self) -> NavegarResult<()> {
        if self.state != RecordingState::Recording {
            return Err(NavegarError::VideoRecording {
                message: "recording not started".to_string(),
            });
        }
        if self.config.max_duration_secs > 0 {
            let elapsed = self.started_at.map(|t| t.elapsed().as_secs()).unwrap_or(0);
            if elapsed > u64::from(self.config.max_duration_secs) {
                return Err(NavegarError::VideoRecording {
                    message: format!(
                        "maximum recording duration of {}s exceeded",
                        self.config.max_duration_secs
                    ),
                });
            }
        }
        Ok(())
    }

    fn push_image(&mut self, img: &DynamicImage) -> NavegarResult<()> {
        let img = if img.width() != self.config.width || img.height() != self.config.height {
            img.resize_exact(
                self.config.width,
                self.config.height,
                image::imageops::FilterType::Triangle,
            )
        } else {
            img.clone()
        };
        let rgb = img.to_rgb8();
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.config.jpeg_quality);
        encoder
            .encode(
                rgb.as_raw(),
                self.config.width,
                self.config.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| NavegarError::VideoRecording {
                message: format!("JPEG encoding failed: {e}"),
            })?;
        self.frames.push(buffer.into_inner());
        Ok(())
    }

    /// Assemble ftyp + mdat + moov around the buffered MJPEG frames
    fn render_mp4(&self) -> Vec<u8> {
        let mut ftyp = Vec::new();
        ftyp.extend_from_slice(b"isom");
        ftyp.extend_from_slice(&512u32.to_be_bytes());
        for brand in [b"isom", b"iso2", b"mp41"] {
            ftyp.extend_from_slice(brand);
        }
        let ftyp = mp4_box(b"ftyp", &ftyp);

        let mdat_payload: Vec<u8> = self.frames.concat();
        let mdat = mp4_box(b"mdat", &mdat_payload);

        // Chunk offsets are absolute, so moov comes after mdat.
        let mut offsets = Vec::with_capacity(self.frames.len());
        let mut offset = ftyp.len() as u32 + 8;
        for frame in &self.frames {
            offsets.push(offset);
            offset += frame.len() as u32;
        }
        let moov = self.render_moov(&offsets);

        let mut out = ftyp;
        out.extend_from_slice(&mdat);
        out.extend_from_slice(&moov);
        out
    }

    fn render_moov(&self, offsets: &[u32]) -> Vec<u8> {
        let timescale = self.config.timescale();
        let ticks_per_frame = timescale / u32::from(self.config.fps.max(1));
        let duration = ticks_per_frame * self.frames.len() as u32;
        let frame_count = self.frames.len() as u32;

        let mut mvhd = vec![0u8; 4];
        mvhd.extend_from_slice(&0u32.to_be_bytes()); // creation
        mvhd.extend_from_slice(&0u32.to_be_bytes()); // modification
        mvhd.extend_from_slice(&timescale.to_be_bytes());
        mvhd.extend_from_slice(&duration.to_be_bytes());
        mvhd.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate 1.0
        mvhd.extend_from_slice(&[0x01, 0x00]); // volume 1.0
        mvhd.extend_from_slice(&[0u8; 10]);
        for val in IDENTITY_MATRIX {
            mvhd.extend_from_slice(&val.to_be_bytes());
        }
        mvhd.extend_from_slice(&[0u8; 24]);
        mvhd.extend_from_slice(&2u32.to_be_bytes()); // next track id

        let mut tkhd = vec![0, 0, 0, 7]; // version 0, flags: enabled+in-movie+in-preview
        tkhd.extend_from_slice(&0u32.to_be_bytes());
        tkhd.extend_from_slice(&0u32.to_be_bytes());
        tkhd.extend_from_slice(&1u32.to_be_bytes()); // track id
        tkhd.extend_from_slice(&0u32.to_be_bytes());
        tkhd.extend_from_slice(&duration.to_be_bytes());
        tkhd.extend_from_slice(&[0u8; 16]);
        for val in IDENTITY_MATRIX {
            tkhd.extend_from_slice(&val.to_be_bytes());
        }
        tkhd.extend_from_slice(&(self.config.width << 16).to_be_bytes());
        tkhd.extend_from_slice(&(self.config.height << 16).to_be_bytes());

        let mut mdhd = vec![0u8; 4];
        mdhd.extend_from_slice(&0u32.to_be_bytes());
        mdhd.extend_from_slice(&0u32.to_be_bytes());
        mdhd.extend_from_slice(&timescale.to_be_bytes());
        mdhd.extend_from_slice(&duration.to_be_bytes());
        mdhd.extend_from_slice(&0x55c4u16.to_be_bytes()); // language: und
        mdhd.extend_from_slice(&0u16.to_be_bytes());

        let mut hdlr = vec![0u8; 4];
        hdlr.extend_from_slice(&0u32.to_be_bytes());
        hdlr.extend_from_slice(b"vide");
        hdlr.extend_from_slice(&[0u8; 12]);
        hdlr.extend_from_slice(b"VideoHandler\0");

        let mut stsd = vec![0u8; 4];
        stsd.extend_from_slice(&1u32.to_be_bytes());
        let mut mjpa = vec![0u8; 6];
        mjpa.extend_from_slice(&1u16.to_be_bytes()); // data reference index
        mjpa.extend_from_slice(&[0u8; 16]);
        mjpa.extend_from_slice(&(self.config.width as u16).to_be_bytes());
        mjpa.extend_from_slice(&(self.config.height as u16).to_be_bytes());
        mjpa.extend_from_slice(&0x0048_0000u32.to_be_bytes()); // 72 dpi
        mjpa.extend_from_slice(&0x0048_0000u32.to_be_bytes());
        mjpa.extend_from_slice(&0u32.to_be_bytes());
        mjpa.extend_from_slice(&1u16.to_be_bytes()); // frame count per sample
        mjpa.extend_from_slice(&[0u8; 32]); // compressor name
        mjpa.extend_from_slice(&24u16.to_be_bytes()); // depth
        mjpa.extend_from_slice(&0xFFFFu16.to_be_bytes());
        stsd.extend_from_slice(&mp4_box(b"jpeg", &mjpa));

        let mut stts = vec![0u8; 4];
        stts.extend_from_slice(&1u32.to_be_bytes());
        stts.extend_from_slice(&frame_count.to_be_bytes());
        stts.extend_from_slice(&ticks_per_frame.to_be_bytes());

        let mut stsc = vec![0u8; 4];
        stsc.extend_from_slice(&1u32.to_be_bytes());
        stsc.extend_from_slice(&1u32.to_be_bytes()); // first chunk
        stsc.extend_from_slice(&1u32.to_be_bytes()); // samples per chunk
        stsc.extend_from_slice(&1u32.to_be_bytes()); // sample description

        let mut stsz = vec![0u8; 4];
        stsz.extend_from_slice(&0u32.to_be_bytes()); // variable sizes
        stsz.extend_from_slice(&frame_count.to_be_bytes());
        for frame in &self.frames {
            stsz.extend_from_slice(&(frame.len() as u32).to_be_bytes());
        }

        let mut stco = vec![0u8; 4];
        stco.extend_from_slice(&frame_count.to_be_bytes());
        for off in offsets {
            stco.extend_from_slice(&off.to_be_bytes());
        }

        let stbl = [
            mp4_box(b"stsd", &stsd),
            mp4_box(b"stts", &stts),
            mp4_box(b"stsc", &stsc),
            mp4_box(b"stsz", &stsz),
            mp4_box(b"stco", &stco),
        ]
        .concat();

        let mut dref = vec![0u8; 4];
        dref.extend_from_slice(&1u32.to_be_bytes());
        dref.extend_from_slice(&mp4_box(b"url ", &[0, 0, 0, 1]));
        let dinf = mp4_box(b"dinf", &mp4_box(b"dref", &dref));

        let vmhd = mp4_box(b"vmhd", &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);

        let minf = [vmhd, dinf, mp4_box(b"stbl", &stbl)].concat();
        let mdia = [
            mp4_box(b"mdhd", &mdhd),
            mp4_box(b"hdlr", &hdlr),
            mp4_box(b"minf", &minf),
        ]
        .concat();
        let trak = [mp4_box(b"tkhd", &tkhd), mp4_box(b"mdia", &mdia)].concat();
        let moov = [mp4_box(b"mvhd", &mvhd), mp4_box(b"trak", &trak)].concat();
        mp4_box(b"moov", &moov)
    }
}

const IDENTITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

fn mp4_box(kind: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + content.len());
    out.extend_from_slice(&(content.len() as u32 + 8).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(content);
    out
}

/// Batch-level video capture pulling frames from the live session
pub struct VideoCapture {
    recorder: Arc<Mutex<VideoRecorder>>,
    dir: PathBuf,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for VideoCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoCapture")
            .field("dir", &self.dir)
            .field("running", &self.task.is_some())
            .finish()
    }
}

impl VideoCapture {
    /// Create a capture writing artifacts under `dir`
    #[must_use]
    pub fn new(config: VideoConfig, dir: impl Into<PathBuf>) -> Self {
        Self {
            recorder: Arc::new(Mutex::new(VideoRecorder::new(config))),
            dir: dir.into(),
            task: None,
        }
    }

    /// Whether frames are being captured
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder
            .lock()
            .map(|r| r.state() == RecordingState::Recording)
            .unwrap_or(false)
    }

    /// Number of frames buffered so far
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.recorder.lock().map(|r| r.frame_count()).unwrap_or(0)
    }

    /// Start pulling periodic screenshots from the driver
    pub fn start(&mut self, driver: Arc<dyn BrowserDriver>) -> NavegarResult<()> {
        let frame_duration = {
            let mut recorder = self
                .recorder
                .lock()
                .map_err(|_| NavegarError::VideoRecording {
                    message: "recorder lock poisoned".to_string(),
                })?;
            recorder.start()?;
            recorder.config.frame_duration()
        };

        let recorder = Arc::clone(&self.recorder);
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_duration);
            loop {
                interval.tick().await;
                match driver.take_screenshot().await {
                    Ok(shot) => {
                        if let Ok(mut recorder) = recorder.lock() {
                            // Frames the recorder cannot decode are dropped.
                            if let Err(e) = recorder.capture_frame(&shot) {
                                trace!(error = %e, "frame dropped");
                            }
                        }
                    }
                    Err(e) => trace!(error = %e, "screenshot unavailable for video frame"),
                }
            }
        }));
        debug!("video capture started");
        Ok(())
    }

    /// Stop capturing.
    ///
    /// With a failed-test title the buffered frames are written as
    /// `FAILED-<title>-<ts>.mp4` and the path returned; without one the
    /// frames are discarded. Idempotent once stopped.
    pub async fn stop(&mut self, failed_test: Option<&str>) -> NavegarResult<Option<PathBuf>> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut recorder = self
            .recorder
            .lock()
            .map_err(|_| NavegarError::VideoRecording {
                message: "recorder lock poisoned".to_string(),
            })?;
        if recorder.state() != RecordingState::Recording {
            return Ok(None);
        }
        let Some(title) = failed_test else {
            recorder.discard();
            debug!("video capture discarded");
            return Ok(None);
        };
        if recorder.frame_count() == 0 {
            recorder.discard();
            return Ok(None);
        }
        let data = recorder.stop()?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!(
            "FAILED-{}-{}.mp4",
            sanitize_title(title),
            chrono::Utc::now().timestamp_millis()
        ));
        std::fs::write(&path, data)?;
        debug!(path = %path.display(), "failure video saved");
        Ok(Some(path))
    }
}
