//! Artifact capture: screenshots and failure videos.

mod screenshots;
mod video;

pub use screenshots::{
    failed_screenshot_name, passed_screenshot_name, sanitize_title, ScreenshotContext,
    ScreenshotWriter,
};
pub use video::{RecordingState, VideoCapture, VideoConfig, VideoRecorder};
