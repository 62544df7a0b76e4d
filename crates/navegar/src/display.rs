//! Virtual display management for non-headless CI runs.
//!
//! Headful browsers on display-less CI hosts need an X server; the batch
//! hooks start one Xvfb per batch and reap it at the end. Everything here
//! is best effort: a missing Xvfb binary is reported to the caller, which
//! downgrades it to a warning.

use crate::config::ScreenSize;
use crate::result::{NavegarError, NavegarResult};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

fn display_env(display_number: u32) -> String {
    format!(":{display_number}")
}

/// Handle on a spawned Xvfb process
#[derive(Debug)]
pub struct VirtualDisplay {
    child: Child,
    display_number: u32,
}

impl VirtualDisplay {
    /// Spawn Xvfb on the given display number, sized for the viewport
    pub async fn start(display_number: u32, screen: ScreenSize) -> NavegarResult<Self> {
        let (width, height) = screen.dimensions();
        let child = Command::new("Xvfb")
            .arg(display_env(display_number))
            .arg("-screen")
            .arg("0")
            .arg(format!("{width}x{height}x24"))
            .arg("-nolisten")
            .arg("tcp")
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NavegarError::driver(format!("failed to spawn Xvfb: {e}")))?;
        debug!(display = display_number, "virtual display started");
        Ok(Self {
            child,
            display_number,
        })
    }

    /// Value for the DISPLAY environment variable
    #[must_use]
    pub fn display_env(&self) -> String {
        display_env(self.display_number)
    }

    /// Stop and reap the X server
    pub async fn stop(mut self) -> NavegarResult<()> {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill Xvfb");
        }
        let _ = self.child.wait().await;
        debug!(display = self.display_number, "virtual display stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_env_format() {
        assert_eq!(display_env(99), ":99");
        assert_eq!(display_env(7), ":7");
    }
}
