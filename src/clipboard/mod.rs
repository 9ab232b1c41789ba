use std::io::{self, Write};
use std::process::{Command, Stdio};

use gtk4::gdk;
use gtk4::gdk::prelude::*;
use gtk4::glib;
use thiserror::Error;

use crate::config::ClipboardChoice;

const WL_COPY_COMMAND: &str = "wl-copy";
const MIME_IMAGE_PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run wl-copy command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to access default display for clipboard operations")]
    DisplayUnavailable,
    #[error("failed to set clipboard content: {source}")]
    SetContent {
        #[source]
        source: glib::BoolError,
    },
    #[error("wl-copy exited with non-zero status: {status}")]
    CommandFailed { status: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn copy_png(&self, png: &[u8]) -> ClipboardResult<()>;
}

pub(crate) fn backend_for(choice: ClipboardChoice) -> Box<dyn ClipboardBackend> {
    match choice {
        ClipboardChoice::Gtk => Box::new(GdkClipboardBackend),
        ClipboardChoice::WlCopy => Box::new(WlCopyBackend),
    }
}

/// Pipes the PNG into `wl-copy --type image/png`.
#[derive(Debug, Default)]
pub struct WlCopyBackend;

impl ClipboardBackend for WlCopyBackend {
    fn copy_png(&self, png: &[u8]) -> ClipboardResult<()> {
        let command_io = |source| ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source,
        };
        let mut child = Command::new(WL_COPY_COMMAND)
            .args(["--type", MIME_IMAGE_PNG])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(command_io)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png).map_err(command_io)?;
        }
        let status = child.wait().map_err(command_io)?;

        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                status: status.to_string(),
            })
        }
    }
}

/// GDK clipboard of the default display. Main thread only.
#[derive(Debug, Default)]
pub struct GdkClipboardBackend;

impl ClipboardBackend for GdkClipboardBackend {
    fn copy_png(&self, png: &[u8]) -> ClipboardResult<()> {
        let display = gdk::Display::default().ok_or(ClipboardError::DisplayUnavailable)?;
        let provider =
            gdk::ContentProvider::for_bytes(MIME_IMAGE_PNG, &glib::Bytes::from(png));
        display
            .clipboard()
            .set_content(Some(&provider))
            .map_err(|source| ClipboardError::SetContent { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_contains_command_name() {
        let err = ClipboardError::CommandFailed {
            status: "exit status 1".to_string(),
        };
        assert!(format!("{err}").contains("wl-copy"));
    }

    #[test]
    fn command_io_error_names_the_command() {
        let err = ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(format!("{err}").contains(WL_COPY_COMMAND));
    }
}
