use std::path::PathBuf;

use gtk4::prelude::*;
use thiserror::Error;

use crate::clipboard::{ClipboardBackend, ClipboardError};
use crate::storage::{ExportStorage, StorageError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to render result card: {message}")]
    Snapshot { message: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Copied,
    /// Clipboard write failed; the card was saved here instead.
    Saved(PathBuf),
}

/// Copy the card PNG to the clipboard, saving it to disk when that fails.
pub fn copy_card(
    png: &[u8],
    clipboard: &dyn ClipboardBackend,
    storage: &ExportStorage,
) -> ExportResult<ExportOutcome> {
    match clipboard.copy_png(png) {
        Ok(()) => {
            tracing::info!(bytes = png.len(), "copied result card to clipboard");
            Ok(ExportOutcome::Copied)
        }
        Err(err) => {
            tracing::warn!(%err, "clipboard write failed; saving result card instead");
            storage.save_png(png).map(ExportOutcome::Saved).map_err(Into::into)
        }
    }
}

pub fn download_card(png: &[u8], storage: &ExportStorage) -> ExportResult<PathBuf> {
    Ok(storage.save_png(png)?)
}

/// Render `widget` as currently laid out into PNG bytes.
pub fn render_widget_png(widget: &impl IsA<gtk4::Widget>) -> ExportResult<Vec<u8>> {
    let snapshot_err = |message: &str| ExportError::Snapshot {
        message: message.to_string(),
    };
    let widget = widget.as_ref();
    let (width, height) = (widget.width(), widget.height());
    if width <= 0 || height <= 0 {
        return Err(snapshot_err("card is not laid out"));
    }

    let paintable = gtk4::WidgetPaintable::new(Some(widget));
    let snapshot = gtk4::Snapshot::new();
    paintable.snapshot(&snapshot, f64::from(width), f64::from(height));
    let node = snapshot
        .to_node()
        .ok_or_else(|| snapshot_err("card produced no render node"))?;
    let renderer = widget
        .native()
        .and_then(|native| native.renderer())
        .ok_or_else(|| snapshot_err("card is not realized"))?;

    let texture = renderer.render_texture(&node, None);
    Ok(texture.save_to_png_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardResult;
    use std::cell::Cell;

    struct FakeClipboard {
        fail: bool,
        calls: Cell<usize>,
    }

    impl FakeClipboard {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Cell::new(0),
            }
        }
    }

    impl ClipboardBackend for FakeClipboard {
        fn copy_png(&self, _png: &[u8]) -> ClipboardResult<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ClipboardError::DisplayUnavailable);
            }
            Ok(())
        }
    }

    #[test]
    fn copy_card_uses_clipboard_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().to_path_buf());
        let clipboard = FakeClipboard::new(false);

        let outcome = copy_card(b"png", &clipboard, &storage).unwrap();
        assert_eq!(outcome, ExportOutcome::Copied);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn copy_card_falls_back_to_saving() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().to_path_buf());
        let clipboard = FakeClipboard::new(true);

        let outcome = copy_card(b"png", &clipboard, &storage).unwrap();
        let ExportOutcome::Saved(path) = outcome else {
            panic!("expected fallback save");
        };
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }

    #[test]
    fn exports_can_be_repeated() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().to_path_buf());
        let clipboard = FakeClipboard::new(false);

        for _ in 0..3 {
            copy_card(b"png", &clipboard, &storage).unwrap();
            download_card(b"png", &storage).unwrap();
        }
        assert_eq!(clipboard.calls.get(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
