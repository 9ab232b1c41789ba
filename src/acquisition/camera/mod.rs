use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ImagePayload;

mod v4l2;

pub use v4l2::{V4l2Backend, V4l2Handle};

const REAR_FACING_HINTS: [&str; 4] = ["rear", "back", "environment", "world"];
const JPEG_SOI: [u8; 2] = [0xff, 0xd8];
const JPEG_EOI: [u8; 2] = [0xff, 0xd9];
const MAX_PENDING_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied: {path}")]
    PermissionDenied { path: PathBuf },
    #[error("no camera device found")]
    NoDevice,
    #[error("camera device error: {message}")]
    Device { message: String },
}

impl CameraError {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "camera.error.permission",
            Self::NoDevice => "camera.error.noDevice",
            Self::Device { .. } => "camera.error.generic",
        }
    }
}

pub type CameraResult<T> = std::result::Result<T, CameraError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub path: PathBuf,
    pub name: String,
}

impl CameraDevice {
    pub fn is_rear_facing(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        REAR_FACING_HINTS.iter().any(|hint| name.contains(hint))
    }
}

/// Most recent decoded-ready frame with a sequence number for change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    pub sequence: u64,
    pub payload: ImagePayload,
}

pub trait CameraBackend {
    type Handle: CameraHandle;

    fn devices(&self) -> CameraResult<Vec<CameraDevice>>;
    fn open(&self, device: &CameraDevice) -> CameraResult<Self::Handle>;
}

pub trait CameraHandle {
    fn latest_frame(&self) -> Option<CameraFrame>;
    /// `Err` once the stream died after opening.
    fn health(&self) -> CameraResult<()>;
    fn release(&mut self);
}

/// Pick `preferred` when listed, else the first rear-facing device, else the first one.
pub fn select_device<'a>(
    devices: &'a [CameraDevice],
    preferred: Option<&Path>,
) -> Option<&'a CameraDevice> {
    if let Some(preferred) = preferred {
        if let Some(device) = devices.iter().find(|device| device.path == preferred) {
            return Some(device);
        }
        tracing::warn!(path = %preferred.display(), "configured camera not present");
    }
    devices
        .iter()
        .find(|device| device.is_rear_facing())
        .or_else(|| devices.first())
}

/// Exclusive ownership of an open camera. The handle is released exactly once,
/// on [`CameraSession::close`] or on drop, whichever comes first.
pub struct CameraSession<H: CameraHandle> {
    device: CameraDevice,
    handle: Option<H>,
}

impl<H: CameraHandle> CameraSession<H> {
    pub fn open<B>(backend: &B, preferred: Option<&Path>) -> CameraResult<Self>
    where
        B: CameraBackend<Handle = H>,
    {
        let devices = backend.devices()?;
        let device = select_device(&devices, preferred)
            .cloned()
            .ok_or(CameraError::NoDevice)?;
        tracing::info!(path = %device.path.display(), name = %device.name, "opening camera");
        let handle = backend.open(&device)?;
        Ok(Self {
            device,
            handle: Some(handle),
        })
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.handle.as_ref().and_then(H::latest_frame)
    }

    pub fn health(&self) -> CameraResult<()> {
        match self.handle.as_ref() {
            Some(handle) => handle.health(),
            None => Err(CameraError::Device {
                message: "camera session already closed".to_string(),
            }),
        }
    }

    /// Snapshot the current frame; `None` until the first frame arrives.
    pub fn capture(&self) -> Option<ImagePayload> {
        self.latest_frame().map(|frame| frame.payload)
    }

    pub fn close(mut self) {
        self.release_handle();
    }

    fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            tracing::info!(path = %self.device.path.display(), "releasing camera");
            handle.release();
        }
    }
}

impl<H: CameraHandle> Drop for CameraSession<H> {
    fn drop(&mut self) {
        self.release_handle();
    }
}

/// Splits a concatenated MJPEG byte stream into whole JPEG frames.
#[derive(Debug, Default)]
pub struct MjpegSplitter {
    pending: Vec<u8>,
}

impl MjpegSplitter {
    /// Feed bytes; returns the newest complete frame in this chunk, if any.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        let mut newest = None;

        loop {
            let Some(start) = find_marker(&self.pending, JPEG_SOI, 0) else {
                // A trailing 0xff may be the first half of the next start marker.
                let keep_tail = self.pending.last() == Some(&JPEG_SOI[0]);
                self.pending.clear();
                if keep_tail {
                    self.pending.push(JPEG_SOI[0]);
                }
                break;
            };
            if start > 0 {
                self.pending.drain(..start);
            }
            let Some(end) = find_marker(&self.pending, JPEG_EOI, JPEG_SOI.len()) else {
                break;
            };
            let frame_end = end + JPEG_EOI.len();
            newest = Some(self.pending.drain(..frame_end).collect());
        }

        if self.pending.len() > MAX_PENDING_FRAME_BYTES {
            tracing::warn!(bytes = self.pending.len(), "dropping oversized partial frame");
            self.pending.clear();
        }
        newest
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(marker.len())
        .position(|window| window == marker)
        .map(|offset| offset + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeBackend {
        devices: CameraResult<Vec<CameraDevice>>,
        open_error: Option<CameraError>,
        releases: Rc<Cell<usize>>,
    }

    struct FakeHandle {
        releases: Rc<Cell<usize>>,
    }

    impl CameraHandle for FakeHandle {
        fn latest_frame(&self) -> Option<CameraFrame> {
            Some(CameraFrame {
                sequence: 1,
                payload: ImagePayload::new(vec![0xff, 0xd8, 0xff, 0xd9], "image/jpeg").ok()?,
            })
        }

        fn health(&self) -> CameraResult<()> {
            Ok(())
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    impl CameraBackend for FakeBackend {
        type Handle = FakeHandle;

        fn devices(&self) -> CameraResult<Vec<CameraDevice>> {
            self.devices.clone()
        }

        fn open(&self, _device: &CameraDevice) -> CameraResult<FakeHandle> {
            if let Some(err) = &self.open_error {
                return Err(err.clone());
            }
            Ok(FakeHandle {
                releases: self.releases.clone(),
            })
        }
    }

    fn device(index: u8, name: &str) -> CameraDevice {
        CameraDevice {
            path: PathBuf::from(format!("/dev/video{index}")),
            name: name.to_string(),
        }
    }

    fn backend(devices: Vec<CameraDevice>) -> FakeBackend {
        FakeBackend {
            devices: Ok(devices),
            open_error: None,
            releases: Rc::new(Cell::new(0)),
        }
    }

    #[test]
    fn select_device_prefers_configured_then_rear_facing() {
        let devices = vec![
            device(0, "Integrated Webcam (front)"),
            device(2, "Rear Camera"),
        ];
        assert_eq!(select_device(&devices, None), Some(&devices[1]));
        assert_eq!(
            select_device(&devices, Some(Path::new("/dev/video0"))),
            Some(&devices[0])
        );
        assert_eq!(
            select_device(&devices, Some(Path::new("/dev/video9"))),
            Some(&devices[1])
        );
        assert_eq!(select_device(&devices[..1], None), Some(&devices[0]));
        assert_eq!(select_device(&[], None), None);
    }

    #[test]
    fn session_releases_once_on_close() {
        let backend = backend(vec![device(0, "cam")]);
        let session = CameraSession::open(&backend, None).expect("camera opens");
        assert!(session.capture().is_some());
        session.close();
        assert_eq!(backend.releases.get(), 1);
    }

    #[test]
    fn session_releases_on_drop_without_capture() {
        let backend = backend(vec![device(0, "cam")]);
        {
            let _session = CameraSession::open(&backend, None).expect("camera opens");
        }
        assert_eq!(backend.releases.get(), 1);
    }

    #[test]
    fn open_errors_propagate_without_leaking_a_handle() {
        let empty = backend(Vec::new());
        assert!(matches!(
            CameraSession::open(&empty, None),
            Err(CameraError::NoDevice)
        ));

        let mut denied = backend(vec![device(0, "cam")]);
        denied.open_error = Some(CameraError::PermissionDenied {
            path: PathBuf::from("/dev/video0"),
        });
        let err = CameraSession::open(&denied, None)
            .err()
            .expect("permission error");
        assert_eq!(err.message_key(), "camera.error.permission");
        assert_eq!(denied.releases.get(), 0);
    }

    #[test]
    fn error_keys_are_distinct() {
        let keys = [
            CameraError::PermissionDenied {
                path: PathBuf::new(),
            }
            .message_key(),
            CameraError::NoDevice.message_key(),
            CameraError::Device {
                message: String::new(),
            }
            .message_key(),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn mjpeg_splitter_yields_newest_complete_frame() {
        let mut splitter = MjpegSplitter::default();
        assert_eq!(splitter.push(&[0x00, 0xff, 0xd8, 0x01]), None);
        assert_eq!(
            splitter.push(&[0x02, 0xff, 0xd9, 0xff, 0xd8, 0x03, 0xff, 0xd9, 0xff]),
            Some(vec![0xff, 0xd8, 0x03, 0xff, 0xd9])
        );
        assert_eq!(
            splitter.push(&[0xd8, 0x04, 0xff, 0xd9]),
            Some(vec![0xff, 0xd8, 0x04, 0xff, 0xd9])
        );
        assert_eq!(splitter.push(&[0x10, 0x20]), None);
    }
}
