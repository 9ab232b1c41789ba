use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use super::{
    CameraBackend, CameraDevice, CameraError, CameraFrame, CameraHandle, CameraResult,
    MjpegSplitter,
};
use crate::acquisition::ImagePayload;

const SYSFS_VIDEO_CLASS: &str = "/sys/class/video4linux";
const DEV_DIR: &str = "/dev";
const FFMPEG_COMMAND: &str = "ffmpeg";
const PREVIEW_FPS: &str = "10";
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Video4Linux cameras, streamed through `ffmpeg` as MJPEG.
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    sysfs_root: Option<PathBuf>,
}

impl V4l2Backend {
    pub fn with_sysfs_root(root: PathBuf) -> Self {
        Self {
            sysfs_root: Some(root),
        }
    }

    fn sysfs_root(&self) -> &Path {
        self.sysfs_root
            .as_deref()
            .unwrap_or_else(|| Path::new(SYSFS_VIDEO_CLASS))
    }
}

impl CameraBackend for V4l2Backend {
    type Handle = V4l2Handle;

    fn devices(&self) -> CameraResult<Vec<CameraDevice>> {
        let entries = match std::fs::read_dir(self.sysfs_root()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(CameraError::Device {
                    message: format!("failed to list video devices: {err}"),
                })
            }
        };

        let mut devices = entries
            .filter_map(Result::ok)
            .filter_map(|entry| device_from_sysfs(&entry.path()))
            .collect::<Vec<_>>();
        devices.sort_by_key(|(number, _)| *number);
        Ok(devices.into_iter().map(|(_, device)| device).collect())
    }

    fn open(&self, device: &CameraDevice) -> CameraResult<V4l2Handle> {
        let file = open_device_file(&device.path)?;
        V4l2Handle::spawn(device, file)
    }
}

/// Capture node entry under sysfs, skipping metadata nodes (`index` != 0).
fn device_from_sysfs(entry: &Path) -> Option<(u32, CameraDevice)> {
    let node = entry.file_name()?.to_str()?;
    let number = node.strip_prefix("video")?.parse::<u32>().ok()?;

    if let Ok(index) = std::fs::read_to_string(entry.join("index")) {
        if index.trim() != "0" {
            return None;
        }
    }
    let name = std::fs::read_to_string(entry.join("name"))
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|_| node.to_string());

    Some((
        number,
        CameraDevice {
            path: Path::new(DEV_DIR).join(node),
            name,
        },
    ))
}

fn open_device_file(path: &Path) -> CameraResult<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|err| map_open_error(path, &err))
}

fn map_open_error(path: &Path, err: &io::Error) -> CameraError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => CameraError::PermissionDenied {
            path: path.to_path_buf(),
        },
        io::ErrorKind::NotFound => CameraError::NoDevice,
        _ => CameraError::Device {
            message: format!("failed to open {}: {err}", path.display()),
        },
    }
}

#[derive(Debug, Default)]
struct StreamState {
    frame: Option<CameraFrame>,
    failure: Option<String>,
}

fn lock_state(state: &Mutex<StreamState>) -> MutexGuard<'_, StreamState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open device plus the `ffmpeg` child feeding frames into shared state.
pub struct V4l2Handle {
    device_file: Option<File>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    state: Arc<Mutex<StreamState>>,
    stopping: Arc<AtomicBool>,
}

impl V4l2Handle {
    fn spawn(device: &CameraDevice, device_file: File) -> CameraResult<Self> {
        let mut child = Command::new(FFMPEG_COMMAND)
            .args(["-hide_banner", "-loglevel", "error", "-f", "v4l2", "-i"])
            .arg(&device.path)
            .args([
                "-r",
                PREVIEW_FPS,
                "-f",
                "image2pipe",
                "-vcodec",
                "mjpeg",
                "-q:v",
                "5",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| CameraError::Device {
                message: format!("failed to run {FFMPEG_COMMAND}: {err}"),
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CameraError::Device {
                message: format!("{FFMPEG_COMMAND} stdout unavailable"),
            });
        };

        let state = Arc::new(Mutex::new(StreamState::default()));
        let stopping = Arc::new(AtomicBool::new(false));
        let reader = {
            let state = state.clone();
            let stopping = stopping.clone();
            std::thread::spawn(move || pump_frames(stdout, &state, &stopping))
        };

        Ok(Self {
            device_file: Some(device_file),
            child: Some(child),
            reader: Some(reader),
            state,
            stopping,
        })
    }
}

fn pump_frames(mut stdout: impl Read, state: &Mutex<StreamState>, stopping: &AtomicBool) {
    let mut splitter = MjpegSplitter::default();
    let mut buffer = vec![0_u8; READ_CHUNK_BYTES];
    let mut sequence = 0_u64;

    let failure = loop {
        match stdout.read(&mut buffer) {
            Ok(0) => break "camera stream ended".to_string(),
            Ok(read) => {
                let Some(frame) = splitter.push(&buffer[..read]) else {
                    continue;
                };
                let Ok(payload) = ImagePayload::new(frame, "image/jpeg") else {
                    continue;
                };
                sequence += 1;
                lock_state(state).frame = Some(CameraFrame { sequence, payload });
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => break format!("camera stream read failed: {err}"),
        }
    };

    if !stopping.load(Ordering::SeqCst) {
        tracing::warn!(%failure, "camera stream stopped unexpectedly");
        lock_state(state).failure = Some(failure);
    }
}

impl CameraHandle for V4l2Handle {
    fn latest_frame(&self) -> Option<CameraFrame> {
        lock_state(&self.state).frame.clone()
    }

    fn health(&self) -> CameraResult<()> {
        match &lock_state(&self.state).failure {
            Some(message) => Err(CameraError::Device {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                tracing::debug!(?err, "camera stream process already exited");
            }
            let _ = child.wait();
        }
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!("camera reader thread panicked");
            }
        }
        self.device_file.take();
    }
}

impl Drop for V4l2Handle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_node(root: &Path, node: &str, name: &str, index: &str) {
        let dir = root.join(node);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        std::fs::write(dir.join("index"), format!("{index}\n")).unwrap();
    }

    #[test]
    fn devices_are_listed_in_order_without_metadata_nodes() {
        let root = tempfile::tempdir().unwrap();
        write_node(root.path(), "video2", "Rear Camera", "0");
        write_node(root.path(), "video1", "Front Camera", "1");
        write_node(root.path(), "video0", "Front Camera", "0");
        std::fs::create_dir_all(root.path().join("v4l-subdev0")).unwrap();

        let backend = V4l2Backend::with_sysfs_root(root.path().to_path_buf());
        let devices = backend.devices().expect("devices listed");

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].path, PathBuf::from("/dev/video0"));
        assert_eq!(devices[1].name, "Rear Camera");
    }

    #[test]
    fn missing_sysfs_means_no_devices() {
        let backend = V4l2Backend::with_sysfs_root(PathBuf::from("/nonexistent/video4linux"));
        assert!(backend.devices().expect("empty list").is_empty());
    }

    #[test]
    fn open_errors_map_to_distinct_camera_errors() {
        let path = Path::new("/dev/video0");
        assert!(matches!(
            map_open_error(path, &io::Error::from(io::ErrorKind::PermissionDenied)),
            CameraError::PermissionDenied { .. }
        ));
        assert_eq!(
            map_open_error(path, &io::Error::from(io::ErrorKind::NotFound)),
            CameraError::NoDevice
        );
        assert!(matches!(
            map_open_error(path, &io::Error::other("busy")),
            CameraError::Device { .. }
        ));
    }

    #[test]
    fn pump_frames_publishes_latest_frame_and_reports_end_of_stream() {
        let stream: &[u8] = &[0xff, 0xd8, 0x01, 0xff, 0xd9, 0xff, 0xd8, 0x02, 0xff, 0xd9];
        let state = Mutex::new(StreamState::default());
        let stopping = AtomicBool::new(false);

        pump_frames(stream, &state, &stopping);

        let state = lock_state(&state);
        let frame = state.frame.as_ref().expect("frame published");
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.payload.bytes(), &[0xff, 0xd8, 0x02, 0xff, 0xd9]);
        assert!(state.failure.is_some());
    }
}
