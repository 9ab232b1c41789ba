use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use thiserror::Error;

pub mod camera;

const IMAGE_MIME_PREFIX: &str = "image/";
const DATA_URL_PREFIX: &str = "data:";
const DATA_URL_BASE64_MARKER: &str = ";base64,";
/// Enough leading bytes for `image::guess_format` to recognize every format it knows.
const SNIFF_HEADER_BYTES: u64 = 64;
/// Larger files are refused before being read.
pub const MAX_IMAGE_FILE_BYTES: u64 = 32 * 1024 * 1024;

/// MIME types offered by the file picker filter.
pub const UPLOAD_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("not an image type: {mime_type}")]
    NotAnImage { mime_type: String },
    #[error("failed to read image file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid image reference: {message}")]
    InvalidReference { message: String },
    #[error("image file {path} is {bytes} bytes, above the {limit} byte limit")]
    TooLarge { path: String, bytes: u64, limit: u64 },
}

pub type AcquisitionResult<T> = std::result::Result<T, AcquisitionError>;

/// The image currently submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: &str) -> AcquisitionResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AcquisitionError::EmptyPayload);
        }
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !is_image_mime(&mime_type) {
            return Err(AcquisitionError::NotAnImage { mime_type });
        }
        Ok(Self { bytes, mime_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Displayable, persistable `data:` reference.
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!(
            "{DATA_URL_PREFIX}{}{DATA_URL_BASE64_MARKER}{encoded}",
            self.mime_type
        )
    }

    pub fn from_data_url(reference: &str) -> AcquisitionResult<Self> {
        let invalid = |message: &str| AcquisitionError::InvalidReference {
            message: message.to_string(),
        };
        let rest = reference
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| invalid("missing data: prefix"))?;
        let (mime_type, encoded) = rest
            .split_once(DATA_URL_BASE64_MARKER)
            .ok_or_else(|| invalid("missing base64 marker"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| AcquisitionError::InvalidReference {
                message: err.to_string(),
            })?;
        Self::new(bytes, mime_type)
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .starts_with(IMAGE_MIME_PREFIX)
}

/// Single entry point shared by every acquisition path.
pub fn submit(bytes: Vec<u8>, mime_type: &str) -> AcquisitionResult<ImagePayload> {
    let payload = ImagePayload::new(bytes, mime_type)?;
    tracing::debug!(
        mime = payload.mime_type(),
        bytes = payload.len(),
        "image acquired"
    );
    Ok(payload)
}

/// MIME type declared by a file's extension.
pub fn declared_mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "txt" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// MIME type sniffed from the bytes themselves.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(format.to_mime_type())
}

/// Load a picked or dropped file. Non-image files, directories and devices
/// yield `Ok(None)`; only a bounded header is read before the type is known.
pub fn load_file(path: &Path) -> AcquisitionResult<Option<ImagePayload>> {
    let declared = declared_mime_for_path(path);
    if declared.is_some_and(|mime| !is_image_mime(mime)) {
        tracing::debug!(path = %path.display(), "ignoring non-image file");
        return Ok(None);
    }

    let read_err = |source| AcquisitionError::ReadFile {
        path: path.display().to_string(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(read_err)?;
    if !metadata.is_file() {
        tracing::debug!(path = %path.display(), "ignoring non-regular file");
        return Ok(None);
    }

    let mut file = File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    (&mut file)
        .take(SNIFF_HEADER_BYTES)
        .read_to_end(&mut bytes)
        .map_err(read_err)?;
    let Some(mime_type) = declared.or_else(|| sniff_mime(&bytes)) else {
        tracing::debug!(path = %path.display(), "ignoring file without an image type");
        return Ok(None);
    };

    if metadata.len() > MAX_IMAGE_FILE_BYTES {
        return Err(AcquisitionError::TooLarge {
            path: path.display().to_string(),
            bytes: metadata.len(),
            limit: MAX_IMAGE_FILE_BYTES,
        });
    }
    (&mut file)
        .take(MAX_IMAGE_FILE_BYTES)
        .read_to_end(&mut bytes)
        .map_err(read_err)?;
    submit(bytes, mime_type).map(Some)
}

/// Pasted textures are re-encoded to this type before submission.
pub const PASTED_IMAGE_MIME: &str = "image/png";

/// First image MIME type among those a clipboard advertises. A paste is
/// ignored unless this finds one.
pub fn first_image_mime<'a, I>(mime_types: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    mime_types.into_iter().find(|mime| is_image_mime(mime))
}

/// Whole-window drag tracking. Enter/leave pairs do not reliably match across
/// nested widgets, so a depth counter decides overlay visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragTracker {
    depth: usize,
}

impl DragTracker {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn enter(&mut self) {
        self.depth += 1;
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn drop_received(&mut self) {
        self.depth = 0;
    }

    pub fn overlay_visible(&self, acquisition_enabled: bool) -> bool {
        acquisition_enabled && self.depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn submit_rejects_empty_and_non_image_payloads() {
        assert!(matches!(
            submit(Vec::new(), "image/png"),
            Err(AcquisitionError::EmptyPayload)
        ));
        assert!(matches!(
            submit(b"hello".to_vec(), "text/plain"),
            Err(AcquisitionError::NotAnImage { .. })
        ));
        let payload = submit(PNG_MAGIC.to_vec(), "Image/PNG").expect("png accepted");
        assert_eq!(payload.mime_type(), "image/png");
    }

    #[test]
    fn data_url_survives_a_round_trip() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), "image/png").unwrap();
        let url = payload.data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(ImagePayload::from_data_url(&url).unwrap(), payload);
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for reference in [
            "https://example.com/a.png",
            "data:image/png,rawbytes",
            "data:image/png;base64,***",
            "data:text/plain;base64,aGVsbG8=",
        ] {
            assert!(ImagePayload::from_data_url(reference).is_err(), "{reference}");
        }
    }

    #[test]
    fn load_file_ignores_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"not an image").unwrap();
        assert!(load_file(&text).unwrap().is_none());

        let unknown = dir.path().join("blob");
        std::fs::write(&unknown, b"not an image either").unwrap();
        assert!(load_file(&unknown).unwrap().is_none());
    }

    #[test]
    fn load_file_uses_extension_then_sniffs() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = dir.path().join("photo.JPG");
        std::fs::write(&jpeg, [0xff, 0xd8, 0xff, 0xe0]).unwrap();
        let payload = load_file(&jpeg).unwrap().expect("jpeg accepted");
        assert_eq!(payload.mime_type(), "image/jpeg");

        let bare = dir.path().join("capture");
        std::fs::write(&bare, PNG_MAGIC).unwrap();
        let payload = load_file(&bare).unwrap().expect("png sniffed");
        assert_eq!(payload.mime_type(), "image/png");
    }

    #[test]
    fn paste_is_gated_on_an_advertised_image_type() {
        assert_eq!(
            first_image_mime(["text/uri-list", "image/png", "image/jpeg"]),
            Some("image/png")
        );
        assert_eq!(
            first_image_mime(["text/plain;charset=utf-8", "IMAGE/WEBP"]),
            Some("IMAGE/WEBP")
        );
        assert_eq!(first_image_mime(["text/plain", "text/html"]), None);
        assert_eq!(first_image_mime(std::iter::empty::<&str>()), None);

        let payload = submit(PNG_MAGIC.to_vec(), PASTED_IMAGE_MIME).expect("pasted png");
        assert_eq!(payload.mime_type(), "image/png");
    }

    #[test]
    fn load_file_stops_at_the_header_of_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("holiday.mp4");
        File::create(&video).unwrap().set_len(1 << 30).unwrap();
        assert!(load_file(&video).unwrap().is_none());
    }

    #[test]
    fn load_file_ignores_directories_and_devices() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("clip.mov");
        std::fs::create_dir(&folder).unwrap();
        assert!(load_file(&folder).unwrap().is_none());

        #[cfg(unix)]
        {
            let endless = dir.path().join("endless.mp4");
            std::os::unix::fs::symlink("/dev/zero", &endless).unwrap();
            assert!(load_file(&endless).unwrap().is_none());

            let fake_photo = dir.path().join("fake.png");
            std::os::unix::fs::symlink("/dev/zero", &fake_photo).unwrap();
            assert!(load_file(&fake_photo).unwrap().is_none());
        }
    }

    #[test]
    fn oversized_images_are_refused_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("poster.png");
        File::create(&poster)
            .unwrap()
            .set_len(MAX_IMAGE_FILE_BYTES + 1)
            .unwrap();
        assert!(matches!(
            load_file(&poster),
            Err(AcquisitionError::TooLarge { .. })
        ));
    }

    #[test]
    fn drag_tracker_counts_nested_enters() {
        let mut tracker = DragTracker::default();
        tracker.enter();
        tracker.enter();
        tracker.leave();
        assert!(tracker.overlay_visible(true));
        assert!(!tracker.overlay_visible(false));

        tracker.leave();
        tracker.leave();
        assert_eq!(tracker.depth(), 0);
        assert!(!tracker.overlay_visible(true));

        tracker.enter();
        tracker.enter();
        tracker.drop_received();
        assert!(!tracker.overlay_visible(true));
    }

    #[test]
    fn upload_filter_lists_supported_types() {
        assert!(UPLOAD_MIME_TYPES.iter().all(|mime| is_image_mime(mime)));
    }
}
