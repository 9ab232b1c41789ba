use crate::acquisition::ImagePayload;
use crate::analysis::ScouterResult;

/// Tag of the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Idle,
    CameraActive,
    Loading,
    Result,
    Error,
}

impl AppState {
    /// New images are only accepted outside of `Loading`.
    pub fn accepts_acquisition(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// What the presentation layer renders; exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    CameraActive {
        error_key: Option<&'static str>,
    },
    Loading {
        image: ImagePayload,
    },
    Result {
        result: ScouterResult,
        image: ImagePayload,
    },
    Error {
        message_key: &'static str,
        image: ImagePayload,
    },
}

impl ViewState {
    pub fn tag(&self) -> AppState {
        match self {
            Self::Idle => AppState::Idle,
            Self::CameraActive { .. } => AppState::CameraActive,
            Self::Loading { .. } => AppState::Loading,
            Self::Result { .. } => AppState::Result,
            Self::Error { .. } => AppState::Error,
        }
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        match self {
            Self::Loading { image } | Self::Result { image, .. } | Self::Error { image, .. } => {
                Some(image)
            }
            Self::Idle | Self::CameraActive { .. } => None,
        }
    }
}
