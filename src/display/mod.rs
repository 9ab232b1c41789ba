use crate::acquisition::ImagePayload;
use crate::i18n::Localizer;
use crate::state::ViewState;

/// Stack page shown for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Uploader,
    Camera,
    Scan,
}

impl Page {
    pub fn name(self) -> &'static str {
        match self {
            Self::Uploader => "uploader",
            Self::Camera => "camera",
            Self::Scan => "scan",
        }
    }
}

/// Everything the window needs to render one [`ViewState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub page: Page,
    pub image: Option<ImagePayload>,
    pub loading: bool,
    pub power_level: Option<String>,
    pub reasoning: Option<String>,
    pub error: Option<String>,
    pub camera_error: Option<String>,
    pub reset_label: String,
    pub reset_sensitive: bool,
    pub export_sensitive: bool,
    pub acquisition_enabled: bool,
}

impl ViewModel {
    pub fn from_state(view: &ViewState, localizer: &Localizer) -> Self {
        let mut model = Self {
            page: Page::Uploader,
            image: view.image().cloned(),
            loading: false,
            power_level: None,
            reasoning: None,
            error: None,
            camera_error: None,
            reset_label: localizer.t("display.resetButton.default").to_string(),
            reset_sensitive: true,
            export_sensitive: false,
            acquisition_enabled: view.tag().accepts_acquisition(),
        };

        match view {
            ViewState::Idle => {}
            ViewState::CameraActive { error_key } => {
                model.page = Page::Camera;
                model.camera_error = error_key.map(|key| localizer.t(key).to_string());
            }
            ViewState::Loading { .. } => {
                model.page = Page::Scan;
                model.loading = true;
                model.reset_label = localizer.t("display.resetButton.loading").to_string();
                model.reset_sensitive = false;
            }
            ViewState::Result { result, .. } => {
                model.page = Page::Scan;
                model.power_level = Some(format_power_level(result.power_level));
                model.reasoning = Some(format!("\"{}\"", result.reasoning));
                model.export_sensitive = true;
            }
            ViewState::Error { message_key, .. } => {
                model.page = Page::Scan;
                model.error = Some(localizer.t(message_key).to_string());
            }
        }
        model
    }
}

/// Group digits in thousands: `9001` becomes `9,001`.
pub fn format_power_level(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ScouterResult;
    use crate::i18n::Language;

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xff, 0xd8, 0xff, 0xd9], "image/jpeg").unwrap()
    }

    #[test]
    fn power_levels_are_grouped_in_thousands() {
        assert_eq!(format_power_level(0), "0");
        assert_eq!(format_power_level(999), "999");
        assert_eq!(format_power_level(9001), "9,001");
        assert_eq!(format_power_level(1_234_567), "1,234,567");
    }

    #[test]
    fn result_view_shows_score_and_quoted_reasoning() {
        let localizer = Localizer::new(Language::English);
        let view = ViewState::Result {
            result: ScouterResult {
                power_level: 9001,
                reasoning: "Over nine thousand".to_string(),
            },
            image: image(),
        };
        let model = ViewModel::from_state(&view, &localizer);
        assert_eq!(model.page, Page::Scan);
        assert_eq!(model.power_level.as_deref(), Some("9,001"));
        assert_eq!(model.reasoning.as_deref(), Some("\"Over nine thousand\""));
        assert!(model.export_sensitive);
        assert!(model.acquisition_enabled);
    }

    #[test]
    fn loading_view_disables_reset_and_acquisition() {
        let localizer = Localizer::new(Language::English);
        let model = ViewModel::from_state(&ViewState::Loading { image: image() }, &localizer);
        assert!(model.loading);
        assert!(!model.reset_sensitive);
        assert!(!model.acquisition_enabled);
        assert!(!model.export_sensitive);
        assert_eq!(model.reset_label, localizer.t("display.resetButton.loading"));
    }

    #[test]
    fn error_and_camera_messages_are_localized() {
        let localizer = Localizer::new(Language::Chinese);
        let error = ViewModel::from_state(
            &ViewState::Error {
                message_key: "error.apiKeyMissing",
                image: image(),
            },
            &localizer,
        );
        assert_eq!(error.error.as_deref(), Some(localizer.t("error.apiKeyMissing")));
        assert!(error.image.is_some());

        let camera = ViewModel::from_state(
            &ViewState::CameraActive {
                error_key: Some("camera.error.noDevice"),
            },
            &localizer,
        );
        assert_eq!(camera.page, Page::Camera);
        assert_eq!(
            camera.camera_error.as_deref(),
            Some(localizer.t("camera.error.noDevice"))
        );
    }

    #[test]
    fn idle_view_has_no_image() {
        let model = ViewModel::from_state(&ViewState::Idle, &Localizer::default());
        assert_eq!(model.page, Page::Uploader);
        assert!(model.image.is_none());
        assert_eq!(Page::Uploader.name(), "uploader");
    }
}
