use crate::acquisition::camera::CameraError;
use crate::acquisition::ImagePayload;
use crate::analysis::{self, AnalysisResult, ModelConfig, ScouterResult};
use crate::i18n::Language;
use crate::preferences::{Preferences, PreferencesStore};

use super::{AppEvent, AppState, StateMachine, ViewState};

type Listener = Box<dyn Fn(&ViewState)>;

/// User-chosen settings as currently applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub api_key: String,
    pub language: Language,
    pub model: ModelConfig,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: Language::default(),
            model: analysis::default_model(),
        }
    }
}

/// Everything a worker needs for one analysis call. The generation pins the
/// ticket to the view that issued it.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub image: ImagePayload,
    pub model: ModelConfig,
    pub language: Language,
    pub api_key: String,
}

pub struct ScouterController<S: PreferencesStore> {
    machine: StateMachine,
    view: ViewState,
    generation: u64,
    preferences: Preferences<S>,
    settings: SettingsSnapshot,
    listeners: Vec<Listener>,
}

impl<S: PreferencesStore> ScouterController<S> {
    /// Load settings from `preferences` (unset values take `defaults`) and
    /// warm-start into `Result` when a cached scan decodes.
    pub fn restore(preferences: Preferences<S>, defaults: SettingsSnapshot) -> Self {
        let settings = SettingsSnapshot {
            api_key: preferences.api_key(),
            language: preferences.language().unwrap_or(defaults.language),
            model: preferences.model().unwrap_or(defaults.model),
        };
        let mut controller = Self {
            machine: StateMachine::new(),
            view: ViewState::Idle,
            generation: 0,
            preferences,
            settings,
            listeners: Vec::new(),
        };

        if let Some(scan) = controller.preferences.cached_scan() {
            if controller.machine.transition(AppEvent::RestoreCached).is_ok() {
                tracing::info!(
                    power_level = scan.result.power_level,
                    "restored cached scan"
                );
                controller.view = ViewState::Result {
                    result: scan.result,
                    image: scan.image,
                };
            }
        }
        controller
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> AppState {
        self.machine.state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.preferences
    }

    /// Whether a new image would be accepted right now.
    pub fn acquisition_enabled(&self) -> bool {
        self.machine.can_transition(AppEvent::SubmitImage)
    }

    /// Register an observer; it is called after every view change.
    pub fn subscribe(&mut self, listener: impl Fn(&ViewState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn apply(&mut self, event: AppEvent, view: ViewState) -> bool {
        if self.machine.transition(event).is_err() {
            return false;
        }
        self.view = view;
        self.notify();
        true
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.view);
        }
    }

    pub fn open_camera(&mut self) -> bool {
        self.apply(AppEvent::OpenCamera, ViewState::CameraActive { error_key: None })
    }

    /// Keep the camera view but surface the device failure.
    pub fn camera_failed(&mut self, err: &CameraError) {
        if self.state() != AppState::CameraActive {
            return;
        }
        tracing::warn!(%err, "camera unavailable");
        self.view = ViewState::CameraActive {
            error_key: Some(err.message_key()),
        };
        self.notify();
    }

    pub fn close_camera(&mut self) -> bool {
        self.apply(AppEvent::CloseCamera, ViewState::Idle)
    }

    /// Enter `Loading` with `image`; `None` while an analysis is already in flight.
    pub fn begin_analysis(&mut self, image: ImagePayload) -> Option<AnalysisTicket> {
        if !self.acquisition_enabled() {
            tracing::debug!("ignoring image while analysis is in flight");
            return None;
        }
        if !self.apply(
            AppEvent::SubmitImage,
            ViewState::Loading {
                image: image.clone(),
            },
        ) {
            return None;
        }
        self.generation += 1;
        Some(AnalysisTicket {
            generation: self.generation,
            image,
            model: self.settings.model,
            language: self.settings.language,
            api_key: self.settings.api_key.clone(),
        })
    }

    /// Apply an analysis outcome. Returns `false` when the ticket is stale.
    pub fn finish_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: AnalysisResult<ScouterResult>,
    ) -> bool {
        if ticket.generation != self.generation || self.state() != AppState::Loading {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale analysis outcome"
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                if let Err(err) = self.preferences.save_cached_scan(&result, &ticket.image) {
                    tracing::warn!(%err, "failed to cache scan result");
                }
                self.apply(
                    AppEvent::AnalysisSucceeded,
                    ViewState::Result {
                        result,
                        image: ticket.image.clone(),
                    },
                )
            }
            Err(err) => {
                tracing::warn!(%err, "analysis failed");
                self.apply(
                    AppEvent::AnalysisFailed,
                    ViewState::Error {
                        message_key: err.message_key(),
                        image: ticket.image.clone(),
                    },
                )
            }
        }
    }

    /// Back to `Idle`, dropping the image and the persisted scan. Any
    /// in-flight ticket becomes stale.
    pub fn reset(&mut self) -> bool {
        self.generation += 1;
        if let Err(err) = self.preferences.clear_cached_scan() {
            tracing::warn!(%err, "failed to clear cached scan");
        }
        self.apply(AppEvent::Reset, ViewState::Idle)
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        let api_key = api_key.trim();
        if self.settings.api_key == api_key {
            return;
        }
        self.settings.api_key = api_key.to_string();
        if let Err(err) = self.preferences.set_api_key(api_key) {
            tracing::warn!(%err, "failed to persist API key");
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
        if let Err(err) = self.preferences.set_language(language) {
            tracing::warn!(%err, "failed to persist language");
        }
    }

    pub fn set_model(&mut self, model: ModelConfig) {
        self.settings.model = model;
        if let Err(err) = self.preferences.set_model(&model) {
            tracing::warn!(%err, "failed to persist model");
        }
    }
}
