use crate::analysis;
use crate::config::AppConfig;
use crate::i18n::{Language, Localizer};
use crate::preferences::{
    FilePreferencesStore, MemoryPreferencesStore, Preferences, PreferencesStore,
};
use crate::state::{ScouterController, SettingsSnapshot};

use super::worker::AnalysisSettings;

pub(super) type SharedStore = Box<dyn PreferencesStore>;
pub(super) type Controller = ScouterController<SharedStore>;

pub(super) struct AppBootstrap {
    pub(super) config: AppConfig,
    pub(super) controller: Controller,
    pub(super) localizer: Localizer,
    pub(super) analysis: AnalysisSettings,
}

pub(super) fn bootstrap_app_runtime(config: AppConfig) -> AppBootstrap {
    let defaults = default_settings(&config);
    let controller = ScouterController::restore(Preferences::new(open_store()), defaults);
    let settings = controller.settings();
    tracing::info!(
        language = settings.language.code(),
        model = settings.model.id,
        has_api_key = !settings.api_key.is_empty(),
        state = ?controller.state(),
        "restored preferences"
    );

    let localizer = Localizer::with_locales_dir(settings.language, config.locales_dir.clone());
    let analysis = AnalysisSettings {
        api_base: config.api_base_override(),
        timeout: config.request_timeout(),
        fallback_api_key: config.fallback_api_key(),
    };

    AppBootstrap {
        config,
        controller,
        localizer,
        analysis,
    }
}

fn open_store() -> SharedStore {
    match FilePreferencesStore::with_default_path() {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "opened preferences");
            Box::new(store)
        }
        Err(err) => {
            tracing::warn!(%err, "preferences unavailable; settings will not persist");
            Box::new(MemoryPreferencesStore::new())
        }
    }
}

/// Values used until the user picks something in settings.
pub(super) fn default_settings(config: &AppConfig) -> SettingsSnapshot {
    let language = config
        .language
        .as_deref()
        .and_then(Language::from_code)
        .unwrap_or_else(Language::detect);
    let model = config
        .default_model
        .as_deref()
        .map(analysis::find_model)
        .unwrap_or_else(analysis::default_model);

    SettingsSnapshot {
        api_key: String::new(),
        language,
        model,
    }
}

/// Pass only argv[0] to GTK so it does not try to parse unknown flags.
pub(super) fn gtk_launch_args() -> Vec<String> {
    std::env::args().take(1).collect()
}
