use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::acquisition::ImagePayload;
use crate::analysis::{self, ModelConfig, ScouterResult};
use crate::config::{app_data_path, data_env_dirs, APP_DIR};
use crate::i18n::Language;

const PREFERENCES_FILE: &str = "preferences.json";

pub const KEY_API_KEY: &str = "geminiApiKey";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_MODEL: &str = "selectedModel";
pub const KEY_CACHED_RESULT: &str = "cachedScouterData";
pub const KEY_CACHED_IMAGE: &str = "cachedImageUrl";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type PreferencesResult<T> = std::result::Result<T, PreferencesError>;

/// String key/value persistence. A missing key is a valid "unset" state.
pub trait PreferencesStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> PreferencesResult<()>;
    fn remove(&self, key: &str) -> PreferencesResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferencesStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferencesStore for MemoryPreferencesStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PreferencesResult<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PreferencesResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: PreferencesStore + ?Sized> PreferencesStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> PreferencesResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> PreferencesResult<()> {
        (**self).remove(key)
    }
}

/// Keys too large to share the settings file; each lives in `<key>.txt` beside it.
const SIDECAR_KEYS: [&str; 1] = [KEY_CACHED_IMAGE];

fn is_sidecar_key(key: &str) -> bool {
    SIDECAR_KEYS.contains(&key)
}

/// JSON object on disk plus one sidecar file per bulky key. A mutation
/// rewrites only the file that holds the changed key, and unchanged values
/// are not written at all.
#[derive(Debug)]
pub struct FilePreferencesStore {
    path: PathBuf,
    values: RefCell<BTreeMap<String, String>>,
}

impl FilePreferencesStore {
    pub fn open(path: PathBuf) -> Self {
        let mut values = read_values(&path);
        values.retain(|key, _| !is_sidecar_key(key));
        for key in SIDECAR_KEYS {
            let sidecar = sidecar_path(&path, key);
            match fs::read_to_string(&sidecar) {
                Ok(value) => {
                    values.insert(key.to_string(), value);
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(?err, path = %sidecar.display(), "failed to read preference sidecar");
                }
            }
        }
        Self {
            path,
            values: RefCell::new(values),
        }
    }

    pub fn with_default_path() -> PreferencesResult<Self> {
        let (xdg_data_home, home) = data_env_dirs();
        let path = app_data_path(
            APP_DIR,
            PREFERENCES_FILE,
            xdg_data_home.as_deref(),
            home.as_deref(),
        )
        .map_err(|_| PreferencesError::MissingHomeDirectory)?;
        Ok(Self::open(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str) -> PreferencesResult<()> {
        if !is_sidecar_key(key) {
            return self.flush_settings();
        }
        let sidecar = sidecar_path(&self.path, key);
        match self.values.borrow().get(key) {
            Some(value) => write_atomically(&sidecar, value),
            None => match fs::remove_file(&sidecar) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    Err(PreferencesError::Write {
                        path: sidecar,
                        source: err,
                    })
                }
                _ => Ok(()),
            },
        }
    }

    fn flush_settings(&self) -> PreferencesResult<()> {
        let encoded = {
            let values = self.values.borrow();
            let settings = values
                .iter()
                .filter(|(key, _)| !is_sidecar_key(key))
                .collect::<BTreeMap<_, _>>();
            serde_json::to_string_pretty(&settings)?
        };
        write_atomically(&self.path, &encoded)
    }
}

fn sidecar_path(settings_path: &Path, key: &str) -> PathBuf {
    settings_path.with_file_name(format!("{key}.txt"))
}

fn write_atomically(path: &Path, contents: &str) -> PreferencesResult<()> {
    let write_err = |source| PreferencesError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, contents).map_err(write_err)?;
    fs::rename(&staging, path).map_err(write_err)
}

fn read_values(path: &Path) -> BTreeMap<String, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "failed to read preferences; starting empty");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(?err, path = %path.display(), "failed to parse preferences; starting empty");
        BTreeMap::new()
    })
}

impl PreferencesStore for FilePreferencesStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PreferencesResult<()> {
        let previous = self
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        if previous.as_deref() == Some(value) {
            return Ok(());
        }
        self.persist(key)
    }

    fn remove(&self, key: &str) -> PreferencesResult<()> {
        if self.values.borrow_mut().remove(key).is_none() {
            return Ok(());
        }
        self.persist(key)
    }
}

/// Result and image restored from a previous session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedScan {
    pub result: ScouterResult,
    pub image: ImagePayload,
}

/// Typed view over a [`PreferencesStore`].
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: PreferencesStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api_key(&self) -> String {
        self.store.get(KEY_API_KEY).unwrap_or_default()
    }

    pub fn set_api_key(&self, api_key: &str) -> PreferencesResult<()> {
        self.store.set(KEY_API_KEY, api_key.trim())
    }

    pub fn language(&self) -> Option<Language> {
        self.store
            .get(KEY_LANGUAGE)
            .and_then(|code| Language::from_code(&code))
    }

    pub fn set_language(&self, language: Language) -> PreferencesResult<()> {
        self.store.set(KEY_LANGUAGE, language.code())
    }

    pub fn model(&self) -> Option<ModelConfig> {
        self.store
            .get(KEY_MODEL)
            .map(|id| analysis::find_model(&id))
    }

    pub fn set_model(&self, model: &ModelConfig) -> PreferencesResult<()> {
        self.store.set(KEY_MODEL, model.id)
    }

    /// Both cache entries decoded and valid, or `None`. Corrupt entries are dropped.
    pub fn cached_scan(&self) -> Option<CachedScan> {
        let raw_result = self.store.get(KEY_CACHED_RESULT)?;
        let raw_image = self.store.get(KEY_CACHED_IMAGE)?;

        let decoded = ScouterResult::from_model_text(&raw_result)
            .map_err(|err| err.to_string())
            .and_then(|result| {
                ImagePayload::from_data_url(&raw_image)
                    .map(|image| CachedScan { result, image })
                    .map_err(|err| err.to_string())
            });
        match decoded {
            Ok(scan) => Some(scan),
            Err(message) => {
                tracing::warn!(%message, "discarding unreadable cached scan");
                if let Err(err) = self.clear_cached_scan() {
                    tracing::warn!(%err, "failed to clear unreadable cached scan");
                }
                None
            }
        }
    }

    pub fn save_cached_scan(
        &self,
        result: &ScouterResult,
        image: &ImagePayload,
    ) -> PreferencesResult<()> {
        let encoded = serde_json::to_string(result)?;
        self.store.set(KEY_CACHED_RESULT, &encoded)?;
        self.store.set(KEY_CACHED_IMAGE, &image.data_url())
    }

    pub fn clear_cached_scan(&self) -> PreferencesResult<()> {
        self.store.remove(KEY_CACHED_RESULT)?;
        self.store.remove(KEY_CACHED_IMAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan() -> (ScouterResult, ImagePayload) {
        (
            ScouterResult {
                power_level: 9001,
                reasoning: "It's over nine thousand!".to_string(),
            },
            ImagePayload::new(vec![0xff, 0xd8, 0xff, 0xe0], "image/jpeg").unwrap(),
        )
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE);

        let store = FilePreferencesStore::open(path.clone());
        store.set(KEY_API_KEY, "secret").unwrap();
        store.set(KEY_LANGUAGE, "zh").unwrap();
        store.remove(KEY_LANGUAGE).unwrap();

        let reopened = FilePreferencesStore::open(path);
        assert_eq!(reopened.get(KEY_API_KEY).as_deref(), Some("secret"));
        assert_eq!(reopened.get(KEY_LANGUAGE), None);
    }

    #[test]
    fn unparsable_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "{{{").unwrap();

        let store = FilePreferencesStore::open(path);
        assert_eq!(store.get(KEY_API_KEY), None);
        store.set(KEY_API_KEY, "fresh").unwrap();
        assert_eq!(store.get(KEY_API_KEY).as_deref(), Some("fresh"));
    }

    #[test]
    fn typed_accessors_fall_back_to_defaults() {
        let prefs = Preferences::new(MemoryPreferencesStore::new());
        assert_eq!(prefs.api_key(), "");
        assert_eq!(prefs.language(), None);
        assert_eq!(prefs.model(), None);

        prefs.store().set(KEY_LANGUAGE, "klingon").unwrap();
        prefs.store().set(KEY_MODEL, "retired-model").unwrap();
        assert_eq!(prefs.language(), None);
        assert_eq!(prefs.model().map(|m| m.id), Some(analysis::default_model().id));

        prefs.set_api_key("  key  ").unwrap();
        prefs.set_language(Language::Chinese).unwrap();
        assert_eq!(prefs.api_key(), "key");
        assert_eq!(prefs.language(), Some(Language::Chinese));
    }

    #[test]
    fn cached_scan_round_trips() {
        let prefs = Preferences::new(MemoryPreferencesStore::new());
        let (result, image) = scan();
        prefs.save_cached_scan(&result, &image).unwrap();

        let cached = prefs.cached_scan().expect("cache present");
        assert_eq!(cached.result, result);
        assert_eq!(cached.image, image);

        prefs.clear_cached_scan().unwrap();
        assert!(prefs.cached_scan().is_none());
        assert_eq!(prefs.store().get(KEY_CACHED_IMAGE), None);
    }

    #[test]
    fn corrupt_cache_is_discarded_silently() {
        let prefs = Preferences::new(MemoryPreferencesStore::new());
        let (_, image) = scan();
        prefs.store().set(KEY_CACHED_RESULT, "not json").unwrap();
        prefs
            .store()
            .set(KEY_CACHED_IMAGE, &image.data_url())
            .unwrap();

        assert!(prefs.cached_scan().is_none());
        assert_eq!(prefs.store().get(KEY_CACHED_RESULT), None);
        assert_eq!(prefs.store().get(KEY_CACHED_IMAGE), None);
    }

    #[test]
    fn cached_result_with_blank_reasoning_is_corrupt() {
        let prefs = Preferences::new(MemoryPreferencesStore::new());
        let (_, image) = scan();
        prefs
            .store()
            .set(KEY_CACHED_RESULT, r#"{"powerLevel": 5, "reasoning": "   "}"#)
            .unwrap();
        prefs
            .store()
            .set(KEY_CACHED_IMAGE, &image.data_url())
            .unwrap();

        assert!(prefs.cached_scan().is_none());
        assert_eq!(prefs.store().get(KEY_CACHED_RESULT), None);
        assert_eq!(prefs.store().get(KEY_CACHED_IMAGE), None);
    }

    #[test]
    fn cached_image_lives_outside_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let prefs = Preferences::new(FilePreferencesStore::open(path.clone()));
        let (result, image) = scan();
        prefs.save_cached_scan(&result, &image).unwrap();
        prefs.set_api_key("abc").unwrap();

        let settings = fs::read_to_string(&path).unwrap();
        assert!(settings.contains(KEY_CACHED_RESULT));
        assert!(!settings.contains("data:image"));
        let sidecar = sidecar_path(&path, KEY_CACHED_IMAGE);
        assert_eq!(fs::read_to_string(&sidecar).unwrap(), image.data_url());

        let reopened = Preferences::new(FilePreferencesStore::open(path));
        assert_eq!(reopened.cached_scan().map(|scan| scan.image), Some(image));
        reopened.clear_cached_scan().unwrap();
        assert!(!sidecar.exists());
    }

    #[test]
    fn unchanged_values_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let store = FilePreferencesStore::open(path.clone());
        store.set(KEY_API_KEY, "same").unwrap();

        fs::write(&path, "{}").unwrap();
        store.set(KEY_API_KEY, "same").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        store.set(KEY_API_KEY, "changed").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("changed"));
    }

    #[test]
    fn half_written_cache_is_treated_as_absent() {
        let prefs = Preferences::new(MemoryPreferencesStore::new());
        let (result, _) = scan();
        prefs
            .store()
            .set(KEY_CACHED_RESULT, &serde_json::to_string(&result).unwrap())
            .unwrap();
        assert!(prefs.cached_scan().is_none());
    }
}
