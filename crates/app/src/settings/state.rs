use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "tnai";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const STORAGE_FILE_NAME: &str = "tnai.db";
pub const ENV_PREFIX: &str = "TNAI_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub storage_path: PathBuf,
    pub session_validity_days: i64,
    pub free_text_reply_delay_ms: u64,
    pub adventure_reply_delay_ms: u64,
    pub faq_reply_delay_ms: u64,
    pub sign_in_latency_ms: u64,
    pub registration_latency_ms: u64,
    pub max_message_chars: usize,
    pub min_password_len: usize,
    pub daily_token_limit: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_path: SettingsStore::default_config_dir().join(STORAGE_FILE_NAME),
            session_validity_days: 7,
            free_text_reply_delay_ms: 2_000,
            adventure_reply_delay_ms: 1_500,
            faq_reply_delay_ms: 1_000,
            sign_in_latency_ms: 1_500,
            registration_latency_ms: 2_000,
            max_message_chars: 2_000,
            min_password_len: 6,
            daily_token_limit: 10_000,
        }
    }
}

impl AppSettings {
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.storage_path.as_os_str().is_empty() {
            self.storage_path = defaults.storage_path;
        }
        // A zero-day window would expire every session on the next start.
        if self.session_validity_days < 1 {
            self.session_validity_days = defaults.session_validity_days;
        }
        if self.max_message_chars == 0 {
            self.max_message_chars = defaults.max_message_chars;
        }
        if self.min_password_len == 0 {
            self.min_password_len = defaults.min_password_len;
        }
        self
    }

    pub fn free_text_reply_delay(&self) -> Duration {
        Duration::from_millis(self.free_text_reply_delay_ms)
    }

    pub fn adventure_reply_delay(&self) -> Duration {
        Duration::from_millis(self.adventure_reply_delay_ms)
    }

    pub fn faq_reply_delay(&self) -> Duration {
        Duration::from_millis(self.faq_reply_delay_ms)
    }

    pub fn sign_in_latency(&self) -> Duration {
        Duration::from_millis(self.sign_in_latency_ms)
    }

    pub fn registration_latency(&self) -> Duration {
        Duration::from_millis(self.registration_latency_ms)
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".tnai"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_sources(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    /// Wraps already-built settings without touching disk or the environment.
    pub fn in_memory(settings: AppSettings, config_path: PathBuf) -> Self {
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings.normalized())),
            config_path,
        }
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn update(&self, settings: AppSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_sources(path: &Path) -> AppSettings {
        if !path.exists() {
            tracing::info!(path = ?path, "settings file not found, using defaults and environment");
        }

        let figment = Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        match figment.extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(path = ?path, error = %error, "failed to parse settings, using defaults");
                AppSettings::default()
            }
        }
    }

    fn persist(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!(path = ?self.config_path, "saved settings");
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "faq_reply_delay_ms": 250, "min_password_len": 8 }"#).unwrap();

        let store = SettingsStore::new(path);
        let settings = store.settings();

        assert_eq!(settings.faq_reply_delay(), Duration::from_millis(250));
        assert_eq!(settings.min_password_len, 8);
        assert_eq!(settings.max_message_chars, 2_000);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "faq_reply_delay_ms": "soon" }"#).unwrap();

        let store = SettingsStore::new(path);

        assert_eq!(store.settings().faq_reply_delay_ms, 1_000);
    }

    #[test]
    fn update_persists_and_reloads() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("nested").join(SETTINGS_FILE_NAME);
        let store = SettingsStore::new(path.clone());

        let mut settings = AppSettings::clone(&store.settings());
        settings.session_validity_days = 0;
        settings.daily_token_limit = 500;
        store.update(settings).unwrap();

        let reloaded = SettingsStore::new(path);
        assert_eq!(reloaded.settings().daily_token_limit, 500);
        assert_eq!(reloaded.settings().session_validity_days, 7);
    }
}
