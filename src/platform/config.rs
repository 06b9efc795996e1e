// JobRadar - platform/config.rs
//
// Platform-specific data directory resolution, and config.toml loading,
// validation and persistence.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::lemma::AnalyzerKind;
use crate::core::model::{JobProfile, TelegramSettings};
use crate::platform::fs::write_atomic;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolved platform paths for JobRadar data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/jobradar/ or %APPDATA%\JobRadar\config\)
    pub config_dir: PathBuf,

    /// Data directory for the last report and transport sessions.
    pub data_dir: PathBuf,

    /// Transport session files.
    pub sessions_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();
            let sessions_dir = data_dir.join(constants::SESSIONS_DIR_NAME);

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                sessions = %sessions_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
                sessions_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                sessions_dir: fallback.join(constants::SESSIONS_DIR_NAME),
                data_dir: fallback,
            }
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw (de)serialisable shape of config.toml.
///
/// Every field is optional and unknown keys are ignored, so a newer config
/// file can be used with an older binary. Plain keys come before the tables
/// so the serialised file stays valid TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_chats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned_message_links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_depth_days: Option<i64>,
    /// `[telegram]` section.
    pub telegram: TelegramSection,
    /// `[job_profile]` section.
    pub job_profile: JobProfileSection,
    /// `[matching]` section.
    pub matching: MatchingSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// A value users may write either quoted or as a bare integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(i64),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// `[telegram]` config section.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<TextOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// `[job_profile]` config section.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProfileSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_phrases: Option<Vec<String>>,
    /// Categories required, 1-3.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_match_score: Option<i64>,
}

/// `[matching]` config section.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    /// Morphological analyzer: "snowball" or "identity".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults or
/// are clamped into range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub telegram: TelegramSettings,
    /// Source entries as typed by the user (trimmed, original case).
    pub selected_chats: Vec<String>,
    pub banned_message_links: Vec<String>,
    /// Keywords are trimmed and lowercased.
    pub job_profile: JobProfile,
    pub scan_depth_days: u32,
    pub analyzer: AnalyzerKind,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            selected_chats: Vec::new(),
            banned_message_links: Vec::new(),
            job_profile: JobProfile::default(),
            scan_depth_days: constants::DEFAULT_SCAN_DEPTH_DAYS,
            analyzer: AnalyzerKind::default(),
            log_level: None,
            log_file: None,
        }
    }
}

fn normalize_list(values: Option<Vec<String>>, lowercase: bool) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| if lowercase { v.to_lowercase() } else { v })
        .collect()
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl AppConfig {
    /// Validate a raw config, returning the result and non-fatal warnings.
    pub fn from_raw(raw: RawConfig) -> (Self, Vec<String>) {
        let mut warnings: Vec<String> = Vec::new();
        let mut config = AppConfig::default();

        config.telegram = TelegramSettings {
            api_id: raw
                .telegram
                .api_id
                .map(TextOrNumber::into_text)
                .unwrap_or_default(),
            api_hash: trimmed(raw.telegram.api_hash),
            phone_number: trimmed(raw.telegram.phone_number),
        };

        config.selected_chats = normalize_list(raw.selected_chats, false);
        config.banned_message_links = normalize_list(raw.banned_message_links, false);

        let profile = raw.job_profile;
        config.job_profile.title_keywords = normalize_list(profile.title_keywords, true);
        config.job_profile.profile_keywords = normalize_list(profile.profile_keywords, true);
        config.job_profile.industry_keywords = normalize_list(profile.industry_keywords, true);
        config.job_profile.exclusion_phrases = normalize_list(profile.exclusion_phrases, true);

        // -- Job profile: min_match_score --
        if let Some(score) = profile.min_match_score {
            let min = i64::from(constants::MIN_MATCH_SCORE);
            let max = i64::from(constants::MAX_MATCH_SCORE);
            let clamped = score.clamp(min, max);
            if clamped != score {
                warnings.push(format!(
                    "[job_profile] min_match_score = {score} is out of range ({min}-{max}). Using {clamped}.",
                ));
            }
            config.job_profile.min_match_score = clamped as u8;
        }

        // -- scan_depth_days --
        if let Some(days) = raw.scan_depth_days {
            let min = i64::from(constants::MIN_SCAN_DEPTH_DAYS);
            let max = i64::from(constants::MAX_SCAN_DEPTH_DAYS);
            let clamped = days.clamp(min, max);
            if clamped != days {
                warnings.push(format!(
                    "scan_depth_days = {days} is out of range ({min}-{max}). Using {clamped}.",
                ));
            }
            config.scan_depth_days = clamped as u32;
        }

        // -- Matching: analyzer --
        if let Some(ref name) = raw.matching.analyzer {
            match AnalyzerKind::parse(name) {
                Some(kind) => config.analyzer = kind,
                None => warnings.push(format!(
                    "[matching] analyzer = \"{name}\" is not recognised. \
                     Expected \"snowball\" or \"identity\". Using default ({}).",
                    AnalyzerKind::default().as_str(),
                )),
            }
        }

        // -- Logging: level --
        if let Some(ref level) = raw.logging.level {
            let valid = ["error", "warn", "info", "debug", "trace"];
            if valid.contains(&level.to_lowercase().as_str()) {
                config.log_level = Some(level.clone());
            } else {
                warnings.push(format!(
                    "[logging] level = \"{level}\" is not recognised. \
                     Valid values: error, warn, info, debug, trace. Using default (info).",
                ));
            }
        }

        // -- Logging: file --
        if let Some(ref file) = raw.logging.file {
            if !file.trim().is_empty() {
                config.log_file = Some(file.trim().to_string());
            }
        }

        (config, warnings)
    }

    /// Raw shape written back to disk. Every field is emitted so the saved
    /// file documents the available settings.
    pub fn to_raw(&self) -> RawConfig {
        RawConfig {
            selected_chats: Some(self.selected_chats.clone()),
            banned_message_links: Some(self.banned_message_links.clone()),
            scan_depth_days: Some(i64::from(self.scan_depth_days)),
            telegram: TelegramSection {
                api_id: Some(TextOrNumber::Text(self.telegram.api_id.clone())),
                api_hash: Some(self.telegram.api_hash.clone()),
                phone_number: Some(self.telegram.phone_number.clone()),
            },
            job_profile: JobProfileSection {
                title_keywords: Some(self.job_profile.title_keywords.clone()),
                profile_keywords: Some(self.job_profile.profile_keywords.clone()),
                industry_keywords: Some(self.job_profile.industry_keywords.clone()),
                exclusion_phrases: Some(self.job_profile.exclusion_phrases.clone()),
                min_match_score: Some(i64::from(self.job_profile.min_match_score)),
            },
            matching: MatchingSection {
                analyzer: Some(self.analyzer.as_str().to_string()),
            },
            logging: LoggingSection {
                level: self.log_level.clone(),
                file: self.log_file.clone(),
            },
        }
    }
}

// =============================================================================
// ConfigStore
// =============================================================================

/// Reads and writes one config.toml file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn from_platform(paths: &PlatformPaths) -> Self {
        Self::new(paths.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the config file.
    ///
    /// A missing file yields defaults with no warnings (first run). An
    /// unreadable or unparseable file yields defaults plus a warning, so the
    /// application still starts but the user is informed.
    pub fn load(&self) -> (AppConfig, Vec<String>) {
        let path = &self.path;

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
            return (AppConfig::default(), Vec::new());
        }

        let raw = match self.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                let msg = format!("{e}. Using defaults.");
                tracing::warn!("{}", msg);
                return (AppConfig::default(), vec![msg]);
            }
        };

        tracing::info!(path = %path.display(), "Loaded config.toml");
        let (config, warnings) = AppConfig::from_raw(raw);
        if !warnings.is_empty() {
            tracing::warn!(count = warnings.len(), "Config validation produced warnings");
        }
        (config, warnings)
    }

    fn read_raw(&self) -> Result<RawConfig, ConfigError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Write `config` atomically, creating the config directory if needed.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(&config.to_raw()).map_err(|e| {
            ConfigError::TomlSerialize {
                path: self.path.clone(),
                source: e,
            }
        })?;
        write_atomic(&self.path, content.as_bytes()).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    /// Write a default config file on first run. Returns true when created.
    pub fn ensure_exists(&self) -> Result<bool, ConfigError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&AppConfig::default())?;
        tracing::info!(path = %self.path.display(), "Created default config.toml");
        Ok(true)
    }

    /// Add `link` to (or remove it from) the ban list and save.
    ///
    /// Returns false when the list already had the requested state. Only an
    /// unparseable file is refused; it is never overwritten with defaults.
    pub fn set_banned(&self, link: &str, banned: bool) -> Result<bool, ConfigError> {
        let link = link.trim();
        if link.is_empty() {
            return Ok(false);
        }

        let mut config = if self.path.exists() {
            AppConfig::from_raw(self.read_raw()?).0
        } else {
            AppConfig::default()
        };

        let present = config.banned_message_links.iter().any(|l| l == link);
        if present == banned {
            return Ok(false);
        }
        if banned {
            config.banned_message_links.push(link.to_string());
        } else {
            config.banned_message_links.retain(|l| l != link);
        }
        self.save(&config)?;
        tracing::info!(link = %link, banned, "Ban list updated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> AppConfig {
        AppConfig {
            telegram: TelegramSettings {
                api_id: "12345".to_string(),
                api_hash: "hash-value".to_string(),
                phone_number: "+79990001122".to_string(),
            },
            selected_chats: vec![
                "@Jobs_Python".to_string(),
                "https://t.me/SomeChannel/123".to_string(),
            ],
            banned_message_links: vec!["https://t.me/SomeChannel/123".to_string()],
            job_profile: JobProfile {
                title_keywords: vec!["python developer".to_string()],
                profile_keywords: vec!["senior".to_string()],
                industry_keywords: vec!["fintech".to_string()],
                exclusion_phrases: vec!["курсы для директора".to_string()],
                min_match_score: 2,
            },
            scan_depth_days: 45,
            analyzer: AnalyzerKind::Identity,
            log_level: Some("debug".to_string()),
            log_file: None,
        }
    }

    #[test]
    fn test_config_store_save_load() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        let config = sample_config();

        store.save(&config).unwrap();
        let (loaded, warnings) = store.load();

        assert!(warnings.is_empty(), "warnings: {warnings:?}");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        let (config, warnings) = store.load();
        assert!(warnings.is_empty());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "selected_chats = [unterminated").unwrap();
        let (config, warnings) = ConfigStore::new(&path).load();
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_values_are_normalised_and_clamped() {
        let raw: RawConfig = toml::from_str(
            r#"
            selected_chats = ["  @Jobs ", "", "https://t.me/Chan"]
            scan_depth_days = 900

            [telegram]
            api_id = 777

            [job_profile]
            title_keywords = [" Директор ", "  "]
            min_match_score = 0

            [matching]
            analyzer = "pymorphy"
            "#,
        )
        .unwrap();
        let (config, warnings) = AppConfig::from_raw(raw);

        assert_eq!(config.selected_chats, vec!["@Jobs", "https://t.me/Chan"]);
        assert_eq!(config.scan_depth_days, 365);
        assert_eq!(config.telegram.api_id, "777");
        assert_eq!(config.job_profile.title_keywords, vec!["директор"]);
        assert_eq!(config.job_profile.min_match_score, 1);
        assert_eq!(config.analyzer, AnalyzerKind::Snowball);
        assert_eq!(warnings.len(), 3, "warnings: {warnings:?}");
    }

    #[test]
    fn test_ensure_exists_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.toml"));
        assert!(store.ensure_exists().unwrap());
        assert!(!store.ensure_exists().unwrap());
        let (config, warnings) = store.load();
        assert!(warnings.is_empty());
        assert_eq!(config.scan_depth_days, constants::DEFAULT_SCAN_DEPTH_DAYS);
    }

    #[test]
    fn test_set_banned_toggles_link() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        store.save(&sample_config()).unwrap();

        assert!(store.set_banned(" https://t.me/jobs/101 ", true).unwrap());
        assert!(!store.set_banned("https://t.me/jobs/101", true).unwrap());
        let (config, _) = store.load();
        assert_eq!(
            config.banned_message_links,
            vec!["https://t.me/SomeChannel/123", "https://t.me/jobs/101"]
        );

        assert!(store.set_banned("https://t.me/SomeChannel/123", false).unwrap());
        let (config, _) = store.load();
        assert_eq!(config.banned_message_links, vec!["https://t.me/jobs/101"]);
        assert_eq!(config.selected_chats.len(), 2);
    }

    #[test]
    fn test_set_banned_refuses_unparseable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let store = ConfigStore::new(&path);
        assert!(matches!(
            store.set_banned("https://t.me/jobs/1", true),
            Err(ConfigError::TomlParse { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not = [valid");
    }
}
