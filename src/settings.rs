use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::pdf::{DEFAULT_EAGER_PAGES, DEFAULT_LOOKAHEAD_PX, PopplerTools, ViewOptions, Zoom};

pub const CURRENT_VERSION: u32 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub translation: TranslationSettings,

    #[serde(default)]
    pub reformat: ReformatSettings,

    #[serde(default)]
    pub speech: SpeechSettings,

    #[serde(default)]
    pub viewer: ViewerSettings,

    #[serde(default)]
    pub extractor: ExtractorSettings,
}

/// DeepL-compatible translation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// Target for text that is mostly not CJK
    #[serde(default = "default_target")]
    pub default_target: String,

    /// Target for text that is mostly CJK
    #[serde(default = "default_alternate_target")]
    pub alternate_target: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// OpenAI-compatible chat completions service used to tidy extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReformatSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_reformat_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Speech command; the platform default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Words per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    #[serde(default = "default_zoom")]
    pub zoom: f32,

    #[serde(default = "default_eager_pages")]
    pub eager_pages: usize,

    #[serde(default = "default_lookahead")]
    pub lookahead_px: u32,

    #[serde(default)]
    pub line_numbers: bool,
}

/// Names (or paths) of the poppler tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorSettings {
    #[serde(default = "default_pdftotext")]
    pub pdftotext: String,

    #[serde(default = "default_pdfinfo")]
    pub pdfinfo: String,

    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_translation_endpoint() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_target() -> String {
    "ZH-HANS".to_string()
}

fn default_alternate_target() -> String {
    "EN-US".to_string()
}

fn default_reformat_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_zoom() -> f32 {
    Zoom::DEFAULT_SCALE
}

fn default_eager_pages() -> usize {
    DEFAULT_EAGER_PAGES
}

fn default_lookahead() -> u32 {
    DEFAULT_LOOKAHEAD_PX
}

fn default_pdftotext() -> String {
    "pdftotext".to_string()
}

fn default_pdfinfo() -> String {
    "pdfinfo".to_string()
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            translation: TranslationSettings::default(),
            reformat: ReformatSettings::default(),
            speech: SpeechSettings::default(),
            viewer: ViewerSettings::default(),
            extractor: ExtractorSettings::default(),
        }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_translation_endpoint(),
            default_target: default_target(),
            alternate_target: default_alternate_target(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for ReformatSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: default_reformat_endpoint(),
            model: default_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            eager_pages: DEFAULT_EAGER_PAGES,
            lookahead_px: DEFAULT_LOOKAHEAD_PX,
            line_numbers: false,
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            pdftotext: default_pdftotext(),
            pdfinfo: default_pdfinfo(),
            pdftoppm: default_pdftoppm(),
        }
    }
}

impl TranslationSettings {
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

impl ReformatSettings {
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Refinement only runs when switched on and a key is present
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }
}

impl ExtractorSettings {
    pub fn tools(&self) -> PopplerTools {
        PopplerTools {
            pdfinfo: self.pdfinfo.clone(),
            pdftoppm: self.pdftoppm.clone(),
            pdftotext: self.pdftotext.clone(),
        }
    }
}

impl ViewerSettings {
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            zoom: Zoom::clamp_factor(self.zoom),
            eager_pages: self.eager_pages.max(1),
            lookahead_px: self.lookahead_px,
            ..ViewOptions::default()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Read settings from `path`; a missing file means defaults.
    /// An older version is migrated in memory only, the file is never written.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {path:?}, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path:?}"))?;
        let mut settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path:?}"))?;
        debug!("Loaded settings from {path:?}");

        if settings.version < CURRENT_VERSION {
            migrate_settings(&mut settings);
        }
        Ok(settings)
    }

    /// Overwrite `path` with these settings
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {parent:?}"))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to save config to {path:?}"))?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }

    /// Write a default config unless one exists; returns whether a file was written
    pub fn init(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Config already present at {path:?}");
            return Ok(false);
        }
        Self::default().save(path)?;
        info!("Wrote default config to {path:?}");
        Ok(true)
    }

    /// Copy with API keys masked, for display
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.translation.api_key = copy.translation.api_key.as_deref().map(mask_secret);
        copy.reformat.api_key = copy.reformat.api_key.as_deref().map(mask_secret);
        copy
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

/// Keep the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.translation.api_key().is_none());
        assert!(!settings.reformat.is_active());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"version": 1, "translation": {"api_key": "abc:fx"}, "viewer": {"zoom": 2.0}}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.translation.api_key(), Some("abc:fx"));
        assert_eq!(settings.translation.default_target, "ZH-HANS");
        assert_eq!(settings.translation.alternate_target, "EN-US");
        assert_eq!(settings.viewer.zoom, 2.0);
        assert_eq!(settings.viewer.eager_pages, 3);
        assert_eq!(settings.extractor.pdftotext, "pdftotext");
    }

    #[test]
    fn old_version_is_migrated_without_touching_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": 0}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"version": 0}"#);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn init_does_not_clobber() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        assert!(Settings::init(&path, false).unwrap());
        fs::write(&path, r#"{"reformat": {"enabled": true}}"#).unwrap();
        assert!(!Settings::init(&path, false).unwrap());
        assert!(Settings::load(&path).unwrap().reformat.enabled);
        assert!(Settings::init(&path, true).unwrap());
        assert!(!Settings::load(&path).unwrap().reformat.enabled);
    }

    #[test]
    fn reformat_needs_key_and_switch() {
        let mut reformat = ReformatSettings {
            enabled: true,
            ..ReformatSettings::default()
        };
        assert!(!reformat.is_active());
        reformat.api_key = Some("   ".into());
        assert!(!reformat.is_active());
        reformat.api_key = Some("sk-1".into());
        assert!(reformat.is_active());
    }

    #[test]
    fn secrets_are_masked() {
        let mut settings = Settings::default();
        settings.translation.api_key = Some("0123456789abcdef".into());
        settings.reformat.api_key = Some("abc".into());
        let masked = settings.masked();
        assert_eq!(masked.translation.api_key.as_deref(), Some("****cdef"));
        assert_eq!(masked.reformat.api_key.as_deref(), Some("****"));
        assert!(!masked.to_pretty_json().unwrap().contains("0123456789"));
    }
}
