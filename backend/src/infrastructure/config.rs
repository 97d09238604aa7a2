use crate::application::services::{DispatchOptions, LanguageConfig, LanguageSettings};
use crate::domain::value_objects::{LanguageCode, SiteId};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings of one running site
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Restricts the tree to one site; `None` serves every node
    pub site_id: Option<SiteId>,
    pub default_language: LanguageCode,
    pub languages: Vec<LanguageSettings>,
    pub multilingual: bool,
    pub append_slash: bool,
    pub debug: bool,
    pub admin_prefix: Option<String>,
    pub database_path: PathBuf,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        let english = LanguageCode::default();
        Self {
            site_id: None,
            languages: vec![LanguageSettings::new(english.clone())],
            default_language: english,
            multilingual: true,
            append_slash: true,
            debug: false,
            admin_prefix: Some("/admin/".to_string()),
            database_path: PathBuf::from("pages.db"),
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Settings {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build settings from `CMS_*` variables looked up through `var`
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(site) = var("CMS_SITE_ID") {
            let site: i64 = site.parse().context("CMS_SITE_ID must be a number")?;
            settings.site_id = Some(SiteId::new(site));
        }
        if let Some(default_language) = var("CMS_DEFAULT_LANGUAGE") {
            settings.default_language =
                LanguageCode::new(default_language).context("Invalid CMS_DEFAULT_LANGUAGE")?;
        }
        match var("CMS_LANGUAGES") {
            Some(languages) => settings.languages = parse_languages(&languages)?,
            None => {
                settings.languages = vec![LanguageSettings::new(settings.default_language.clone())]
            }
        }
        if let Some(value) = var("CMS_MULTILINGUAL") {
            settings.multilingual = parse_flag("CMS_MULTILINGUAL", &value)?;
        }
        if let Some(value) = var("CMS_APPEND_SLASH") {
            settings.append_slash = parse_flag("CMS_APPEND_SLASH", &value)?;
        }
        if let Some(value) = var("CMS_DEBUG") {
            settings.debug = parse_flag("CMS_DEBUG", &value)?;
        }
        if let Some(prefix) = var("CMS_ADMIN_PREFIX") {
            settings.admin_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        }
        if let Some(path) = var("CMS_DATABASE_PATH") {
            settings.database_path = PathBuf::from(path);
        }
        if let Some(addr) = var("CMS_BIND_ADDR") {
            settings.bind_addr = addr;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.languages.is_empty()
            && !self
                .languages
                .iter()
                .any(|language| language.code == self.default_language)
        {
            bail!(
                "Default language '{}' is not one of the configured languages",
                self.default_language
            );
        }
        if let Some(prefix) = &self.admin_prefix {
            if !prefix.starts_with('/') {
                bail!("Admin prefix must start with '/': {}", prefix);
            }
        }
        Ok(())
    }

    pub fn language_config(&self) -> LanguageConfig {
        LanguageConfig {
            default_language: self.default_language.clone(),
            languages: self.languages.clone(),
            multilingual: self.multilingual,
        }
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            append_slash: self.append_slash,
            debug: self.debug,
            admin_prefix: self.admin_prefix.clone(),
            site_id: self.site_id,
        }
    }
}

/// Parse `en,nl:en,fr:nl!` style language lists: `code[:fallback]`, with a
/// trailing `!` to hide untranslated content.
fn parse_languages(value: &str) -> Result<Vec<LanguageSettings>> {
    let mut languages = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (entry, hide_untranslated) = match entry.strip_suffix('!') {
            Some(entry) => (entry, true),
            None => (entry, false),
        };
        let (code, fallback) = match entry.split_once(':') {
            Some((code, fallback)) => (code, Some(fallback)),
            None => (entry, None),
        };

        let mut settings = LanguageSettings::new(
            LanguageCode::new(code).with_context(|| format!("Invalid language '{}'", code))?,
        );
        if let Some(fallback) = fallback {
            settings = settings.with_fallback(
                LanguageCode::new(fallback)
                    .with_context(|| format!("Invalid fallback language '{}'", fallback))?,
            );
        }
        if hide_untranslated {
            settings = settings.hiding_untranslated();
        }
        languages.push(settings);
    }
    Ok(languages)
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be a boolean, got '{}'", name, other),
    }
}
