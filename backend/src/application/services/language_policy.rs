/// Language configuration and the fallback policy shared by tree queries and translation reads
use crate::domain::value_objects::LanguageCode;
use serde::{Deserialize, Serialize};

/// Settings of one configured language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSettings {
    pub code: LanguageCode,
    /// The language to show when content is missing; the default language if unset
    #[serde(default)]
    pub fallback: Option<LanguageCode>,
    /// Never substitute another language for this one
    #[serde(default)]
    pub hide_untranslated: bool,
}

impl LanguageSettings {
    pub fn new(code: LanguageCode) -> Self {
        Self {
            code,
            fallback: None,
            hide_untranslated: false,
        }
    }

    pub fn with_fallback(mut self, fallback: LanguageCode) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn hiding_untranslated(mut self) -> Self {
        self.hide_untranslated = true;
        self
    }
}

/// The ordered language list of a site plus its default language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub default_language: LanguageCode,
    #[serde(default)]
    pub languages: Vec<LanguageSettings>,
    #[serde(default = "default_multilingual")]
    pub multilingual: bool,
}

fn default_multilingual() -> bool {
    true
}

/// The languages tried for one lookup: the requested one, then at most one fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    requested: LanguageCode,
    fallback: Option<LanguageCode>,
}

impl FallbackChain {
    pub fn requested(&self) -> &LanguageCode {
        &self.requested
    }

    pub fn fallback(&self) -> Option<&LanguageCode> {
        self.fallback.as_ref()
    }

    pub fn len(&self) -> usize {
        if self.fallback.is_some() {
            2
        } else {
            1
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageCode> {
        std::iter::once(&self.requested).chain(self.fallback.as_ref())
    }
}

impl LanguageConfig {
    pub fn new(default_language: LanguageCode, languages: Vec<LanguageSettings>) -> Self {
        Self {
            default_language,
            languages,
            multilingual: true,
        }
    }

    /// A site with only its default language
    pub fn single(default_language: LanguageCode) -> Self {
        Self {
            languages: vec![LanguageSettings::new(default_language.clone())],
            default_language,
            multilingual: false,
        }
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default_language
    }

    pub fn settings_for(&self, language: &LanguageCode) -> Option<&LanguageSettings> {
        self.languages.iter().find(|settings| &settings.code == language)
    }

    pub fn is_configured(&self, language: &LanguageCode) -> bool {
        self.settings_for(language).is_some()
    }

    /// The single language to retry with when `language` has no content.
    ///
    /// Only one hop is taken: if the fallback also misses, the
    /// lookup fails rather than walking further down the language list.
    pub fn fallback_for(&self, language: &LanguageCode) -> Option<&LanguageCode> {
        if !self.multilingual || self.languages.len() < 2 {
            return None;
        }

        let fallback = match self.settings_for(language) {
            Some(settings) if settings.hide_untranslated => return None,
            Some(settings) => settings.fallback.as_ref().unwrap_or(&self.default_language),
            None => &self.default_language,
        };

        if fallback == language {
            None
        } else {
            Some(fallback)
        }
    }

    pub fn fallback_chain(&self, language: &LanguageCode) -> FallbackChain {
        FallbackChain {
            requested: language.clone(),
            fallback: self.fallback_for(language).cloned(),
        }
    }
}
