/// The explicit accessor for translated fields: fallback-aware reads,
/// create-on-write and save-on-modify, all through the node's own cache.
use crate::application::repositories::TranslationRepository;
use crate::application::services::language_policy::LanguageConfig;
use crate::domain::aggregates::{CachedTranslation, UrlNode};
use crate::domain::base::{DomainError, Entity};
use crate::domain::entities::{TranslatedField, Translation};
use crate::domain::value_objects::{LanguageCode, NodeId};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("{} does not have a translation for language '{}'", node_label(.node), .language)]
    NotFound {
        node: Option<NodeId>,
        language: LanguageCode,
    },

    #[error("Unknown translated field: {0}")]
    UnknownField(String),

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),
}

fn node_label(node: &Option<NodeId>) -> String {
    match node {
        Some(id) => format!("UrlNode #{}", id),
        None => "Unsaved UrlNode".to_string(),
    }
}

pub type TranslationResult<T> = Result<T, TranslationError>;

/// Reads and writes the translated fields of nodes.
///
/// Reads never create records: a missing language is substituted by its
/// fallback. Writes never fall back: the exact language is loaded or created.
pub struct TranslationStore<'a, R: TranslationRepository> {
    repository: &'a mut R,
    languages: &'a LanguageConfig,
}

impl<'a, R: TranslationRepository> TranslationStore<'a, R> {
    pub fn new(repository: &'a mut R, languages: &'a LanguageConfig) -> Self {
        Self {
            repository,
            languages,
        }
    }

    /// The translation of `node` in `language`, or in its fallback when allowed.
    ///
    /// A language that turned out to be missing is remembered in the node's
    /// cache, so storage is asked at most once per language.
    pub fn read<'n>(
        &self,
        node: &'n mut UrlNode,
        language: &LanguageCode,
        fallback_allowed: bool,
    ) -> TranslationResult<&'n Translation> {
        let resolved = self.locate(node, language, fallback_allowed)?;
        let node_id = node.id().copied();
        node.translations()
            .translation(&resolved)
            .ok_or(TranslationError::NotFound {
                node: node_id,
                language: resolved,
            })
    }

    /// Set one field of the translation in exactly `language`, creating the record if needed
    pub fn write(
        &self,
        node: &mut UrlNode,
        language: &LanguageCode,
        field: TranslatedField,
        value: impl Into<String>,
    ) -> TranslationResult<()> {
        let translation = self.translation_for_write(node, language)?;
        translation.set(field, value);
        Ok(())
    }

    /// Read a field in the node's current language, with fallback
    pub fn get_field(&self, node: &mut UrlNode, field: TranslatedField) -> TranslationResult<String> {
        let language = node.current_language().clone();
        let translation = self.read(node, &language, true)?;
        Ok(translation.get(field).to_string())
    }

    /// Write a field in the node's current language
    pub fn set_field(
        &self,
        node: &mut UrlNode,
        field: TranslatedField,
        value: impl Into<String>,
    ) -> TranslationResult<()> {
        let language = node.current_language().clone();
        self.write(node, &language, field, value)
    }

    pub fn get_field_by_name(&self, node: &mut UrlNode, name: &str) -> TranslationResult<String> {
        let field = parse_field(name)?;
        self.get_field(node, field)
    }

    pub fn set_field_by_name(
        &self,
        node: &mut UrlNode,
        name: &str,
        value: impl Into<String>,
    ) -> TranslationResult<()> {
        let field = parse_field(name)?;
        self.set_field(node, field, value)
    }

    pub fn is_modified(&self, translation: &Translation) -> bool {
        translation.is_modified()
    }

    /// Persist the node's current-language translation if it changed.
    ///
    /// Returns whether a write happened. The node must have been stored
    /// already; a translation created before that gets its owner reference here.
    pub fn save(&mut self, node: &mut UrlNode) -> TranslationResult<bool> {
        let node_id = node.id().copied();
        let site_id = node.site_id();
        let language = node.current_language().clone();

        let Some(translation) = node.translations_mut().translation_mut(&language) else {
            return Ok(false);
        };
        if !translation.is_modified() {
            return Ok(false);
        }

        let node_id = node_id.ok_or_else(|| {
            DomainError::InvalidOperation(
                "A node must be saved before its translations".to_string(),
            )
        })?;
        translation.assign_master(node_id);

        let id = self.repository.save_translation(translation, site_id)?;
        translation.mark_saved(id);
        debug!("Saved '{}' translation of UrlNode #{}", language, node_id);
        Ok(true)
    }

    /// The language codes stored for a node; empty for an unsaved node
    pub fn available_languages(&self, node: &UrlNode) -> TranslationResult<Vec<LanguageCode>> {
        match node.id() {
            Some(id) => Ok(self.repository.available_languages(*id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Find the language whose record will serve this read, filling the cache on the way
    fn locate(
        &self,
        node: &mut UrlNode,
        language: &LanguageCode,
        fallback_allowed: bool,
    ) -> TranslationResult<LanguageCode> {
        let mut language = language.clone();
        let mut fallback_allowed = fallback_allowed;

        loop {
            match node.translations().get(&language) {
                Some(CachedTranslation::Present(_)) => return Ok(language),
                Some(CachedTranslation::Missing) => {}
                None => {
                    if let Some(found) = self.fetch(node, &language)? {
                        node.translations_mut().insert(found);
                        return Ok(language);
                    }
                }
            }

            let fallback = if fallback_allowed {
                self.languages.fallback_for(&language).cloned()
            } else {
                None
            };

            match fallback {
                Some(fallback) => {
                    debug!(
                        "No '{}' translation for {}, falling back to '{}'",
                        language,
                        node_label(&node.id().copied()),
                        fallback
                    );
                    node.translations_mut().mark_missing(language);
                    language = fallback;
                    fallback_allowed = false;
                }
                None => {
                    return Err(TranslationError::NotFound {
                        node: node.id().copied(),
                        language,
                    })
                }
            }
        }
    }

    fn translation_for_write<'n>(
        &self,
        node: &'n mut UrlNode,
        language: &LanguageCode,
    ) -> TranslationResult<&'n mut Translation> {
        let cached = match node.translations().get(language) {
            Some(CachedTranslation::Present(_)) => true,
            Some(CachedTranslation::Missing) => false,
            None => match self.fetch(node, language)? {
                Some(found) => {
                    node.translations_mut().insert(found);
                    true
                }
                None => false,
            },
        };

        if !cached {
            debug!(
                "Creating '{}' translation for {}",
                language,
                node_label(&node.id().copied())
            );
            let created = Translation::new(language.clone(), node.id().copied());
            node.translations_mut().insert(created);
        }

        let node_id = node.id().copied();
        node.translations_mut()
            .translation_mut(language)
            .ok_or_else(|| TranslationError::NotFound {
                node: node_id,
                language: language.clone(),
            })
    }

    fn fetch(&self, node: &UrlNode, language: &LanguageCode) -> TranslationResult<Option<Translation>> {
        // An unsaved node can't have stored translations.
        let Some(id) = node.id() else {
            return Ok(None);
        };
        debug!("Loading '{}' translation of UrlNode #{}", language, id);
        Ok(self.repository.find_translation(*id, language)?)
    }
}

fn parse_field(name: &str) -> TranslationResult<TranslatedField> {
    name.parse::<TranslatedField>()
        .map_err(|_| TranslationError::UnknownField(name.to_string()))
}
