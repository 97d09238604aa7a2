/// Domain aggregates
use super::base::{DomainError, DomainResult, Entity};
use super::entities::Translation;
use super::value_objects::{LanguageCode, NodeId, PageStatus, SiteId, TypeTag};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// What the per-node cache knows about one language
#[derive(Debug, Clone)]
pub enum CachedTranslation {
    /// The translation record for this language
    Present(Translation),
    /// Storage was already asked; there is no record for this language
    Missing,
}

/// Per-node cache of translation records, keyed by language code.
///
/// The cache lives as long as the node value and is never shared between nodes.
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    entries: HashMap<LanguageCode, CachedTranslation>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: &LanguageCode) -> Option<&CachedTranslation> {
        self.entries.get(language)
    }

    /// The cached record for a language, ignoring negative markers
    pub fn translation(&self, language: &LanguageCode) -> Option<&Translation> {
        match self.entries.get(language) {
            Some(CachedTranslation::Present(translation)) => Some(translation),
            _ => None,
        }
    }

    pub fn translation_mut(&mut self, language: &LanguageCode) -> Option<&mut Translation> {
        match self.entries.get_mut(language) {
            Some(CachedTranslation::Present(translation)) => Some(translation),
            _ => None,
        }
    }

    pub fn insert(&mut self, translation: Translation) {
        self.entries.insert(
            translation.language_code().clone(),
            CachedTranslation::Present(translation),
        );
    }

    pub fn mark_missing(&mut self, language: LanguageCode) {
        self.entries.insert(language, CachedTranslation::Missing);
    }

    pub fn is_marked_missing(&self, language: &LanguageCode) -> bool {
        matches!(self.entries.get(language), Some(CachedTranslation::Missing))
    }

    pub fn remove(&mut self, language: &LanguageCode) -> Option<CachedTranslation> {
        self.entries.remove(language)
    }

    /// All cached records, skipping negative markers
    pub fn translations(&self) -> impl Iterator<Item = &Translation> {
        self.entries.values().filter_map(|entry| match entry {
            CachedTranslation::Present(translation) => Some(translation),
            CachedTranslation::Missing => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A UrlNode is the aggregate root of the page tree: one page of some page type,
/// positioned under an optional parent, owning its translations.
///
/// The node itself holds only the language-independent fields. Everything
/// that varies per language lives in [`Translation`] records reached through
/// the node's [`TranslationCache`].
#[derive(Debug, Clone)]
pub struct UrlNode {
    id: Option<NodeId>,
    parent_id: Option<NodeId>,
    site_id: Option<SiteId>,
    status: PageStatus,
    type_tag: TypeTag,
    sort_order: i32,
    in_navigation: bool,
    publication_date: Option<DateTime<Utc>>,
    publication_end_date: Option<DateTime<Utc>>,
    payload: serde_json::Value,
    current_language: LanguageCode,
    translations: TranslationCache,
}

impl UrlNode {
    /// Create a new, unsaved draft node of the given page type
    pub fn new(type_tag: TypeTag, current_language: LanguageCode) -> Self {
        UrlNode {
            id: None,
            parent_id: None,
            site_id: None,
            status: PageStatus::Draft,
            type_tag,
            sort_order: 0,
            in_navigation: true,
            publication_date: None,
            publication_end_date: None,
            payload: serde_json::Value::Null,
            current_language,
            translations: TranslationCache::new(),
        }
    }

    /// Attach the identity given by storage. Once set it can't change.
    pub fn assign_id(&mut self, id: NodeId) -> DomainResult<()> {
        match self.id {
            Some(existing) if existing != id => Err(DomainError::InvalidOperation(format!(
                "Node {} can't be re-identified as {}",
                existing, id
            ))),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn set_parent(&mut self, parent_id: Option<NodeId>) {
        self.parent_id = parent_id;
    }

    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    pub fn set_site(&mut self, site_id: Option<SiteId>) {
        self.site_id = site_id;
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    pub fn set_status(&mut self, status: PageStatus) {
        self.status = status;
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    pub fn set_sort_order(&mut self, sort_order: i32) {
        self.sort_order = sort_order;
    }

    pub fn in_navigation(&self) -> bool {
        self.in_navigation
    }

    pub fn set_in_navigation(&mut self, in_navigation: bool) {
        self.in_navigation = in_navigation;
    }

    pub fn publication_date(&self) -> Option<DateTime<Utc>> {
        self.publication_date
    }

    pub fn publication_end_date(&self) -> Option<DateTime<Utc>> {
        self.publication_end_date
    }

    pub fn set_publication_window(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(DomainError::InvalidValue(
                    "Publication end date must be after the publication date".to_string(),
                ));
            }
        }
        self.publication_date = start;
        self.publication_end_date = end;
        Ok(())
    }

    /// Whether anonymous visitors can see this node at the given moment
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PageStatus::Published
            && self.publication_date.map_or(true, |start| start <= now)
            && self.publication_end_date.map_or(true, |end| end > now)
    }

    /// Opaque per-type data, interpreted only by the owning page type plugin
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: serde_json::Value) {
        self.payload = payload;
    }

    pub fn current_language(&self) -> &LanguageCode {
        &self.current_language
    }

    pub fn set_current_language(&mut self, language: LanguageCode) {
        self.current_language = language;
    }

    pub fn translations(&self) -> &TranslationCache {
        &self.translations
    }

    pub fn translations_mut(&mut self) -> &mut TranslationCache {
        &mut self.translations
    }

    /// The cached translation for the current language, if it was loaded
    pub fn current_translation(&self) -> Option<&Translation> {
        self.translations.translation(&self.current_language)
    }

    /// The cached title in the current language, or an empty string
    pub fn title(&self) -> &str {
        self.current_translation().map_or("", |t| t.title())
    }

    /// The resolved path in the current language, if known
    pub fn cached_url(&self) -> Option<&str> {
        self.current_translation().and_then(|t| t.cached_url())
    }
}

impl Entity for UrlNode {
    type Id = NodeId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}
