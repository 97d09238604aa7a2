use crate::domain::{
    entities::Translation,
    value_objects::{LanguageCode, NodeId, SiteId, TranslationId, UrlPath},
    DomainResult,
};

/// Repository trait for the per-language Translation records of nodes.
///
/// At most one translation exists per (node, language). Within one site scope
/// no two nodes may hold a translation with the same cached URL; implementations
/// reject such a write with `DomainError::BusinessRuleViolation`.
pub trait TranslationRepository {
    /// Finds the translation of `node` in exactly `language`; no fallback is applied.
    fn find_translation(
        &self,
        node: NodeId,
        language: &LanguageCode,
    ) -> DomainResult<Option<Translation>>;

    /// Inserts or updates a translation and returns its id.
    ///
    /// The translation must reference its owning node. `site_id` is the
    /// owning node's site, used for the path uniqueness scope.
    fn save_translation(
        &mut self,
        translation: &Translation,
        site_id: Option<SiteId>,
    ) -> DomainResult<TranslationId>;

    /// The language codes a node has translations for.
    fn available_languages(&self, node: NodeId) -> DomainResult<Vec<LanguageCode>>;

    /// Deletes one translation. Returns `Ok(false)` if it did not exist.
    fn delete_translation(&mut self, node: NodeId, language: &LanguageCode) -> DomainResult<bool>;

    /// Whether a translation of some node other than `exclude` already resolves to `url`
    /// within the given site scope.
    fn is_url_taken(
        &self,
        url: &UrlPath,
        site_id: Option<SiteId>,
        exclude: Option<NodeId>,
    ) -> DomainResult<bool>;
}
