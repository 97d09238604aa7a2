use crate::domain::{aggregates::UrlNode, value_objects::{LanguageCode, NodeId}, DomainResult};

/// Repository trait for the language-independent part of UrlNode aggregates.
///
/// Nodes come back with an empty translation cache; translations are loaded
/// on demand through [`super::TranslationRepository`].
pub trait NodeRepository {
    /// Saves a node to the repository.
    ///
    /// A node without an id is inserted and receives its id here. A node
    /// with an id is updated in place.
    fn save_node(&mut self, node: &mut UrlNode) -> DomainResult<NodeId>;

    /// Finds a node by its unique identifier, with `language` as its current language.
    ///
    /// Returns `Ok(Some(node))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    fn find_by_id(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Option<UrlNode>>;

    /// Returns the direct children of a node, in sort order.
    fn find_children(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Vec<UrlNode>>;

    /// Deletes a node, its translations and its descendants.
    ///
    /// Returns `Ok(true)` if the node was deleted, `Ok(false)` if the node
    /// was not found, or an error if the operation fails.
    fn delete_node(&mut self, id: NodeId) -> DomainResult<bool>;
}
