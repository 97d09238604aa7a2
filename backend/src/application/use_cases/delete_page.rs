use crate::application::repositories::{NodeRepository, TranslationRepository};
use crate::domain::{
    value_objects::{LanguageCode, NodeId},
    DomainError, DomainResult,
};
use tracing::info;

/// Use case for removing a node; its translations and descendants go with it
pub struct DeletePage<'a, R: NodeRepository> {
    repository: &'a mut R,
}

impl<'a, R: NodeRepository> DeletePage<'a, R> {
    pub fn new(repository: &'a mut R) -> Self {
        Self { repository }
    }

    pub fn execute(&mut self, id: NodeId) -> DomainResult<bool> {
        let deleted = self.repository.delete_node(id)?;
        if deleted {
            info!("Deleted node #{}", id);
        }
        Ok(deleted)
    }
}

/// Use case for removing one language of a node.
///
/// A node always keeps at least one translation, so the last one can't be removed.
pub struct DeleteTranslation<'a, R: TranslationRepository> {
    repository: &'a mut R,
}

impl<'a, R: TranslationRepository> DeleteTranslation<'a, R> {
    pub fn new(repository: &'a mut R) -> Self {
        Self { repository }
    }

    pub fn execute(&mut self, node: NodeId, language: &LanguageCode) -> DomainResult<bool> {
        let languages = self.repository.available_languages(node)?;
        if !languages.contains(language) {
            return Ok(false);
        }
        if languages.len() == 1 {
            return Err(DomainError::BusinessRuleViolation(format!(
                "Can't delete the last translation of node #{}",
                node
            )));
        }

        let deleted = self.repository.delete_translation(node, language)?;
        if deleted {
            info!("Deleted '{}' translation of node #{}", language, node);
        }
        Ok(deleted)
    }
}
