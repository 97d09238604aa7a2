use crate::application::{
    repositories::{NodeRepository, TranslationRepository},
    services::{LanguageConfig, TranslationError, TranslationStore},
};
use crate::domain::{
    aggregates::UrlNode,
    base::{DomainError, Entity},
    value_objects::{LanguageCode, NodeId, Slug, UrlPath},
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// The translated field a resolved path was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    OverrideUrl,
    Slug,
}

impl UrlSource {
    pub fn field_name(&self) -> &'static str {
        match self {
            UrlSource::OverrideUrl => "override_url",
            UrlSource::Slug => "slug",
        }
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{}", url_taken_message(.field))]
    UrlTaken { field: UrlSource, url: UrlPath },

    #[error("A page needs a slug or an override URL")]
    MissingSlug,

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Invalid override URL: {0}")]
    InvalidOverrideUrl(String),

    #[error("Parent node {0} does not exist")]
    ParentNotFound(NodeId),

    #[error("Node {parent} can't be the parent: it is the page itself or one of its descendants")]
    InvalidParent { parent: NodeId },

    #[error("Node {node} would move to '{url}', which is already taken by an other page.")]
    DescendantUrlTaken { node: NodeId, url: UrlPath },

    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),
}

fn url_taken_message(field: &UrlSource) -> &'static str {
    match field {
        UrlSource::OverrideUrl => "This URL is already taken by an other page.",
        UrlSource::Slug => "This slug is already used by an other page at the same level.",
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A descendant whose slug-derived path follows a moved ancestor
struct PlannedMove {
    node: UrlNode,
    url: UrlPath,
}

/// Use case for storing a node together with its current-language translation.
///
/// The resolved path is recomputed first (override URL, or the parent's path
/// plus the slug) and checked against every other node in the same site
/// before anything is written. When the path of a stored node changes, the
/// paths of its descendants in that language follow. Every descendant path
/// is checked too, so a rejected save leaves the tree untouched.
pub struct SavePage<'a, R: NodeRepository + TranslationRepository> {
    repository: &'a mut R,
    languages: &'a LanguageConfig,
}

impl<'a, R: NodeRepository + TranslationRepository> SavePage<'a, R> {
    pub fn new(repository: &'a mut R, languages: &'a LanguageConfig) -> Self {
        Self {
            repository,
            languages,
        }
    }

    pub fn execute(&mut self, node: &mut UrlNode) -> ValidationResult<NodeId> {
        let language = node.current_language().clone();
        let was_stored = node.is_persisted();
        self.check_parent_chain(node, &language)?;

        let Some(translation) = node.current_translation() else {
            // Nothing translated was touched; only the node itself changes.
            let id = self.repository.save_node(node)?;
            return Ok(id);
        };
        let previous_url = translation.cached_url().map(str::to_string);

        let new_url = self.resolve_url(node, &language)?;
        if let Some(translation) = node.translations_mut().translation_mut(&language) {
            translation.set_cached_url(&new_url);
        }

        let mut moves = Vec::new();
        if let Some(id) = node.id().copied() {
            if was_stored && previous_url.as_deref() != Some(new_url.as_str()) {
                let mut visited = HashSet::from([id]);
                self.plan_descendants(id, &new_url, &language, &mut visited, &mut moves)?;
            }
        }

        let id = self.repository.save_node(node)?;
        TranslationStore::new(&mut *self.repository, self.languages).save(node)?;
        info!("Saved node #{} at '{}' ({})", id, new_url, language);

        for planned in &mut moves {
            if let Some(translation) = planned.node.translations_mut().translation_mut(&language) {
                translation.set_cached_url(&planned.url);
            }
            TranslationStore::new(&mut *self.repository, self.languages).save(&mut planned.node)?;
        }
        if !moves.is_empty() {
            debug!("Moved {} descendants of node #{}", moves.len(), id);
        }
        Ok(id)
    }

    /// Refuse a parent that is the node itself or lies below it
    fn check_parent_chain(&self, node: &UrlNode, language: &LanguageCode) -> ValidationResult<()> {
        let (Some(id), Some(parent)) = (node.id().copied(), node.parent_id()) else {
            return Ok(());
        };

        let mut current = parent;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            if current == id {
                return Err(ValidationError::InvalidParent { parent });
            }
            match self.repository.find_by_id(current, language)? {
                Some(ancestor) => match ancestor.parent_id() {
                    Some(next) => current = next,
                    None => return Ok(()),
                },
                // A missing parent is reported when its path is read
                None => return Ok(()),
            }
        }
        Err(ValidationError::InvalidParent { parent })
    }

    /// The path this node's current translation resolves to, if it is free
    fn resolve_url(&mut self, node: &UrlNode, language: &LanguageCode) -> ValidationResult<UrlPath> {
        let translation = node.current_translation().ok_or(ValidationError::MissingSlug)?;

        let (url, source) = if let Some(override_url) = translation.override_url() {
            let url = UrlPath::new(override_url)
                .map_err(|_| ValidationError::InvalidOverrideUrl(override_url.to_string()))?;
            (url, UrlSource::OverrideUrl)
        } else if !translation.slug().trim().is_empty() {
            let slug = Slug::new(translation.slug().trim())
                .map_err(|_| ValidationError::InvalidSlug(translation.slug().to_string()))?;
            let parent_url = match node.parent_id() {
                Some(parent) => Some(self.parent_url(parent, language)?),
                None => None,
            };
            (UrlPath::for_slug(parent_url.as_ref(), &slug), UrlSource::Slug)
        } else {
            return Err(ValidationError::MissingSlug);
        };

        if self
            .repository
            .is_url_taken(&url, node.site_id(), node.id().copied())?
        {
            return Err(ValidationError::UrlTaken { field: source, url });
        }
        Ok(url)
    }

    fn parent_url(&mut self, parent: NodeId, language: &LanguageCode) -> ValidationResult<UrlPath> {
        let mut parent_node = self
            .repository
            .find_by_id(parent, language)?
            .ok_or(ValidationError::ParentNotFound(parent))?;

        let store = TranslationStore::new(&mut *self.repository, self.languages);
        let translation = store.read(&mut parent_node, language, true)?;
        let url = translation.cached_url().ok_or(ValidationError::ParentNotFound(parent))?;
        Ok(UrlPath::new(url)?)
    }

    /// Compute the new slug-derived paths below `parent` without writing.
    /// Children with an override URL keep their path, and so does
    /// everything below them.
    fn plan_descendants(
        &self,
        parent: NodeId,
        parent_url: &UrlPath,
        language: &LanguageCode,
        visited: &mut HashSet<NodeId>,
        moves: &mut Vec<PlannedMove>,
    ) -> ValidationResult<()> {
        let children = self.repository.find_children(parent, language)?;

        for child in children {
            let Some(child_id) = child.id().copied() else {
                continue;
            };
            if !visited.insert(child_id) {
                continue;
            }
            let Some(translation) = child.translations().translation(language) else {
                continue;
            };
            if translation.override_url().is_some() {
                continue;
            }
            let Ok(slug) = Slug::new(translation.slug().trim()) else {
                continue;
            };

            let url = UrlPath::for_slug(Some(parent_url), &slug);
            if self.repository.is_url_taken(&url, child.site_id(), Some(child_id))? {
                return Err(ValidationError::DescendantUrlTaken { node: child_id, url });
            }
            debug!("Node #{} will move to '{}'", child_id, url);

            self.plan_descendants(child_id, &url, language, visited, moves)?;
            moves.push(PlannedMove { node: child, url });
        }
        Ok(())
    }
}
