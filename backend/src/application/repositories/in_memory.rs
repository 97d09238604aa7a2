// In-memory implementation of the repository traits, used by unit tests
use super::{NodeRepository, NodeSummary, PageTreeQuery, QueryScope, TranslationRepository};
use crate::domain::aggregates::{TranslationCache, UrlNode};
use crate::domain::base::{DomainError, DomainResult, Entity};
use crate::domain::entities::{TranslatedFields, Translation};
use crate::domain::value_objects::{LanguageCode, NodeId, SiteId, TranslationId, TypeTag, UrlPath};
use std::cell::Cell;
use std::collections::HashMap;

struct StoredTranslation {
    id: TranslationId,
    fields: TranslatedFields,
    site_id: Option<SiteId>,
}

pub struct InMemoryPageStore {
    nodes: HashMap<NodeId, UrlNode>,
    translations: HashMap<(NodeId, LanguageCode), StoredTranslation>,
    next_node_id: i64,
    next_translation_id: i64,
    translation_queries: Cell<usize>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            translations: HashMap::new(),
            next_node_id: 1,
            next_translation_id: 1,
            translation_queries: Cell::new(0),
        }
    }

    /// Store a translation directly, bypassing the uniqueness check
    pub fn insert_translation(
        &mut self,
        node: NodeId,
        language: LanguageCode,
        fields: TranslatedFields,
        site_id: Option<SiteId>,
    ) -> TranslationId {
        let id = TranslationId::new(self.next_translation_id);
        self.next_translation_id += 1;
        self.translations.insert(
            (node, language),
            StoredTranslation {
                id,
                fields,
                site_id,
            },
        );
        id
    }

    /// How many times `find_translation` was called
    pub fn translation_queries(&self) -> usize {
        self.translation_queries.get()
    }

    pub fn translation_count(&self) -> usize {
        self.translations.len()
    }

    fn load(&self, id: NodeId, language: &LanguageCode) -> Option<UrlNode> {
        let mut node = self.nodes.get(&id)?.clone();
        node.set_current_language(language.clone());
        if let Some(stored) = self.translations.get(&(id, language.clone())) {
            node.translations_mut().insert(Translation::from_storage(
                stored.id,
                id,
                language.clone(),
                stored.fields.clone(),
            ));
        }
        Some(node)
    }

    fn published_with_url(
        &self,
        language: &LanguageCode,
        scope: &QueryScope,
    ) -> Vec<(NodeId, UrlPath)> {
        let mut matches = Vec::new();
        for ((node_id, lang), stored) in &self.translations {
            if lang != language {
                continue;
            }
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            if !node.is_published_at(scope.now) {
                continue;
            }
            if scope.site_id.is_some() && node.site_id() != scope.site_id {
                continue;
            }
            if let Ok(url) = UrlPath::new(stored.fields.cached_url.clone()) {
                matches.push((*node_id, url));
            }
        }
        matches
    }
}

impl NodeRepository for InMemoryPageStore {
    fn save_node(&mut self, node: &mut UrlNode) -> DomainResult<NodeId> {
        let id = match node.id() {
            Some(id) => *id,
            None => {
                let id = NodeId::new(self.next_node_id)?;
                self.next_node_id += 1;
                node.assign_id(id)?;
                id
            }
        };
        let mut stored = node.clone();
        *stored.translations_mut() = TranslationCache::new();
        self.nodes.insert(id, stored);
        Ok(id)
    }

    fn find_by_id(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Option<UrlNode>> {
        Ok(self.load(id, language))
    }

    fn find_children(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Vec<UrlNode>> {
        let mut children: Vec<UrlNode> = self
            .nodes
            .values()
            .filter(|node| node.parent_id() == Some(id))
            .filter_map(|node| node.id().and_then(|child| self.load(*child, language)))
            .collect();
        children.sort_by_key(|node| (node.sort_order(), node.id().copied()));
        Ok(children)
    }

    fn delete_node(&mut self, id: NodeId) -> DomainResult<bool> {
        if self.nodes.remove(&id).is_none() {
            return Ok(false);
        }
        self.translations.retain(|(node, _), _| *node != id);
        let children: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.parent_id() == Some(id))
            .filter_map(|node| node.id().copied())
            .collect();
        for child in children {
            self.delete_node(child)?;
        }
        Ok(true)
    }
}

impl TranslationRepository for InMemoryPageStore {
    fn find_translation(
        &self,
        node: NodeId,
        language: &LanguageCode,
    ) -> DomainResult<Option<Translation>> {
        self.translation_queries.set(self.translation_queries.get() + 1);
        Ok(self.translations.get(&(node, language.clone())).map(|stored| {
            Translation::from_storage(stored.id, node, language.clone(), stored.fields.clone())
        }))
    }

    fn save_translation(
        &mut self,
        translation: &Translation,
        site_id: Option<SiteId>,
    ) -> DomainResult<TranslationId> {
        let node = translation.master_id().ok_or_else(|| {
            DomainError::InvalidOperation("Translation has no owning node".to_string())
        })?;
        if let Some(url) = translation.cached_url() {
            let url = UrlPath::new(url)?;
            if self.is_url_taken(&url, site_id, Some(node))? {
                return Err(DomainError::BusinessRuleViolation(format!(
                    "URL already in use: {}",
                    url
                )));
            }
        }

        let key = (node, translation.language_code().clone());
        if let Some(stored) = self.translations.get_mut(&key) {
            stored.fields = translation.fields().clone();
            stored.site_id = site_id;
            return Ok(stored.id);
        }
        Ok(self.insert_translation(key.0, key.1, translation.fields().clone(), site_id))
    }

    fn available_languages(&self, node: NodeId) -> DomainResult<Vec<LanguageCode>> {
        let mut languages: Vec<LanguageCode> = self
            .translations
            .keys()
            .filter(|(owner, _)| *owner == node)
            .map(|(_, language)| language.clone())
            .collect();
        languages.sort();
        Ok(languages)
    }

    fn delete_translation(&mut self, node: NodeId, language: &LanguageCode) -> DomainResult<bool> {
        Ok(self.translations.remove(&(node, language.clone())).is_some())
    }

    fn is_url_taken(
        &self,
        url: &UrlPath,
        site_id: Option<SiteId>,
        exclude: Option<NodeId>,
    ) -> DomainResult<bool> {
        Ok(self.translations.iter().any(|((owner, _), stored)| {
            Some(*owner) != exclude
                && stored.site_id == site_id
                && stored.fields.cached_url == url.as_str()
        }))
    }
}

impl PageTreeQuery for InMemoryPageStore {
    fn get_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>> {
        let found = self
            .published_with_url(language, scope)
            .into_iter()
            .find(|(_, url)| url == path);
        Ok(found.and_then(|(id, _)| self.load(id, language)))
    }

    fn best_match_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        types: &[TypeTag],
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>> {
        let best = self
            .published_with_url(language, scope)
            .into_iter()
            .filter(|(id, url)| {
                path.starts_with(url)
                    && self
                        .nodes
                        .get(id)
                        .map(|node| types.contains(node.type_tag()))
                        .unwrap_or(false)
            })
            .max_by_key(|(_, url)| url.as_str().len());
        Ok(best.and_then(|(id, _)| self.load(id, language)))
    }

    fn published_count(&self, scope: &QueryScope) -> DomainResult<usize> {
        Ok(self
            .nodes
            .values()
            .filter(|node| node.is_published_at(scope.now))
            .filter(|node| scope.site_id.is_none() || node.site_id() == scope.site_id)
            .count())
    }

    fn non_polymorphic_lookup(&self, id: NodeId) -> DomainResult<Option<NodeSummary>> {
        Ok(self.nodes.get(&id).map(|node| NodeSummary {
            id,
            parent_id: node.parent_id(),
            type_tag: node.type_tag().clone(),
            status: node.status(),
        }))
    }
}
