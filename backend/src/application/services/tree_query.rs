/// Tree lookups with the language fallback applied
use crate::application::repositories::{NodeSummary, PageTreeQuery, QueryScope};
use crate::application::services::language_policy::LanguageConfig;
use crate::domain::aggregates::UrlNode;
use crate::domain::base::DomainResult;
use crate::domain::value_objects::{LanguageCode, NodeId, TypeTag, UrlPath};
use tracing::debug;

/// A node found by a tree lookup, with the language it was found in
#[derive(Debug, Clone)]
pub struct NodeMatch {
    pub node: UrlNode,
    pub language: LanguageCode,
}

pub struct FallbackTreeQuery<'a, Q: PageTreeQuery + ?Sized> {
    query: &'a Q,
    languages: &'a LanguageConfig,
    scope: QueryScope,
}

impl<'a, Q: PageTreeQuery + ?Sized> FallbackTreeQuery<'a, Q> {
    pub fn new(query: &'a Q, languages: &'a LanguageConfig, scope: QueryScope) -> Self {
        Self {
            query,
            languages,
            scope,
        }
    }

    pub fn scope(&self) -> &QueryScope {
        &self.scope
    }

    /// The published node at exactly `path`
    pub fn exact(&self, path: &UrlPath, language: &LanguageCode) -> DomainResult<Option<NodeMatch>> {
        self.try_languages(language, |lang| {
            self.query.get_for_path(path, lang, &self.scope)
        })
    }

    /// The deepest published node of one of `types` at or above `path`
    pub fn best_ancestor_with_subresolver(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        types: &[TypeTag],
    ) -> DomainResult<Option<NodeMatch>> {
        if types.is_empty() {
            return Ok(None);
        }
        self.try_languages(language, |lang| {
            self.query.best_match_for_path(path, lang, types, &self.scope)
        })
    }

    pub fn published_count(&self) -> DomainResult<usize> {
        self.query.published_count(&self.scope)
    }

    pub fn non_polymorphic_lookup(&self, id: NodeId) -> DomainResult<Option<NodeSummary>> {
        self.query.non_polymorphic_lookup(id)
    }

    /// Run a lookup in the requested language, then once more in its fallback
    fn try_languages<F>(&self, language: &LanguageCode, lookup: F) -> DomainResult<Option<NodeMatch>>
    where
        F: Fn(&LanguageCode) -> DomainResult<Option<UrlNode>>,
    {
        let chain = self.languages.fallback_chain(language);
        for lang in chain.iter() {
            if let Some(node) = lookup(lang)? {
                return Ok(Some(NodeMatch {
                    node,
                    language: lang.clone(),
                }));
            }
            debug!("No match in language '{}'", lang);
        }
        Ok(None)
    }
}
