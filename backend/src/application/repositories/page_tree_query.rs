use crate::domain::{
    aggregates::UrlNode,
    value_objects::{LanguageCode, NodeId, PageStatus, SiteId, TypeTag, UrlPath},
    DomainResult,
};
use chrono::{DateTime, Utc};

/// Which nodes a tree query may return: the site filter and the moment used
/// for the publication window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryScope {
    pub site_id: Option<SiteId>,
    pub now: DateTime<Utc>,
}

impl QueryScope {
    pub fn new(site_id: Option<SiteId>) -> Self {
        Self {
            site_id,
            now: Utc::now(),
        }
    }

    pub fn at(site_id: Option<SiteId>, now: DateTime<Utc>) -> Self {
        Self { site_id, now }
    }
}

/// The type information of a node, read without loading the node itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub type_tag: TypeTag,
    pub status: PageStatus,
}

/// Read-only queries over the published page tree.
///
/// Every method only considers nodes that are published within `scope`.
/// The returned node has `language` as its current language and the
/// matching translation already in its cache. Queries apply no language
/// fallback of their own; see `FallbackTreeQuery` for that.
pub trait PageTreeQuery {
    /// The node whose resolved path in `language` equals `path`.
    fn get_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>>;

    /// The node of one of `types` whose resolved path in `language` is the
    /// longest segment-wise prefix of `path`.
    fn best_match_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        types: &[TypeTag],
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>>;

    /// The number of published nodes in scope.
    fn published_count(&self, scope: &QueryScope) -> DomainResult<usize>;

    /// Type and status of a node, regardless of publication state.
    fn non_polymorphic_lookup(&self, id: NodeId) -> DomainResult<Option<NodeSummary>>;
}
