/// Page type plugins and the registry mapping type tags to them
use crate::application::dto::{PageRequest, PageResponse};
use crate::domain::aggregates::UrlNode;
use crate::domain::value_objects::TypeTag;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Page type '{0}' is already registered")]
    AlreadyRegistered(TypeTag),
}

/// Everything a sub-URL view gets to see
pub struct ViewContext<'a> {
    pub request: &'a PageRequest,
    /// The application node owning the URL
    pub node: &'a UrlNode,
    /// The part of the path below the node, starting with `/`
    pub sub_path: &'a str,
    pub args: &'a [String],
    pub kwargs: &'a BTreeMap<String, String>,
}

/// A view serving part of an application node's URL space.
///
/// Returning `None` is a programming error in the view; the dispatcher
/// reports it as a contract violation.
pub type PageView = Arc<dyn Fn(&ViewContext<'_>) -> Option<PageResponse> + Send + Sync>;

/// Wrap a closure as a [`PageView`]
pub fn view<F>(f: F) -> PageView
where
    F: Fn(&ViewContext<'_>) -> Option<PageResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The result of resolving a sub-path
#[derive(Clone)]
pub struct ResolverMatch {
    pub view: PageView,
    pub url_name: Option<String>,
    pub args: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
}

impl ResolverMatch {
    pub fn new(view: PageView) -> Self {
        Self {
            view,
            url_name: None,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// How to refer to this view in diagnostics
    pub fn handler_name(&self) -> &str {
        self.url_name.as_deref().unwrap_or("<unnamed view>")
    }
}

impl fmt::Debug for ResolverMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMatch")
            .field("url_name", &self.url_name)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

/// Resolves the sub-paths below an application node
pub trait SubResolver: Send + Sync {
    fn resolve(&self, sub_path: &str) -> Option<ResolverMatch>;
}

/// The behaviour of one page type
pub trait PageTypePlugin: Send + Sync {
    fn type_tag(&self) -> &TypeTag;

    /// Human readable name of the page type
    fn verbose_name(&self) -> &str;

    /// Render a node of this type. `None` means the plugin is broken.
    fn render(&self, request: &PageRequest, node: &UrlNode) -> Option<PageResponse>;

    /// A plugin exposing a resolver owns the URL space below its nodes
    fn url_resolver(&self) -> Option<&dyn SubResolver> {
        None
    }
}

/// Collects plugins at start-up. Registration happens only here, so a built
/// registry never changes.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn PageTypePlugin>>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: PageTypePlugin + 'static>(&mut self, plugin: P) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(plugin))
    }

    pub fn register_shared(&mut self, plugin: Arc<dyn PageTypePlugin>) -> Result<(), RegistryError> {
        if self
            .plugins
            .iter()
            .any(|existing| existing.type_tag() == plugin.type_tag())
        {
            return Err(RegistryError::AlreadyRegistered(plugin.type_tag().clone()));
        }
        info!(
            "Registered page type '{}' ({})",
            plugin.type_tag(),
            plugin.verbose_name()
        );
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn build(self) -> PluginRegistry {
        let order: Vec<TypeTag> = self
            .plugins
            .iter()
            .map(|plugin| plugin.type_tag().clone())
            .collect();
        let plugins = self
            .plugins
            .into_iter()
            .map(|plugin| (plugin.type_tag().clone(), plugin))
            .collect();
        PluginRegistry { plugins, order }
    }
}

/// An immutable mapping from type tag to plugin
pub struct PluginRegistry {
    plugins: HashMap<TypeTag, Arc<dyn PageTypePlugin>>,
    order: Vec<TypeTag>,
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::new()
    }

    pub fn get(&self, type_tag: &TypeTag) -> Option<&dyn PageTypePlugin> {
        self.plugins.get(type_tag).map(|plugin| plugin.as_ref())
    }

    pub fn contains(&self, type_tag: &TypeTag) -> bool {
        self.plugins.contains_key(type_tag)
    }

    /// Type tags in registration order
    pub fn type_tags(&self) -> &[TypeTag] {
        &self.order
    }

    /// The types whose nodes own a URL space of their own
    pub fn url_pattern_types(&self) -> Vec<TypeTag> {
        self.order
            .iter()
            .filter(|tag| {
                self.plugins
                    .get(*tag)
                    .is_some_and(|plugin| plugin.url_resolver().is_some())
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
