/// The catch-all page dispatcher: maps a request path onto a node of the
/// page tree, or onto a view inside an application node.
use crate::application::dto::{DispatchOutcome, HttpMethod, PageRequest, PageResponse};
use crate::application::repositories::{PageTreeQuery, QueryScope};
use crate::application::services::language_policy::LanguageConfig;
use crate::application::services::plugin_registry::{
    PageTypePlugin, PluginRegistry, ResolverMatch, ViewContext,
};
use crate::application::services::tree_query::{FallbackTreeQuery, NodeMatch};
use crate::domain::aggregates::UrlNode;
use crate::domain::base::{DomainError, Entity};
use crate::domain::value_objects::{LanguageCode, NodeId, SiteId, TypeTag, UrlPath};
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Status code used for slash redirects
pub const SLASH_REDIRECT_STATUS: u16 = 302;

const INTRO_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>Welcome</title></head>\n<body>\n\
<h1>It works!</h1>\n<p>The page tree is installed, but no page has been published yet.</p>\n\
<p>Create a page and give it the override URL <code>/</code> to show it here.</p>\n\
</body>\n</html>\n";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{}", not_found_message(.path, .language, .fallback))]
    PageNotFound {
        path: String,
        language: LanguageCode,
        fallback: Option<LanguageCode>,
    },

    #[error("No admin page found at '{path}'")]
    AdminPageNotFound { path: String },

    #[error("The view '{handler}' didn't return a response")]
    PluginContractViolation { handler: String },

    #[error("Node #{node} has page type '{type_tag}', which is not a registered page type")]
    InvalidPageType { node: NodeId, type_tag: TypeTag },

    #[error("Method {0} is not allowed")]
    MethodNotAllowed(String),

    #[error(
        "You called '{path}' via POST, but the URL doesn't end in a slash. \
         The request can't be redirected to '{path}/' while keeping the POST data"
    )]
    PostWithoutSlash { path: String },

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),
}

impl DispatchError {
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::PageNotFound { .. } => 404,
            DispatchError::AdminPageNotFound { .. } => 404,
            DispatchError::PluginContractViolation { .. } => 500,
            DispatchError::InvalidPageType { .. } => 403,
            DispatchError::MethodNotAllowed(_) => 405,
            DispatchError::PostWithoutSlash { .. } => 500,
            DispatchError::Repository(_) => 500,
        }
    }
}

fn not_found_message(path: &str, language: &LanguageCode, fallback: &Option<LanguageCode>) -> String {
    let tried = match fallback {
        Some(fallback) => format!(" (language '{}', fallback: '{}')", language, fallback),
        None => format!(", language '{}'", language),
    };
    if path == "/" {
        format!(
            "No published page found for the path '{}'{}. Use the 'Override URL' field \
             to make sure a page can be found at the root of the site.",
            path, tried
        )
    } else {
        format!("No published page found for the path '{}'{}.", path, tried)
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// A handler found in the wider routing space of the application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteMatch {
    pub app_name: Option<String>,
    pub url_name: Option<String>,
}

impl RouteMatch {
    /// Whether the route leads back into this dispatcher
    pub fn is_page_dispatch(&self) -> bool {
        self.app_name.as_deref() == Some("pages") || self.url_name.as_deref() == Some("page")
    }
}

/// The routes served next to the page tree
pub trait RouteTable: Send + Sync {
    fn resolve(&self, path: &str) -> Option<RouteMatch>;
}

/// A fixed list of full-path patterns, first match wins
#[derive(Default)]
pub struct StaticRoutes {
    routes: Vec<(Regex, RouteMatch)>,
}

impl StaticRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        pattern: &str,
        app_name: Option<&str>,
        url_name: Option<&str>,
    ) -> Result<Self, regex::Error> {
        self.routes.push((
            Regex::new(pattern)?,
            RouteMatch {
                app_name: app_name.map(str::to_string),
                url_name: url_name.map(str::to_string),
            },
        ));
        Ok(self)
    }
}

impl RouteTable for StaticRoutes {
    fn resolve(&self, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .find(|(regex, _)| regex.is_match(path))
            .map(|(_, route)| route.clone())
    }
}

/// Dispatcher switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub append_slash: bool,
    pub debug: bool,
    /// Paths below this prefix never produce a page related 404
    pub admin_prefix: Option<String>,
    pub site_id: Option<SiteId>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            append_slash: true,
            debug: false,
            admin_prefix: Some("/admin/".to_string()),
            site_id: None,
        }
    }
}

/// What a path resolves to, before anything is rendered
#[derive(Debug)]
pub enum Resolution {
    /// The node renders itself
    Render(NodeMatch),
    /// A view inside an application node answers
    View {
        matched: NodeMatch,
        route: ResolverMatch,
        sub_path: String,
    },
    Redirect { location: String },
    NotFound,
}

pub struct PageDispatcher {
    registry: Arc<PluginRegistry>,
    languages: LanguageConfig,
    options: DispatchOptions,
    routes: Option<Arc<dyn RouteTable>>,
}

impl PageDispatcher {
    pub fn new(registry: Arc<PluginRegistry>, languages: LanguageConfig, options: DispatchOptions) -> Self {
        Self {
            registry,
            languages,
            options,
            routes: None,
        }
    }

    /// Routes consulted for the generic slash redirect
    pub fn with_routes(mut self, routes: Arc<dyn RouteTable>) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn languages(&self) -> &LanguageConfig {
        &self.languages
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Handle one request: resolve the path, then render or redirect
    pub fn dispatch<Q: PageTreeQuery + ?Sized>(
        &self,
        query: &Q,
        request: &PageRequest,
    ) -> DispatchResult<DispatchOutcome> {
        if let HttpMethod::Other(method) = &request.method {
            return Err(DispatchError::MethodNotAllowed(method.clone()));
        }

        match self.resolve(query, request)? {
            Resolution::Render(found) => {
                let plugin = self.plugin_for(&found.node)?;
                match plugin.render(request, &found.node) {
                    Some(response) => Ok(rendered(response, found)),
                    None => {
                        let handler = format!("{}.render", plugin.type_tag());
                        error!("Page type '{}' didn't return a response", plugin.type_tag());
                        Err(DispatchError::PluginContractViolation { handler })
                    }
                }
            }
            Resolution::View {
                matched,
                route,
                sub_path,
            } => {
                let context = ViewContext {
                    request,
                    node: &matched.node,
                    sub_path: &sub_path,
                    args: &route.args,
                    kwargs: &route.kwargs,
                };
                match (route.view)(&context) {
                    Some(response) => Ok(rendered(response, matched)),
                    None => {
                        error!("The view '{}' didn't return a response", route.handler_name());
                        Err(DispatchError::PluginContractViolation {
                            handler: route.handler_name().to_string(),
                        })
                    }
                }
            }
            Resolution::Redirect { location } => {
                info!("Redirecting '{}' to '{}'", request.path, location);
                Ok(DispatchOutcome::Redirect {
                    location,
                    status: SLASH_REDIRECT_STATUS,
                })
            }
            Resolution::NotFound => self.not_found(query, request),
        }
    }

    /// Find what serves `request`, trying in order: the exact node, the same
    /// path with a slash added, an application node above the path, and the
    /// rest of the routing space with a slash added.
    pub fn resolve<Q: PageTreeQuery + ?Sized>(
        &self,
        query: &Q,
        request: &PageRequest,
    ) -> DispatchResult<Resolution> {
        let path = match UrlPath::new(request.path.clone()) {
            Ok(path) => path,
            Err(_) => return Ok(Resolution::NotFound),
        };
        let language = &request.language;
        let tree = FallbackTreeQuery::new(query, &self.languages, self.scope());
        let add_slash = self.options.append_slash && !path.has_trailing_slash();

        if let Some(found) = tree.exact(&path, language)? {
            // An application node may take over its own URL.
            let plugin = self.plugin_for(&found.node)?;
            if let Some(route) = plugin.url_resolver().and_then(|resolver| resolver.resolve("/")) {
                return Ok(Resolution::View {
                    matched: found,
                    route,
                    sub_path: "/".to_string(),
                });
            }
            return Ok(Resolution::Render(found));
        }
        debug!("No node at '{}'", path);

        if add_slash && tree.exact(&path.with_trailing_slash(), language)?.is_some() {
            return Ok(Resolution::Redirect {
                location: request.slash_location(),
            });
        }

        let types = self.registry.url_pattern_types();
        if let Some(found) = tree.best_ancestor_with_subresolver(&path, language, &types)? {
            if let Some(resolution) = self.resolve_below(found, &path, request)? {
                return Ok(resolution);
            }
        }
        debug!("No application node serves '{}'", path);

        if add_slash {
            if let Some(routes) = &self.routes {
                let slashed = format!("{}/", request.path);
                if let Some(route) = routes.resolve(&slashed) {
                    if !route.is_page_dispatch() {
                        if self.options.debug && request.method == HttpMethod::Post {
                            return Err(DispatchError::PostWithoutSlash {
                                path: request.path.clone(),
                            });
                        }
                        return Ok(Resolution::Redirect {
                            location: request.slash_location(),
                        });
                    }
                }
            }
        }

        Ok(Resolution::NotFound)
    }

    /// Resolve the part of `path` below an application node
    fn resolve_below(
        &self,
        found: NodeMatch,
        path: &UrlPath,
        request: &PageRequest,
    ) -> DispatchResult<Option<Resolution>> {
        let plugin = self.plugin_for(&found.node)?;
        let Some(resolver) = plugin.url_resolver() else {
            return Ok(None);
        };
        let Some(base) = found.node.cached_url().and_then(|url| UrlPath::new(url).ok()) else {
            return Ok(None);
        };
        let Some(sub_path) = path.sub_path_after(&base) else {
            return Ok(None);
        };

        if let Some(route) = resolver.resolve(&sub_path) {
            return Ok(Some(Resolution::View {
                matched: found,
                route,
                sub_path,
            }));
        }

        if self.options.append_slash && !sub_path.ends_with('/') {
            let slashed = format!("{}/", sub_path);
            if resolver.resolve(&slashed).is_some() {
                return Ok(Some(Resolution::Redirect {
                    location: request.slash_location(),
                }));
            }
        }
        Ok(None)
    }

    fn not_found<Q: PageTreeQuery + ?Sized>(
        &self,
        query: &Q,
        request: &PageRequest,
    ) -> DispatchResult<DispatchOutcome> {
        if let Some(prefix) = &self.options.admin_prefix {
            if request.path.starts_with(prefix.as_str()) {
                return Err(DispatchError::AdminPageNotFound {
                    path: request.path.clone(),
                });
            }
        }

        if self.options.debug && request.path == "/" && query.published_count(&self.scope())? == 0 {
            info!("No published pages yet, showing the intro page");
            return Ok(DispatchOutcome::Rendered {
                response: PageResponse::html(INTRO_PAGE),
                node: None,
                language: request.language.clone(),
            });
        }

        let fallback = self.languages.fallback_for(&request.language).cloned();
        let error = DispatchError::PageNotFound {
            path: request.path.clone(),
            language: request.language.clone(),
            fallback,
        };
        warn!("{}", error);
        Err(error)
    }

    fn plugin_for(&self, node: &UrlNode) -> DispatchResult<&dyn PageTypePlugin> {
        self.registry.get(node.type_tag()).ok_or_else(|| {
            let id = node.id().copied();
            error!("No page type registered for '{}'", node.type_tag());
            match id {
                Some(node_id) => DispatchError::InvalidPageType {
                    node: node_id,
                    type_tag: node.type_tag().clone(),
                },
                None => DispatchError::Repository(DomainError::InvalidOperation(format!(
                    "Unsaved node of type '{}' can't be dispatched",
                    node.type_tag()
                ))),
            }
        })
    }

    fn scope(&self) -> QueryScope {
        QueryScope::new(self.options.site_id)
    }
}

fn rendered(response: PageResponse, found: NodeMatch) -> DispatchOutcome {
    DispatchOutcome::Rendered {
        response,
        node: found.node.id().copied(),
        language: found.language,
    }
}
