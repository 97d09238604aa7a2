pub mod dispatcher;
pub mod language_policy;
pub mod pattern_resolver;
pub mod plugin_registry;
pub mod translation_store;
pub mod tree_query;

pub use dispatcher::{
    DispatchError, DispatchOptions, DispatchResult, PageDispatcher, Resolution, RouteMatch,
    RouteTable, StaticRoutes,
};
pub use language_policy::{FallbackChain, LanguageConfig, LanguageSettings};
pub use pattern_resolver::PatternResolver;
pub use plugin_registry::{
    view, PageTypePlugin, PageView, PluginRegistry, PluginRegistryBuilder, RegistryError,
    ResolverMatch, SubResolver, ViewContext,
};
pub use translation_store::{TranslationError, TranslationResult, TranslationStore};
pub use tree_query::{FallbackTreeQuery, NodeMatch};
