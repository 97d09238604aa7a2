pub mod dto;
pub mod repositories;
pub mod services;
pub mod use_cases;

// Re-export key types to avoid naming conflicts
pub use dto::{DispatchOutcome, HttpMethod, PageRequest, PageResponse};
pub use repositories::{NodeRepository, NodeSummary, PageTreeQuery, QueryScope, TranslationRepository};
pub use services::{
    DispatchError, DispatchOptions, FallbackTreeQuery, LanguageConfig, LanguageSettings,
    PageDispatcher, PageTypePlugin, PatternResolver, PluginRegistry, RegistryError, SubResolver,
    TranslationError, TranslationStore,
};
pub use use_cases::{DeletePage, DeleteTranslation, SavePage, ValidationError};
