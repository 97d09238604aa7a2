pub mod node_repository;
pub mod page_tree_query;
pub mod translation_repository;

#[cfg(test)]
pub mod in_memory;

pub use node_repository::NodeRepository;
pub use page_tree_query::{NodeSummary, PageTreeQuery, QueryScope};
pub use translation_repository::TranslationRepository;
