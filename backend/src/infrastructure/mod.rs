pub mod config;
pub mod http;
pub mod logging;
pub mod page_types;
pub mod persistence;

pub use config::Settings;
pub use persistence::SqlitePageRepository;
