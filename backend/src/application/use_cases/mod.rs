pub mod delete_page;
pub mod save_page;

pub use delete_page::{DeletePage, DeleteTranslation};
pub use save_page::{SavePage, UrlSource, ValidationError, ValidationResult};
