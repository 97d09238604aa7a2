pub mod redirect_node;
pub mod text_page;

pub use redirect_node::{RedirectNode, REDIRECT_NODE};
pub use text_page::{TextPage, TEXT_PAGE};

use crate::application::services::PluginRegistryBuilder;
use anyhow::Result;

/// Register the page types that ship with the crate
pub fn register_builtin(builder: &mut PluginRegistryBuilder) -> Result<()> {
    builder.register(TextPage::new()?)?;
    builder.register(RedirectNode::new()?)?;
    Ok(())
}
