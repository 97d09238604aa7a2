use crate::application::dto::{PageRequest, PageResponse};
use crate::application::services::PageTypePlugin;
use crate::domain::aggregates::UrlNode;
use crate::domain::value_objects::TypeTag;
use crate::domain::DomainResult;
use serde::Deserialize;
use tracing::warn;

pub const REDIRECT_NODE: &str = "redirect_node";

#[derive(Debug, Deserialize)]
struct RedirectTarget {
    new_url: String,
    #[serde(default = "default_redirect_type")]
    redirect_type: u16,
}

fn default_redirect_type() -> u16 {
    302
}

/// A node that sends visitors elsewhere: `{"new_url": "...", "redirect_type": 301}`
pub struct RedirectNode {
    tag: TypeTag,
}

impl RedirectNode {
    pub fn new() -> DomainResult<Self> {
        Ok(Self {
            tag: TypeTag::new(REDIRECT_NODE)?,
        })
    }
}

impl PageTypePlugin for RedirectNode {
    fn type_tag(&self) -> &TypeTag {
        &self.tag
    }

    fn verbose_name(&self) -> &str {
        "Redirect"
    }

    /// A node without a usable target renders nothing, which surfaces as a
    /// server error rather than a silent 404.
    fn render(&self, _request: &PageRequest, node: &UrlNode) -> Option<PageResponse> {
        let target: RedirectTarget = match serde_json::from_value(node.payload().clone()) {
            Ok(target) => target,
            Err(e) => {
                warn!("Redirect node has no valid target: {}", e);
                return None;
            }
        };
        if target.new_url.trim().is_empty() {
            return None;
        }

        let status = match target.redirect_type {
            301 => 301,
            _ => 302,
        };
        Some(PageResponse::redirect(target.new_url, status))
    }
}
