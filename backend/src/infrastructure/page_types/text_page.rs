use crate::application::dto::{PageRequest, PageResponse};
use crate::application::services::PageTypePlugin;
use crate::domain::aggregates::UrlNode;
use crate::domain::value_objects::TypeTag;
use crate::domain::DomainResult;

pub const TEXT_PAGE: &str = "text_page";

/// A page showing its title and an HTML body stored under `text` in the payload
pub struct TextPage {
    tag: TypeTag,
}

impl TextPage {
    pub fn new() -> DomainResult<Self> {
        Ok(Self {
            tag: TypeTag::new(TEXT_PAGE)?,
        })
    }
}

impl PageTypePlugin for TextPage {
    fn type_tag(&self) -> &TypeTag {
        &self.tag
    }

    fn verbose_name(&self) -> &str {
        "Text page"
    }

    fn render(&self, _request: &PageRequest, node: &UrlNode) -> Option<PageResponse> {
        let text = node
            .payload()
            .get("text")
            .and_then(|value| value.as_str())
            .unwrap_or_default();
        let title = escape_html(node.title());

        Some(PageResponse::html(format!(
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head><title>{}</title></head>\n<body>\n<h1>{}</h1>\n{}\n</body>\n</html>\n",
            node.current_language(),
            title,
            title,
            text
        )))
    }
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
