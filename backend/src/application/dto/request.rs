use crate::domain::value_objects::{LanguageCode, NodeId};
use std::fmt;

/// HTTP method of an incoming page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    /// Any other method; the dispatcher refuses these
    Other(String),
}

impl HttpMethod {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            other => HttpMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Other(name) => name,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request for a page, as seen by the dispatcher
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// The absolute request path, without query string
    pub path: String,
    /// The language negotiated for this request
    pub language: LanguageCode,
    pub method: HttpMethod,
    /// The raw query string, without the leading `?`
    pub query_string: Option<String>,
}

impl PageRequest {
    pub fn new(path: impl Into<String>, language: LanguageCode) -> Self {
        Self {
            path: path.into(),
            language,
            method: HttpMethod::Get,
            query_string: None,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        let query_string = query_string.into();
        self.query_string = if query_string.is_empty() {
            None
        } else {
            Some(query_string)
        };
        self
    }

    /// The location of the same request with a trailing slash added to the path
    pub fn slash_location(&self) -> String {
        match &self.query_string {
            Some(query) => format!("{}/?{}", self.path, query),
            None => format!("{}/", self.path),
        }
    }
}

/// A response produced by a page type or one of its views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl PageResponse {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// A redirect answered by a page type itself, such as a redirect node
    pub fn redirect(location: impl Into<String>, status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: String::new(),
            headers: vec![("Location".to_string(), location.into())],
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What the dispatcher decided for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A page (or one of its sub-URL views) answered
    Rendered {
        response: PageResponse,
        /// The node that served the request; `None` for the intro page
        node: Option<NodeId>,
        /// The language the node was found in, which may be the fallback
        language: LanguageCode,
    },
    /// The client should retry at `location`
    Redirect { location: String, status: u16 },
}

impl DispatchOutcome {
    pub fn status(&self) -> u16 {
        match self {
            DispatchOutcome::Rendered { response, .. } => response.status,
            DispatchOutcome::Redirect { status, .. } => *status,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            DispatchOutcome::Rendered { node, .. } => *node,
            DispatchOutcome::Redirect { .. } => None,
        }
    }
}
