/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a UrlNode, assigned by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(i64);

impl NodeId {
    pub fn new(id: i64) -> DomainResult<Self> {
        if id <= 0 {
            return Err(DomainError::InvalidValue(format!(
                "NodeId must be positive, got {}",
                id
            )));
        }
        Ok(NodeId(id))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ValueObject for NodeId {}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a stored Translation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationId(i64);

impl TranslationId {
    pub fn new(id: i64) -> Self {
        TranslationId(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ValueObject for TranslationId {}

impl fmt::Display for TranslationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the site a node belongs to (multi-site filter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(i64);

impl SiteId {
    pub fn new(id: i64) -> Self {
        SiteId(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ValueObject for SiteId {}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized language code such as `en` or `pt-br`.
///
/// Codes are lowercased and `_` is replaced by `-`, so `pt_BR` and `pt-br`
/// address the same translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_lowercase().replace('_', "-");
        if code.is_empty() {
            return Err(DomainError::InvalidValue(
                "Language code cannot be empty".to_string(),
            ));
        }
        if code.len() > 15 {
            return Err(DomainError::InvalidValue(format!(
                "Language code is too long: {}",
                code
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::InvalidValue(format!(
                "Invalid language code: {}",
                code
            )));
        }
        Ok(LanguageCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag, e.g. `zh` for `zh-hans`
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl ValueObject for LanguageCode {}

/// English, the language used when nothing else is configured
impl Default for LanguageCode {
    fn default() -> Self {
        LanguageCode("en".to_string())
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LanguageCode::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl FromStr for LanguageCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::new(s)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The polymorphic type tag naming the page type plugin that owns a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> DomainResult<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(DomainError::InvalidValue("TypeTag cannot be empty".to_string()));
        }
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Err(DomainError::InvalidValue(format!("Invalid type tag: {}", tag)));
        }
        Ok(TypeTag(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for TypeTag {}

impl TryFrom<String> for TypeTag {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeTag::new(value)
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A URL slug: letters, digits, hyphens and underscores
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(slug: impl Into<String>) -> DomainResult<Self> {
        let slug = slug.into();
        if slug.is_empty() {
            return Err(DomainError::InvalidValue("Slug cannot be empty".to_string()));
        }
        if !slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidValue(format!(
                "Slug may only contain letters, numbers, underscores or hyphens: {}",
                slug
            )));
        }
        Ok(Slug(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An absolute URL path, always starting with `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath(String);

impl UrlPath {
    pub fn new(path: impl Into<String>) -> DomainResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(DomainError::InvalidValue(format!(
                "URL path must start with '/': {}",
                path
            )));
        }
        if path.contains("//") {
            return Err(DomainError::InvalidValue(format!(
                "URL path contains an empty segment: {}",
                path
            )));
        }
        if path.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
            return Err(DomainError::InvalidValue(format!(
                "URL path contains invalid characters: {}",
                path
            )));
        }
        Ok(UrlPath(path))
    }

    pub fn root() -> Self {
        UrlPath("/".to_string())
    }

    /// The slug-derived path of a node: `<parent>/<slug>/`, or `/<slug>/` at the root
    pub fn for_slug(parent: Option<&UrlPath>, slug: &Slug) -> Self {
        match parent {
            Some(parent) => {
                let base = parent.0.trim_end_matches('/');
                UrlPath(format!("{}/{}/", base, slug.as_str()))
            }
            None => UrlPath(format!("/{}/", slug.as_str())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.0.ends_with('/')
    }

    pub fn with_trailing_slash(&self) -> Self {
        if self.has_trailing_slash() {
            self.clone()
        } else {
            UrlPath(format!("{}/", self.0))
        }
    }

    /// Whether `self` lies at or below `prefix`, segment-wise
    pub fn starts_with(&self, prefix: &UrlPath) -> bool {
        let base = prefix.0.trim_end_matches('/');
        match self.0.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The remainder of this path below `prefix`, always starting with `/`.
    ///
    /// `/blog/2024/` below `/blog/` gives `/2024/`; `/blog/` below `/blog/` gives `/`.
    pub fn sub_path_after(&self, prefix: &UrlPath) -> Option<String> {
        let base = prefix.0.trim_end_matches('/');
        let rest = self.0.strip_prefix(base)?;
        if rest.is_empty() {
            return None;
        }
        if !rest.starts_with('/') {
            return None;
        }
        Some(rest.to_string())
    }
}

impl ValueObject for UrlPath {}

impl FromStr for UrlPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UrlPath::new(s)
    }
}

impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication status of a node; only published nodes are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }
}

impl ValueObject for PageStatus {}

impl FromStr for PageStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            other => Err(DomainError::InvalidValue(format!(
                "Unknown page status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
