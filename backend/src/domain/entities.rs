/// Domain entities
use super::base::{DomainError, Entity};
use super::value_objects::{LanguageCode, NodeId, TranslationId, UrlPath};
use std::fmt;
use std::str::FromStr;

/// The language-dependent fields of a node that can be read and written by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslatedField {
    Title,
    Slug,
    OverrideUrl,
}

impl TranslatedField {
    pub const ALL: [TranslatedField; 3] = [
        TranslatedField::Title,
        TranslatedField::Slug,
        TranslatedField::OverrideUrl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TranslatedField::Title => "title",
            TranslatedField::Slug => "slug",
            TranslatedField::OverrideUrl => "override_url",
        }
    }
}

impl FromStr for TranslatedField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TranslatedField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| DomainError::InvalidValue(format!("Unknown translated field: {}", s)))
    }
}

impl fmt::Display for TranslatedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The field values of one translation.
///
/// `cached_url` is derived on save and can't be assigned through [`TranslatedField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedFields {
    pub title: String,
    pub slug: String,
    pub override_url: String,
    pub cached_url: String,
}

impl TranslatedFields {
    pub fn get(&self, field: TranslatedField) -> &str {
        match field {
            TranslatedField::Title => &self.title,
            TranslatedField::Slug => &self.slug,
            TranslatedField::OverrideUrl => &self.override_url,
        }
    }

    pub fn set(&mut self, field: TranslatedField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TranslatedField::Title => self.title = value,
            TranslatedField::Slug => self.slug = value,
            TranslatedField::OverrideUrl => self.override_url = value,
        }
    }
}

/// A Translation holds the language-dependent fields of a single node in a single language.
///
/// The values seen at load (or creation) time are kept as a snapshot, so a
/// translation only goes back to storage when something actually changed.
#[derive(Debug, Clone)]
pub struct Translation {
    id: Option<TranslationId>,
    master_id: Option<NodeId>,
    language_code: LanguageCode,
    fields: TranslatedFields,
    original: TranslatedFields,
}

impl Translation {
    /// Create an empty, unsaved translation.
    ///
    /// `master_id` may be `None` when the owning node has not been stored yet;
    /// it is filled in when the node is saved.
    pub fn new(language_code: LanguageCode, master_id: Option<NodeId>) -> Self {
        Translation {
            id: None,
            master_id,
            language_code,
            fields: TranslatedFields::default(),
            original: TranslatedFields::default(),
        }
    }

    /// Rebuild a translation that was read from storage
    pub fn from_storage(
        id: TranslationId,
        master_id: NodeId,
        language_code: LanguageCode,
        fields: TranslatedFields,
    ) -> Self {
        Translation {
            id: Some(id),
            master_id: Some(master_id),
            language_code,
            original: fields.clone(),
            fields,
        }
    }

    pub fn language_code(&self) -> &LanguageCode {
        &self.language_code
    }

    pub fn master_id(&self) -> Option<NodeId> {
        self.master_id
    }

    /// Attach the owning node, unless a reference is already present
    pub fn assign_master(&mut self, master_id: NodeId) {
        if self.master_id.is_none() {
            self.master_id = Some(master_id);
        }
    }

    pub fn fields(&self) -> &TranslatedFields {
        &self.fields
    }

    pub fn get(&self, field: TranslatedField) -> &str {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: TranslatedField, value: impl Into<String>) {
        self.fields.set(field, value);
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn slug(&self) -> &str {
        &self.fields.slug
    }

    /// The override URL, if one was entered
    pub fn override_url(&self) -> Option<&str> {
        let value = self.fields.override_url.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// The resolved path of this translation, once computed
    pub fn cached_url(&self) -> Option<&str> {
        if self.fields.cached_url.is_empty() {
            None
        } else {
            Some(&self.fields.cached_url)
        }
    }

    pub fn set_cached_url(&mut self, url: &UrlPath) {
        self.fields.cached_url = url.as_str().to_string();
    }

    /// Whether any field differs from the snapshot taken at load or creation time
    pub fn is_modified(&self) -> bool {
        self.fields != self.original
    }

    /// Record a successful write: the id is stored and the snapshot refreshed
    pub fn mark_saved(&mut self, id: TranslationId) {
        self.id = Some(id);
        self.original = self.fields.clone();
    }
}

impl Entity for Translation {
    type Id = TranslationId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LanguageCode {
        LanguageCode::new("en").unwrap()
    }

    #[test]
    fn test_new_translation_is_unmodified() {
        let translation = Translation::new(en(), None);

        assert!(!translation.is_persisted());
        assert!(!translation.is_modified());
        assert!(translation.master_id().is_none());
        assert_eq!(translation.title(), "");
    }

    #[test]
    fn test_setting_field_marks_modified() {
        let mut translation = Translation::new(en(), None);
        translation.set(TranslatedField::Title, "About");

        assert!(translation.is_modified());
        assert_eq!(translation.get(TranslatedField::Title), "About");
    }

    #[test]
    fn test_setting_same_value_is_not_a_modification() {
        let fields = TranslatedFields {
            title: "About".to_string(),
            slug: "about".to_string(),
            ..Default::default()
        };
        let mut translation = Translation::from_storage(
            TranslationId::new(1),
            NodeId::new(1).unwrap(),
            en(),
            fields,
        );

        translation.set(TranslatedField::Title, "About");
        assert!(!translation.is_modified());

        translation.set(TranslatedField::Slug, "about-us");
        assert!(translation.is_modified());
    }

    #[test]
    fn test_mark_saved_refreshes_snapshot() {
        let mut translation = Translation::new(en(), None);
        translation.set(TranslatedField::Slug, "news");
        translation.mark_saved(TranslationId::new(4));

        assert!(!translation.is_modified());
        assert_eq!(translation.id(), Some(&TranslationId::new(4)));
    }

    #[test]
    fn test_assign_master_keeps_existing_reference() {
        let mut translation = Translation::new(en(), Some(NodeId::new(3).unwrap()));
        translation.assign_master(NodeId::new(9).unwrap());
        assert_eq!(translation.master_id(), Some(NodeId::new(3).unwrap()));

        let mut orphan = Translation::new(en(), None);
        orphan.assign_master(NodeId::new(9).unwrap());
        assert_eq!(orphan.master_id(), Some(NodeId::new(9).unwrap()));
    }

    #[test]
    fn test_override_url_blank_is_none() {
        let mut translation = Translation::new(en(), None);
        assert!(translation.override_url().is_none());

        translation.set(TranslatedField::OverrideUrl, "  ");
        assert!(translation.override_url().is_none());

        translation.set(TranslatedField::OverrideUrl, "/");
        assert_eq!(translation.override_url(), Some("/"));
    }

    #[test]
    fn test_translated_field_names() {
        assert_eq!("override_url".parse::<TranslatedField>().unwrap(), TranslatedField::OverrideUrl);
        assert!("cached_url".parse::<TranslatedField>().is_err());
        assert_eq!(TranslatedField::Title.to_string(), "title");
    }
}
