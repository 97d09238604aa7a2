use page_tree::application::{
    repositories::{NodeRepository, TranslationRepository},
    services::{LanguageConfig, LanguageSettings, TranslationError, TranslationStore},
    use_cases::{DeleteTranslation, SavePage},
};
use page_tree::domain::{
    aggregates::UrlNode,
    entities::{TranslatedField, Translation},
    value_objects::{LanguageCode, NodeId, PageStatus, TypeTag},
    DomainError,
};
use page_tree::infrastructure::{page_types::TEXT_PAGE, SqlitePageRepository};

fn code(value: &str) -> LanguageCode {
    LanguageCode::new(value).unwrap()
}

/// `fr` falls back to `en`; `nl` carries content but is never consulted for `fr`
fn languages() -> LanguageConfig {
    LanguageConfig::new(
        code("en"),
        vec![
            LanguageSettings::new(code("en")),
            LanguageSettings::new(code("nl")),
            LanguageSettings::new(code("fr")).with_fallback(code("en")),
        ],
    )
}

fn create_page(repo: &mut SqlitePageRepository, language: &str, title: &str, slug: &str) -> NodeId {
    let mut node = UrlNode::new(TypeTag::new(TEXT_PAGE).unwrap(), code(language));
    node.set_status(PageStatus::Published);
    let mut translation = Translation::new(code(language), None);
    translation.set(TranslatedField::Title, title);
    translation.set(TranslatedField::Slug, slug);
    node.translations_mut().insert(translation);
    SavePage::new(repo, &languages()).execute(&mut node).unwrap()
}

fn load(repo: &SqlitePageRepository, id: NodeId, language: &str) -> UrlNode {
    repo.find_by_id(id, &code(language)).unwrap().unwrap()
}

#[test]
fn test_fallback_read_is_stable() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    let mut node = load(&repo, id, "fr");
    let (first, second) = {
        let store = TranslationStore::new(&mut repo, &config);
        let first = store.read(&mut node, &code("fr"), true).unwrap().fields().clone();
        let second = store.read(&mut node, &code("fr"), true).unwrap().fields().clone();
        (first, second)
    };
    assert_eq!(first, second);
    assert_eq!(first.title, "About us");
    assert!(node.translations().is_marked_missing(&code("fr")));

    let mut fresh = load(&repo, id, "fr");
    let store = TranslationStore::new(&mut repo, &config);
    let fresh_fields = store.read(&mut fresh, &code("fr"), true).unwrap().fields().clone();
    assert_eq!(fresh_fields, first);
}

#[test]
fn test_read_without_fallback_fails() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    let mut node = load(&repo, id, "fr");
    let store = TranslationStore::new(&mut repo, &config);
    let error = store.read(&mut node, &code("fr"), false).unwrap_err();

    assert!(matches!(error, TranslationError::NotFound { ref language, .. } if language == &code("fr")));
}

#[test]
fn test_only_one_fallback_hop() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    // Only a Dutch version exists
    let id = create_page(&mut repo, "nl", "Over ons", "over-ons");
    let config = languages();

    let mut node = load(&repo, id, "fr");
    let store = TranslationStore::new(&mut repo, &config);
    let error = store.read(&mut node, &code("fr"), true).unwrap_err();

    match error {
        TranslationError::NotFound { node: Some(node_id), language } => {
            assert_eq!(node_id, id);
            assert_eq!(language, code("en"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(
        format!("{}", TranslationError::NotFound { node: Some(id), language: code("en") }),
        format!("UrlNode #{} does not have a translation for language 'en'", id)
    );
}

#[test]
fn test_write_creates_one_record_and_read_creates_none() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    // Reading a missing language must not add a record
    let mut node = load(&repo, id, "nl");
    {
        let store = TranslationStore::new(&mut repo, &config);
        assert_eq!(store.get_field_by_name(&mut node, "title").unwrap(), "About us");
    }
    assert_eq!(repo.available_languages(id).unwrap(), vec![code("en")]);

    {
        let mut store = TranslationStore::new(&mut repo, &config);
        store.set_field(&mut node, TranslatedField::Title, "Over ons").unwrap();
        assert!(store.save(&mut node).unwrap());
        // Nothing changed since the last save
        assert!(!store.save(&mut node).unwrap());
    }

    let mut languages_stored = repo.available_languages(id).unwrap();
    languages_stored.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(languages_stored, vec![code("en"), code("nl")]);

    let dutch = repo.find_translation(id, &code("nl")).unwrap().unwrap();
    assert_eq!(dutch.title(), "Over ons");
    // Untouched English is unchanged
    let english = repo.find_translation(id, &code("en")).unwrap().unwrap();
    assert_eq!(english.title(), "About us");
}

#[test]
fn test_unknown_field_name() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    let mut node = load(&repo, id, "en");
    let store = TranslationStore::new(&mut repo, &config);
    let error = store.set_field_by_name(&mut node, "colour", "blue").unwrap_err();
    assert!(matches!(error, TranslationError::UnknownField(ref name) if name == "colour"));
}

#[test]
fn test_each_language_gets_its_own_url() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    let mut node = load(&repo, id, "nl");
    {
        let store = TranslationStore::new(&mut repo, &config);
        store.set_field(&mut node, TranslatedField::Title, "Over ons").unwrap();
        store.set_field(&mut node, TranslatedField::Slug, "over-ons").unwrap();
    }
    SavePage::new(&mut repo, &config).execute(&mut node).unwrap();

    let dutch = repo.find_translation(id, &code("nl")).unwrap().unwrap();
    assert_eq!(dutch.cached_url(), Some("/over-ons/"));
    let english = repo.find_translation(id, &code("en")).unwrap().unwrap();
    assert_eq!(english.cached_url(), Some("/about/"));
}

#[test]
fn test_delete_translation_keeps_the_last_one() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let id = create_page(&mut repo, "en", "About us", "about");
    let config = languages();

    let mut node = load(&repo, id, "nl");
    {
        let mut store = TranslationStore::new(&mut repo, &config);
        store.set_field(&mut node, TranslatedField::Title, "Over ons").unwrap();
        store.save(&mut node).unwrap();
    }

    assert!(DeleteTranslation::new(&mut repo).execute(id, &code("nl")).unwrap());
    assert!(!DeleteTranslation::new(&mut repo).execute(id, &code("nl")).unwrap());

    let error = DeleteTranslation::new(&mut repo)
        .execute(id, &code("en"))
        .unwrap_err();
    assert!(matches!(error, DomainError::BusinessRuleViolation(_)));
}
