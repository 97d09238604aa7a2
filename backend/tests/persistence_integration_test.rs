use chrono::{Duration, Utc};
use page_tree::application::{
    repositories::{NodeRepository, PageTreeQuery, QueryScope, TranslationRepository},
    services::{LanguageConfig, LanguageSettings},
    use_cases::{DeletePage, SavePage, UrlSource, ValidationError},
};
use page_tree::domain::{
    aggregates::UrlNode,
    base::Entity,
    entities::{TranslatedField, Translation},
    value_objects::{LanguageCode, NodeId, PageStatus, SiteId, TypeTag, UrlPath},
};
use page_tree::infrastructure::{page_types::TEXT_PAGE, SqlitePageRepository};

fn code(value: &str) -> LanguageCode {
    LanguageCode::new(value).unwrap()
}

fn path(value: &str) -> UrlPath {
    UrlPath::new(value).unwrap()
}

fn languages() -> LanguageConfig {
    LanguageConfig::new(
        code("en"),
        vec![LanguageSettings::new(code("en")), LanguageSettings::new(code("nl"))],
    )
}

fn draft(slug: &str, parent: Option<NodeId>) -> UrlNode {
    let mut node = UrlNode::new(TypeTag::new(TEXT_PAGE).unwrap(), code("en"));
    node.set_status(PageStatus::Published);
    node.set_parent(parent);
    let mut translation = Translation::new(code("en"), None);
    translation.set(TranslatedField::Title, slug);
    translation.set(TranslatedField::Slug, slug);
    node.translations_mut().insert(translation);
    node
}

fn save(repo: &mut SqlitePageRepository, node: &mut UrlNode) -> Result<NodeId, ValidationError> {
    SavePage::new(repo, &languages()).execute(node)
}

fn url_of(repo: &SqlitePageRepository, id: NodeId) -> Option<String> {
    repo.find_translation(id, &code("en"))
        .unwrap()
        .and_then(|t| t.cached_url().map(str::to_string))
}

#[test]
fn test_pages_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pages.db");

    let id = {
        let mut repo = SqlitePageRepository::new_with_path(&db_path).unwrap();
        let mut node = draft("about", None);
        node.set_payload(serde_json::json!({"text": "<p>Hi</p>"}));
        save(&mut repo, &mut node).unwrap()
    };

    let repo = SqlitePageRepository::new_with_path(&db_path).unwrap();
    let node = repo.find_by_id(id, &code("en")).unwrap().unwrap();
    assert_eq!(node.title(), "about");
    assert_eq!(node.cached_url(), Some("/about/"));
    assert_eq!(node.payload()["text"], "<p>Hi</p>");

    let found = repo
        .get_for_path(&path("/about/"), &code("en"), &QueryScope::new(None))
        .unwrap()
        .unwrap();
    assert_eq!(found.id().copied(), Some(id));
}

#[test]
fn test_colliding_slugs_fail_before_persistence() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    save(&mut repo, &mut draft("about", None)).unwrap();

    let mut duplicate = draft("about", None);
    let error = save(&mut repo, &mut duplicate).unwrap_err();
    assert!(matches!(
        error,
        ValidationError::UrlTaken {
            field: UrlSource::Slug,
            ..
        }
    ));
    assert_eq!(
        error.to_string(),
        "This slug is already used by an other page at the same level."
    );

    // Nothing of the rejected page was written
    assert!(duplicate.id().is_none());
    let scope = QueryScope::new(None);
    assert_eq!(repo.published_count(&scope).unwrap(), 1);
}

#[test]
fn test_override_url_collides_with_slug_url() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let about = save(&mut repo, &mut draft("about", None)).unwrap();
    save(&mut repo, &mut draft("team", Some(about))).unwrap();

    let mut other = draft("crew", None);
    other
        .translations_mut()
        .translation_mut(&code("en"))
        .unwrap()
        .set(TranslatedField::OverrideUrl, "/about/team/");
    let error = save(&mut repo, &mut other).unwrap_err();

    assert!(matches!(
        error,
        ValidationError::UrlTaken {
            field: UrlSource::OverrideUrl,
            ..
        }
    ));
}

#[test]
fn test_same_url_on_different_sites() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();

    let mut first = draft("about", None);
    first.set_site(Some(SiteId::new(1)));
    save(&mut repo, &mut first).unwrap();

    let mut second = draft("about", None);
    second.set_site(Some(SiteId::new(2)));
    assert!(save(&mut repo, &mut second).is_ok());
}

#[test]
fn test_renaming_a_parent_moves_descendants() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let mut about = draft("about", None);
    let about_id = save(&mut repo, &mut about).unwrap();
    let team_id = save(&mut repo, &mut draft("team", Some(about_id))).unwrap();
    let lead_id = save(&mut repo, &mut draft("lead", Some(team_id))).unwrap();

    let mut pinned = draft("jobs", Some(about_id));
    pinned
        .translations_mut()
        .translation_mut(&code("en"))
        .unwrap()
        .set(TranslatedField::OverrideUrl, "/jobs/");
    let pinned_id = save(&mut repo, &mut pinned).unwrap();

    about
        .translations_mut()
        .translation_mut(&code("en"))
        .unwrap()
        .set(TranslatedField::Slug, "company");
    save(&mut repo, &mut about).unwrap();

    assert_eq!(url_of(&repo, about_id).as_deref(), Some("/company/"));
    assert_eq!(url_of(&repo, team_id).as_deref(), Some("/company/team/"));
    assert_eq!(url_of(&repo, lead_id).as_deref(), Some("/company/team/lead/"));
    assert_eq!(url_of(&repo, pinned_id).as_deref(), Some("/jobs/"));

    let scope = QueryScope::new(None);
    assert!(repo
        .get_for_path(&path("/about/team/"), &code("en"), &scope)
        .unwrap()
        .is_none());
}

#[test]
fn test_blocked_descendant_move_rejects_the_rename() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let mut about = draft("about", None);
    let about_id = save(&mut repo, &mut about).unwrap();
    let team_id = save(&mut repo, &mut draft("team", Some(about_id))).unwrap();

    let mut crew = draft("crew", None);
    crew.translations_mut()
        .translation_mut(&code("en"))
        .unwrap()
        .set(TranslatedField::OverrideUrl, "/company/team/");
    save(&mut repo, &mut crew).unwrap();

    about
        .translations_mut()
        .translation_mut(&code("en"))
        .unwrap()
        .set(TranslatedField::Slug, "company");
    let error = save(&mut repo, &mut about).unwrap_err();

    assert!(matches!(error, ValidationError::DescendantUrlTaken { node, .. } if node == team_id));
    assert_eq!(url_of(&repo, about_id).as_deref(), Some("/about/"));
    assert_eq!(url_of(&repo, team_id).as_deref(), Some("/about/team/"));
    let stored = repo.find_translation(about_id, &code("en")).unwrap().unwrap();
    assert_eq!(stored.slug(), "about");
}

#[test]
fn test_parent_cycle_is_rejected() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let mut about = draft("about", None);
    let about_id = save(&mut repo, &mut about).unwrap();
    let team_id = save(&mut repo, &mut draft("team", Some(about_id))).unwrap();

    about.set_parent(Some(team_id));
    let error = save(&mut repo, &mut about).unwrap_err();

    assert!(matches!(error, ValidationError::InvalidParent { parent } if parent == team_id));
    let stored = repo.find_by_id(about_id, &code("en")).unwrap().unwrap();
    assert_eq!(stored.parent_id(), None);
}

#[test]
fn test_deleting_a_page_removes_its_subtree() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let about = save(&mut repo, &mut draft("about", None)).unwrap();
    let team = save(&mut repo, &mut draft("team", Some(about))).unwrap();

    assert!(DeletePage::new(&mut repo).execute(about).unwrap());
    assert!(repo.find_by_id(team, &code("en")).unwrap().is_none());
    assert!(repo.find_translation(team, &code("en")).unwrap().is_none());
    assert!(!DeletePage::new(&mut repo).execute(about).unwrap());

    // The URL is free again
    assert!(save(&mut repo, &mut draft("about", None)).is_ok());
}

#[test]
fn test_publication_window_limits_visibility() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let now = Utc::now();

    let mut upcoming = draft("upcoming", None);
    upcoming
        .set_publication_window(Some(now + Duration::days(1)), None)
        .unwrap();
    save(&mut repo, &mut upcoming).unwrap();

    let mut expired = draft("expired", None);
    expired
        .set_publication_window(Some(now - Duration::days(7)), Some(now - Duration::days(1)))
        .unwrap();
    save(&mut repo, &mut expired).unwrap();

    let scope = QueryScope::at(None, now);
    assert!(repo
        .get_for_path(&path("/upcoming/"), &code("en"), &scope)
        .unwrap()
        .is_none());
    assert!(repo
        .get_for_path(&path("/expired/"), &code("en"), &scope)
        .unwrap()
        .is_none());

    let later = QueryScope::at(None, now + Duration::days(2));
    assert!(repo
        .get_for_path(&path("/upcoming/"), &code("en"), &later)
        .unwrap()
        .is_some());
    assert_eq!(repo.published_count(&scope).unwrap(), 0);
}

#[test]
fn test_non_polymorphic_lookup_ignores_publication() {
    let mut repo = SqlitePageRepository::new_in_memory().unwrap();
    let mut node = draft("hidden", None);
    node.set_status(PageStatus::Draft);
    let id = save(&mut repo, &mut node).unwrap();

    let summary = repo.non_polymorphic_lookup(id).unwrap().unwrap();
    assert_eq!(summary.type_tag.as_str(), TEXT_PAGE);
    assert_eq!(summary.status, PageStatus::Draft);
    assert!(repo.non_polymorphic_lookup(NodeId::new(999).unwrap()).unwrap().is_none());
}
