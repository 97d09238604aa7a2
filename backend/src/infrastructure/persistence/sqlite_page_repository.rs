use crate::application::repositories::{
    NodeRepository, NodeSummary, PageTreeQuery, QueryScope, TranslationRepository,
};
use crate::domain::aggregates::UrlNode;
use crate::domain::base::{DomainError, Entity};
use crate::domain::entities::{TranslatedFields, Translation};
use crate::domain::value_objects::{
    LanguageCode, NodeId, PageStatus, SiteId, TranslationId, TypeTag, UrlPath,
};
use crate::domain::DomainResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use tracing::debug;

/// Restricts a query on `url_nodes n` to published nodes. `:now` is the
/// current unix time and `:site` the optional site id.
const PUBLISHED_FILTER: &str = "n.status = 'published'
     AND (n.publication_date IS NULL OR n.publication_date <= :now)
     AND (n.publication_end_date IS NULL OR n.publication_end_date > :now)
     AND (:site IS NULL OR n.site_id = :site)";

const NODE_COLUMNS: &str = "n.id, n.parent_id, n.site_id, n.status, n.type_tag, n.sort_order,
     n.in_navigation, n.publication_date, n.publication_end_date, n.payload";

/// A url_nodes row before it is turned into a node
struct NodeRow {
    id: i64,
    parent_id: Option<i64>,
    site_id: Option<i64>,
    status: String,
    type_tag: String,
    sort_order: i32,
    in_navigation: bool,
    publication_date: Option<i64>,
    publication_end_date: Option<i64>,
    payload: String,
}

impl NodeRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(NodeRow {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            site_id: row.get(2)?,
            status: row.get(3)?,
            type_tag: row.get(4)?,
            sort_order: row.get(5)?,
            in_navigation: row.get(6)?,
            publication_date: row.get(7)?,
            publication_end_date: row.get(8)?,
            payload: row.get(9)?,
        })
    }

    fn into_node(self, language: &LanguageCode) -> DomainResult<UrlNode> {
        let mut node = UrlNode::new(TypeTag::new(self.type_tag)?, language.clone());
        node.assign_id(NodeId::new(self.id)?)?;
        node.set_parent(self.parent_id.map(NodeId::new).transpose()?);
        node.set_site(self.site_id.map(SiteId::new));
        node.set_status(self.status.parse::<PageStatus>()?);
        node.set_sort_order(self.sort_order);
        node.set_in_navigation(self.in_navigation);
        node.set_publication_window(
            self.publication_date.map(from_timestamp).transpose()?,
            self.publication_end_date.map(from_timestamp).transpose()?,
        )?;
        node.set_payload(decode_payload(&self.payload)?);
        Ok(node)
    }
}

fn from_timestamp(seconds: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| DomainError::InvalidValue(format!("Invalid timestamp: {}", seconds)))
}

/// Payloads are stored as JSON text; `null` included, so the column is never SQL NULL
fn encode_payload(payload: &serde_json::Value) -> SqliteResult<String> {
    serde_json::to_string(payload).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn decode_payload(text: &str) -> DomainResult<serde_json::Value> {
    serde_json::from_str(text)
        .map_err(|e| DomainError::InvalidValue(format!("Invalid node payload: {}", e)))
}

fn db_error(e: rusqlite::Error) -> DomainError {
    DomainError::InvalidOperation(format!("Database error: {}", e))
}

fn site_key(site_id: Option<SiteId>) -> String {
    site_id.map(|site| site.value().to_string()).unwrap_or_default()
}

/// Every path that could be a segment-wise prefix of `path`, the path itself included
fn prefix_candidates(path: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    for (index, _) in path.match_indices('/') {
        if index > 0 {
            candidates.push(&path[..index]);
        }
        candidates.push(&path[..=index]);
    }
    candidates.push(path);
    candidates.dedup();
    candidates
}

/// SQLite-based implementation of the node, translation and tree query repositories
pub struct SqlitePageRepository {
    conn: Connection,
}

impl SqlitePageRepository {
    /// Create a new SQLite repository with the given connection
    pub fn new(conn: Connection) -> SqliteResult<Self> {
        super::schema::initialize_database(&conn)?;
        Ok(SqlitePageRepository { conn })
    }

    /// Create a new in-memory SQLite repository (useful for testing)
    pub fn new_in_memory() -> SqliteResult<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Create a new file-based SQLite repository
    pub fn new_with_path(path: impl AsRef<std::path::Path>) -> SqliteResult<Self> {
        Self::new(Connection::open(path)?)
    }

    /// Load a node without any publication filter, priming `language` in its cache
    fn load_node(&self, id: i64, language: &LanguageCode) -> DomainResult<Option<UrlNode>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM url_nodes n WHERE n.id = ?1", NODE_COLUMNS),
                params![id],
                NodeRow::from_row,
            )
            .optional()
            .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut node = row.into_node(language)?;
        if let Some(translation) = self.load_translation(id, language)? {
            node.translations_mut().insert(translation);
        }
        Ok(Some(node))
    }

    fn load_translation(&self, master_id: i64, language: &LanguageCode) -> DomainResult<Option<Translation>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, slug, override_url, cached_url
                 FROM url_node_translations
                 WHERE master_id = ?1 AND language_code = ?2",
                params![master_id, language.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        TranslatedFields {
                            title: row.get(1)?,
                            slug: row.get(2)?,
                            override_url: row.get(3)?,
                            cached_url: row.get(4)?,
                        },
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;

        match row {
            Some((id, fields)) => Ok(Some(Translation::from_storage(
                TranslationId::new(id),
                NodeId::new(master_id)?,
                language.clone(),
                fields,
            ))),
            None => Ok(None),
        }
    }

    fn insert_node(&self, node: &UrlNode, id: Option<i64>) -> SqliteResult<i64> {
        self.conn.execute(
            "INSERT INTO url_nodes (id, parent_id, site_id, status, type_tag, sort_order,
                 in_navigation, publication_date, publication_end_date, payload, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'), datetime('now'))",
            params![
                id,
                node.parent_id().map(|p| p.value()),
                node.site_id().map(|s| s.value()),
                node.status().as_str(),
                node.type_tag().as_str(),
                node.sort_order(),
                node.in_navigation(),
                node.publication_date().map(|d| d.timestamp()),
                node.publication_end_date().map(|d| d.timestamp()),
                encode_payload(node.payload())?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_node(&self, node: &UrlNode, id: i64) -> SqliteResult<usize> {
        self.conn.execute(
            "UPDATE url_nodes SET parent_id = ?2, site_id = ?3, status = ?4, type_tag = ?5,
                 sort_order = ?6, in_navigation = ?7, publication_date = ?8,
                 publication_end_date = ?9, payload = ?10, updated_at = datetime('now')
             WHERE id = ?1",
            params![
                id,
                node.parent_id().map(|p| p.value()),
                node.site_id().map(|s| s.value()),
                node.status().as_str(),
                node.type_tag().as_str(),
                node.sort_order(),
                node.in_navigation(),
                node.publication_date().map(|d| d.timestamp()),
                node.publication_end_date().map(|d| d.timestamp()),
                encode_payload(node.payload())?,
            ],
        )
    }

    fn upsert_translation(
        &self,
        master_id: i64,
        translation: &Translation,
        site_id: Option<SiteId>,
    ) -> SqliteResult<i64> {
        let fields = translation.fields();
        self.conn.execute(
            "INSERT INTO url_node_translations
                 (master_id, language_code, title, slug, override_url, cached_url, site_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (master_id, language_code) DO UPDATE SET
                 title = excluded.title,
                 slug = excluded.slug,
                 override_url = excluded.override_url,
                 cached_url = excluded.cached_url,
                 site_key = excluded.site_key",
            params![
                master_id,
                translation.language_code().as_str(),
                fields.title,
                fields.slug,
                fields.override_url,
                fields.cached_url,
                site_key(site_id),
            ],
        )?;

        self.conn.query_row(
            "SELECT id FROM url_node_translations WHERE master_id = ?1 AND language_code = ?2",
            params![master_id, translation.language_code().as_str()],
            |row| row.get(0),
        )
    }
}

impl NodeRepository for SqlitePageRepository {
    fn save_node(&mut self, node: &mut UrlNode) -> DomainResult<NodeId> {
        let id = match node.id() {
            Some(id) => {
                let updated = self.update_node(node, id.value()).map_err(db_error)?;
                if updated == 0 {
                    self.insert_node(node, Some(id.value())).map_err(db_error)?;
                }
                *id
            }
            None => {
                let rowid = self.insert_node(node, None).map_err(db_error)?;
                let id = NodeId::new(rowid)?;
                node.assign_id(id)?;
                id
            }
        };
        debug!("Stored node #{}", id);
        Ok(id)
    }

    fn find_by_id(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Option<UrlNode>> {
        self.load_node(id.value(), language)
    }

    fn find_children(&self, id: NodeId, language: &LanguageCode) -> DomainResult<Vec<UrlNode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM url_nodes WHERE parent_id = ?1 ORDER BY sort_order, id")
            .map_err(db_error)?;

        let child_ids: Vec<i64> = stmt
            .query_map(params![id.value()], |row| row.get(0))
            .map_err(db_error)?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(db_error)?;

        let mut children = Vec::new();
        for child_id in child_ids {
            if let Some(child) = self.load_node(child_id, language)? {
                children.push(child);
            }
        }
        Ok(children)
    }

    fn delete_node(&mut self, id: NodeId) -> DomainResult<bool> {
        // Translations and descendants go through ON DELETE CASCADE
        let rows_affected = self
            .conn
            .execute("DELETE FROM url_nodes WHERE id = ?1", params![id.value()])
            .map_err(db_error)?;

        Ok(rows_affected > 0)
    }
}

impl TranslationRepository for SqlitePageRepository {
    fn find_translation(
        &self,
        node: NodeId,
        language: &LanguageCode,
    ) -> DomainResult<Option<Translation>> {
        self.load_translation(node.value(), language)
    }

    fn save_translation(
        &mut self,
        translation: &Translation,
        site_id: Option<SiteId>,
    ) -> DomainResult<TranslationId> {
        let master_id = translation.master_id().ok_or_else(|| {
            DomainError::InvalidOperation("Translation has no owning node".to_string())
        })?;

        if let Some(url) = translation.cached_url() {
            let url = UrlPath::new(url)?;
            if self.is_url_taken(&url, site_id, Some(master_id))? {
                return Err(DomainError::BusinessRuleViolation(format!(
                    "URL already in use: {}",
                    url
                )));
            }
        }

        let id = self
            .upsert_translation(master_id.value(), translation, site_id)
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    DomainError::BusinessRuleViolation(format!("URL already in use: {}", e))
                }
                other => db_error(other),
            })?;
        Ok(TranslationId::new(id))
    }

    fn available_languages(&self, node: NodeId) -> DomainResult<Vec<LanguageCode>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT language_code FROM url_node_translations
                 WHERE master_id = ?1 ORDER BY language_code",
            )
            .map_err(db_error)?;

        let codes: Vec<String> = stmt
            .query_map(params![node.value()], |row| row.get(0))
            .map_err(db_error)?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(db_error)?;

        codes.into_iter().map(LanguageCode::new).collect()
    }

    fn delete_translation(&mut self, node: NodeId, language: &LanguageCode) -> DomainResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM url_node_translations WHERE master_id = ?1 AND language_code = ?2",
                params![node.value(), language.as_str()],
            )
            .map_err(db_error)?;

        Ok(rows_affected > 0)
    }

    fn is_url_taken(
        &self,
        url: &UrlPath,
        site_id: Option<SiteId>,
        exclude: Option<NodeId>,
    ) -> DomainResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM url_node_translations
                 WHERE cached_url = ?1 AND site_key = ?2 AND (?3 IS NULL OR master_id <> ?3)",
                params![url.as_str(), site_key(site_id), exclude.map(|id| id.value())],
                |row| row.get(0),
            )
            .map_err(db_error)?;

        Ok(count > 0)
    }
}

impl PageTreeQuery for SqlitePageRepository {
    fn get_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "SELECT n.id FROM url_nodes n
                     JOIN url_node_translations t ON t.master_id = n.id
                     WHERE t.language_code = :language AND t.cached_url = :path AND {}
                     LIMIT 1",
                    PUBLISHED_FILTER
                ),
                rusqlite::named_params! {
                    ":language": language.as_str(),
                    ":path": path.as_str(),
                    ":now": scope.now.timestamp(),
                    ":site": scope.site_id.map(|s| s.value()),
                },
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;

        match id {
            Some(id) => self.load_node(id, language),
            None => Ok(None),
        }
    }

    fn best_match_for_path(
        &self,
        path: &UrlPath,
        language: &LanguageCode,
        types: &[TypeTag],
        scope: &QueryScope,
    ) -> DomainResult<Option<UrlNode>> {
        if types.is_empty() {
            return Ok(None);
        }

        let candidates = prefix_candidates(path.as_str());
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT n.id, n.type_tag, t.cached_url FROM url_nodes n
                 JOIN url_node_translations t ON t.master_id = n.id
                 WHERE t.language_code = :language AND t.cached_url <> ''
                   AND substr(:path, 1, length(t.cached_url)) = t.cached_url AND {}
                 ORDER BY length(t.cached_url) DESC",
                PUBLISHED_FILTER
            ))
            .map_err(db_error)?;

        let rows: Vec<(i64, String, String)> = stmt
            .query_map(
                rusqlite::named_params! {
                    ":language": language.as_str(),
                    ":path": path.as_str(),
                    ":now": scope.now.timestamp(),
                    ":site": scope.site_id.map(|s| s.value()),
                },
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(db_error)?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(db_error)?;

        // The query matches character prefixes; keep segment boundaries only.
        let best = rows.into_iter().find(|(_, type_tag, cached_url)| {
            candidates.contains(&cached_url.as_str())
                && types.iter().any(|tag| tag.as_str() == type_tag.as_str())
        });

        match best {
            Some((id, _, _)) => self.load_node(id, language),
            None => Ok(None),
        }
    }

    fn published_count(&self, scope: &QueryScope) -> DomainResult<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM url_nodes n WHERE {}", PUBLISHED_FILTER),
                rusqlite::named_params! {
                    ":now": scope.now.timestamp(),
                    ":site": scope.site_id.map(|s| s.value()),
                },
                |row| row.get(0),
            )
            .map_err(db_error)?;

        Ok(count as usize)
    }

    fn non_polymorphic_lookup(&self, id: NodeId) -> DomainResult<Option<NodeSummary>> {
        let row: Option<(Option<i64>, String, String)> = self
            .conn
            .query_row(
                "SELECT parent_id, type_tag, status FROM url_nodes WHERE id = ?1",
                params![id.value()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(db_error)?;

        match row {
            Some((parent_id, type_tag, status)) => Ok(Some(NodeSummary {
                id,
                parent_id: parent_id.map(NodeId::new).transpose()?,
                type_tag: TypeTag::new(type_tag)?,
                status: status.parse()?,
            })),
            None => Ok(None),
        }
    }
}
