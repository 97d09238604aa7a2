use rusqlite::{Connection, Result};
use tracing::debug;

/// Initialize the SQLite database with the required schema.
/// This function is idempotent and can be safely called multiple times.
pub fn initialize_database(conn: &Connection) -> Result<()> {
    // Enable foreign key constraints
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Create url_nodes table; publication dates are unix seconds
    conn.execute(
        "CREATE TABLE IF NOT EXISTS url_nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER,
            site_id INTEGER,
            status TEXT NOT NULL,
            type_tag TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            in_navigation INTEGER NOT NULL DEFAULT 1,
            publication_date INTEGER,
            publication_end_date INTEGER,
            payload TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (parent_id) REFERENCES url_nodes(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_url_nodes_parent ON url_nodes(parent_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_url_nodes_type ON url_nodes(type_tag)",
        [],
    )?;

    // Create url_node_translations table; site_key is '' when no site is set
    conn.execute(
        "CREATE TABLE IF NOT EXISTS url_node_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            master_id INTEGER NOT NULL,
            language_code TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL DEFAULT '',
            override_url TEXT NOT NULL DEFAULT '',
            cached_url TEXT NOT NULL DEFAULT '',
            site_key TEXT NOT NULL DEFAULT '',
            UNIQUE (master_id, language_code),
            FOREIGN KEY (master_id) REFERENCES url_nodes(id) ON DELETE CASCADE
        )",
        [],
    )?;

    // One node per resolved path and language within a site
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_path
         ON url_node_translations(site_key, language_code, cached_url)
         WHERE cached_url <> ''",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_translations_url ON url_node_translations(cached_url)",
        [],
    )?;

    debug!("Database schema initialized");
    Ok(())
}
