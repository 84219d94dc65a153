// Path: crates/oio-meta2/src/schema.rs
//! The per-container SQLite schema.
//! DDL is embedded as inline `sqlx::query` statements run once per container
//! database, rather than kept as migration files, matching the corpus'
//! preference (`harborgrid-justin-caddy`'s `database::migrations` module
//! still embeds its DDL as Rust string constants run through `sqlx`).

use sqlx::SqlitePool;

const CREATE_ALIAS: &str = r#"
CREATE TABLE IF NOT EXISTS alias (
    alias TEXT NOT NULL,
    version INTEGER NOT NULL,
    deleted INTEGER NOT NULL,
    ctime INTEGER NOT NULL,
    mdsys TEXT NOT NULL,
    content_id BLOB NOT NULL,
    PRIMARY KEY (alias, version)
)
"#;

const CREATE_CONTENT: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    id BLOB PRIMARY KEY,
    size INTEGER NOT NULL,
    policy TEXT NOT NULL,
    chunk_method TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    hash BLOB,
    ctime INTEGER NOT NULL
)
"#;

const CREATE_CHUNK: &str = r#"
CREATE TABLE IF NOT EXISTS chunk (
    id TEXT PRIMARY KEY,
    position TEXT NOT NULL,
    hash BLOB,
    size INTEGER NOT NULL,
    ctime INTEGER NOT NULL,
    content_id BLOB NOT NULL REFERENCES content(id)
)
"#;

const CREATE_PROPERTY: &str = r#"
CREATE TABLE IF NOT EXISTS property (
    alias TEXT NOT NULL,
    version INTEGER NOT NULL,
    key TEXT NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (alias, version, key)
)
"#;

const CREATE_ADMIN: &str = r#"
CREATE TABLE IF NOT EXISTS admin (
    k TEXT PRIMARY KEY,
    v TEXT NOT NULL
)
"#;

const CREATE_CHUNK_CONTENT_IDX: &str =
    "CREATE INDEX IF NOT EXISTS idx_chunk_content_id ON chunk(content_id)";
const CREATE_ALIAS_NAME_IDX: &str = "CREATE INDEX IF NOT EXISTS idx_alias_name ON alias(alias)";

/// Creates every table (idempotent) for a freshly opened container database.
pub async fn create_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in [
        CREATE_ALIAS,
        CREATE_CONTENT,
        CREATE_CHUNK,
        CREATE_PROPERTY,
        CREATE_ADMIN,
        CREATE_CHUNK_CONTENT_IDX,
        CREATE_ALIAS_NAME_IDX,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
