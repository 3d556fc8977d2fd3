use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE configs (
                name    TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            );

            -- nick and email uniqueness is checked by the application before insert
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                nick        TEXT NOT NULL,
                email       TEXT NOT NULL,
                password    TEXT NOT NULL,
                inactive    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_users_nick ON users(nick);
            CREATE INDEX idx_users_email ON users(email);

            -- One record per followed identity; follower_ids is a JSON array.
            CREATE TABLE followers (
                user_id       INTEGER PRIMARY KEY,
                follower_ids  TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE posts (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                title        TEXT NOT NULL,
                content      TEXT NOT NULL,
                author_id    INTEGER NOT NULL,
                author_nick  TEXT NOT NULL,
                likes        INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_posts_author ON posts(author_id);

            CREATE TABLE establishments (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                cnpj           TEXT NOT NULL,
                ie             TEXT NOT NULL,
                name           TEXT NOT NULL,
                email          TEXT NOT NULL,
                phone          TEXT NOT NULL,
                sector         INTEGER NOT NULL DEFAULT 0,
                opening_hours  TEXT NOT NULL DEFAULT '',
                opening_days   INTEGER NOT NULL DEFAULT 0,
                cep            TEXT NOT NULL,
                number         TEXT NOT NULL,
                street         TEXT NOT NULL,
                district       TEXT NOT NULL,
                city           TEXT NOT NULL,
                uf             TEXT NOT NULL,
                country        TEXT NOT NULL,
                complement     TEXT NOT NULL DEFAULT '',
                created_at     TEXT NOT NULL
            );

            CREATE INDEX idx_establishments_cnpj ON establishments(cnpj);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
