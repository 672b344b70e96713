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
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                first_name          TEXT,
                last_name           TEXT,
                email_confirmed_at  TEXT,
                confirmation_token  TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE profiles (
                id              TEXT PRIMARY KEY REFERENCES users(id),
                first_name      TEXT,
                last_name       TEXT,
                email           TEXT,
                role            TEXT NOT NULL DEFAULT 'user',
                phone_number    TEXT,
                avatar_url      TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE services (
                id                  TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                short_description   TEXT NOT NULL,
                full_description    TEXT NOT NULL,
                price               REAL NOT NULL DEFAULT 0,
                created_by          TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE posts (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                short_content   TEXT NOT NULL,
                full_content    TEXT NOT NULL,
                author_id       TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE files (
                id              TEXT PRIMARY KEY,
                file_name       TEXT NOT NULL,
                description     TEXT NOT NULL,
                file_path       TEXT NOT NULL,
                access          TEXT NOT NULL DEFAULT 'free',
                user_id         TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE contact_messages (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL,
                subject     TEXT NOT NULL,
                message     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE health_checks (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp           TEXT NOT NULL,
                database_connected  INTEGER NOT NULL,
                route_checks        TEXT NOT NULL,
                button_checks       TEXT NOT NULL,
                errors              TEXT NOT NULL,
                repairs             TEXT NOT NULL
            );

            CREATE INDEX idx_services_created ON services(created_at);
            CREATE INDEX idx_posts_created ON posts(created_at);
            CREATE INDEX idx_files_created ON files(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
