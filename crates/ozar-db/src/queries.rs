use crate::models::{
    ContactRow, FileRow, HealthCheckRow, PostRow, ProfileChanges, ProfileRow, ServiceRow, UserRow,
};
use crate::{Database, now};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

impl Database {
    // -- Users --

    /// Inserts the auth user and its profile row in one transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
        confirmed: bool,
        confirmation_token: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let created_at = now();
            let confirmed_at = confirmed.then(|| created_at.clone());
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users (id, email, password, first_name, last_name, email_confirmed_at, confirmation_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, email, password_hash, first_name, last_name, confirmed_at, confirmation_token, created_at],
            )?;
            tx.execute(
                "INSERT INTO profiles (id, first_name, last_name, email, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, first_name, last_name, email, role, created_at],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Marks the matching user confirmed and clears the token.
    /// Returns the user id, or `None` when no user holds the token.
    pub fn confirm_user(&self, token: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row(
                    "SELECT id FROM users WHERE confirmation_token = ?1",
                    [token],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = &id {
                conn.execute(
                    "UPDATE users SET email_confirmed_at = ?1, confirmation_token = NULL WHERE id = ?2",
                    params![now(), id],
                )?;
            }
            Ok(id)
        })
    }

    pub fn update_user_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                params![password_hash, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_user_metadata(
        &self,
        id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET first_name = COALESCE(?1, first_name), last_name = COALESCE(?2, last_name)
                 WHERE id = ?3",
                params![first_name, last_name, id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Profiles --

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, first_name, last_name, email, role, phone_number, avatar_url, created_at
                 FROM profiles WHERE id = ?1",
                [id],
                profile_from_row,
            )
            .optional()
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, email, role, phone_number, avatar_url, created_at
                 FROM profiles ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], profile_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no row matched.
    pub fn update_profile(&self, id: &str, changes: &ProfileChanges<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE profiles SET
                    first_name   = COALESCE(?1, first_name),
                    last_name    = COALESCE(?2, last_name),
                    phone_number = COALESCE(?3, phone_number),
                    avatar_url   = COALESCE(?4, avatar_url),
                    role         = COALESCE(?5, role)
                 WHERE id = ?6",
                params![
                    changes.first_name,
                    changes.last_name,
                    changes.phone_number,
                    changes.avatar_url,
                    changes.role,
                    id
                ],
            )?;
            Ok(n > 0)
        })
    }

    // -- Services --

    pub fn list_services(&self) -> Result<Vec<ServiceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, short_description, full_description, price, created_by, created_at
                 FROM services ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ServiceRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        short_description: row.get(2)?,
                        full_description: row.get(3)?,
                        price: row.get(4)?,
                        created_by: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_service(&self, row: &ServiceRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO services (id, title, short_description, full_description, price, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.title,
                    row.short_description,
                    row.full_description,
                    row.price,
                    row.created_by,
                    row.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_service(
        &self,
        id: &str,
        title: &str,
        short_description: &str,
        full_description: &str,
        price: f64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE services SET title = ?1, short_description = ?2, full_description = ?3, price = ?4
                 WHERE id = ?5",
                params![title, short_description, full_description, price, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_service(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM services WHERE id = ?1", [id])? > 0))
    }

    // -- Posts --

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, short_content, full_content, author_id, created_at
                 FROM posts ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        short_content: row.get(2)?,
                        full_content: row.get(3)?,
                        author_id: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_post(&self, row: &PostRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, title, short_content, full_content, author_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.title,
                    row.short_content,
                    row.full_content,
                    row.author_id,
                    row.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    // -- Files --

    pub fn list_files(&self) -> Result<Vec<FileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, file_name, description, file_path, access, user_id, created_at
                 FROM files ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], file_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_file(&self, id: &str) -> Result<Option<FileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, file_name, description, file_path, access, user_id, created_at
                 FROM files WHERE id = ?1",
                [id],
                file_from_row,
            )
            .optional()
        })
    }

    pub fn insert_file(&self, row: &FileRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO files (id, file_name, description, file_path, access, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.file_name,
                    row.description,
                    row.file_path,
                    row.access,
                    row.user_id,
                    row.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_file(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM files WHERE id = ?1", [id])? > 0))
    }

    // -- Contact messages --

    pub fn insert_contact_message(&self, row: &ContactRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contact_messages (id, name, email, subject, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.id, row.name, row.email, row.subject, row.message, row.created_at],
            )?;
            Ok(())
        })
    }

    pub fn list_contact_messages(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, subject, message, created_at
                 FROM contact_messages ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ContactRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        subject: row.get(3)?,
                        message: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Health checks --

    /// Lightweight read used as a connectivity probe.
    pub fn probe_health_checks(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT id FROM health_checks LIMIT 1", [], |row| row.get(0))
                .optional()
        })
    }

    pub fn insert_health_check(&self, row: &HealthCheckRow) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO health_checks (timestamp, database_connected, route_checks, button_checks, errors, repairs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.timestamp,
                    row.database_connected,
                    row.route_checks,
                    row.button_checks,
                    row.errors,
                    row.repairs
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn count_health_checks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM health_checks", [], |row| row.get(0))?)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, first_name, last_name, email_confirmed_at, created_at
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                email_confirmed_at: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        phone_number: row.get(5)?,
        avatar_url: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRow> {
    Ok(FileRow {
        id: row.get(0)?,
        file_name: row.get(1)?,
        description: row.get(2)?,
        file_path: row.get(3)?,
        access: row.get(4)?,
        user_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
