/// Database row types — these map directly to SQLite rows.
/// Ids and timestamps stay as text here; the gateway parses them.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_confirmed_at: Option<String>,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// Column set for a partial profile write; `None` keeps the stored value.
#[derive(Default)]
pub struct ProfileChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub role: Option<&'a str>,
}

pub struct ServiceRow {
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub price: f64,
    pub created_by: Option<String>,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub title: String,
    pub short_content: String,
    pub full_content: String,
    pub author_id: Option<String>,
    pub created_at: String,
}

pub struct FileRow {
    pub id: String,
    pub file_name: String,
    pub description: String,
    pub file_path: String,
    pub access: String,
    pub user_id: Option<String>,
    pub created_at: String,
}

pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

/// JSON-encoded check lists, written as produced by the health-check job.
pub struct HealthCheckRow {
    pub timestamp: String,
    pub database_connected: bool,
    pub route_checks: String,
    pub button_checks: String,
    pub errors: String,
    pub repairs: String,
}
