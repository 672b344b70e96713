//! Row → model conversions. Corrupt columns are logged and replaced with
//! defaults rather than failing a whole listing.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use ozar_db::models::{ContactRow, FileRow, PostRow, ProfileRow, ServiceRow, UserRow};
use ozar_types::models::{Access, AuthUser, ContactMessage, FileRecord, Post, Profile, Role, Service};

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_opt_id(raw: Option<&str>, what: &str) -> Option<Uuid> {
    raw.map(|r| parse_id(r, what))
}

pub(crate) fn parse_time(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format, no timezone
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn user(row: UserRow) -> AuthUser {
    AuthUser {
        id: parse_id(&row.id, "user"),
        email: row.email,
        email_confirmed_at: row.email_confirmed_at.as_deref().map(parse_time),
        first_name: row.first_name,
        last_name: row.last_name,
        created_at: parse_time(&row.created_at),
    }
}

pub(crate) fn profile(row: ProfileRow) -> Profile {
    let role = row.role.parse::<Role>().unwrap_or_else(|e| {
        warn!("Profile {} has {}; treating as user", row.id, e);
        Role::User
    });
    Profile {
        id: parse_id(&row.id, "profile"),
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        role,
        phone_number: row.phone_number,
        avatar_url: row.avatar_url,
        created_at: parse_time(&row.created_at),
    }
}

pub(crate) fn service(row: ServiceRow) -> Service {
    Service {
        id: parse_id(&row.id, "service"),
        title: row.title,
        short_description: row.short_description,
        full_description: row.full_description,
        price: row.price,
        created_by: parse_opt_id(row.created_by.as_deref(), "creator"),
        created_at: parse_time(&row.created_at),
    }
}

pub(crate) fn post(row: PostRow) -> Post {
    Post {
        id: parse_id(&row.id, "post"),
        title: row.title,
        short_content: row.short_content,
        full_content: row.full_content,
        author_id: parse_opt_id(row.author_id.as_deref(), "author"),
        created_at: parse_time(&row.created_at),
    }
}

pub(crate) fn file(row: FileRow) -> FileRecord {
    let access = row.access.parse::<Access>().unwrap_or_else(|e| {
        warn!("File {}: {}; treating as free", row.id, e);
        Access::Free
    });
    FileRecord {
        id: parse_id(&row.id, "file"),
        title: row.file_name,
        description: row.description,
        file_path: row.file_path,
        access,
        user_id: parse_opt_id(row.user_id.as_deref(), "owner"),
        created_at: parse_time(&row.created_at),
    }
}

pub(crate) fn contact(row: ContactRow) -> ContactMessage {
    ContactMessage {
        id: parse_id(&row.id, "contact message"),
        name: row.name,
        email: row.email,
        subject: row.subject,
        message: row.message,
        created_at: parse_time(&row.created_at),
    }
}
