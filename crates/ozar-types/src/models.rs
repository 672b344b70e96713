use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Roles --

/// Classification stored on a profile row. Used for route gating only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Student,
    Premium,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::User, Role::Student, Role::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Student => "student",
            Role::Premium => "premium",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "student" => Ok(Role::Student),
            "premium" => Ok(Role::Premium),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// -- Identity --

/// Identity issued by the gateway's auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Proof of an authenticated identity, held in memory by a gateway client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

// -- Profiles --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone().unwrap_or_default(),
        }
    }

    /// Merge the fields present in `update`; absent fields are left alone.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(v) = &update.first_name {
            self.first_name = Some(v.clone());
        }
        if let Some(v) = &update.last_name {
            self.last_name = Some(v.clone());
        }
        if let Some(v) = &update.phone_number {
            self.phone_number = Some(v.clone());
        }
        if let Some(v) = &update.avatar_url {
            self.avatar_url = Some(v.clone());
        }
        if let Some(role) = update.role {
            self.role = role;
        }
    }
}

/// Partial profile write. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.avatar_url.is_none()
            && self.role.is_none()
    }
}

// -- Content --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub price: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub short_content: String,
    pub full_content: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Free,
    Premium,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Free => "free",
            Access::Premium => "premium",
        }
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Access::Free),
            "premium" => Ok(Access::Premium),
            other => Err(format!("unknown access level: {other}")),
        }
    }
}

/// Download metadata. `file_path` holds the public URL of the stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub access: Access,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// -- Chat --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Chat transcript entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

// -- Labs --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabStatus {
    Available,
    ComingSoon,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub status: LabStatus,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSession {
    pub id: String,
    pub user_id: Uuid,
    pub lab_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// -- Health checks --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheck {
    pub url: String,
    pub status_code: u16,
    pub response_time: u64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonCheck {
    pub button_id: String,
    pub exists: bool,
    pub has_click_handler: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaired: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub timestamp: DateTime<Utc>,
    pub database_connected: bool,
    pub route_checks: Vec<RouteCheck>,
    pub button_checks: Vec<ButtonCheck>,
    pub errors: Vec<String>,
    pub repairs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn profile_apply_only_touches_present_fields() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            role: Role::User,
            phone_number: None,
            avatar_url: None,
            created_at: Utc::now(),
        };

        profile.apply(&ProfileUpdate {
            phone_number: Some("555-0100".into()),
            ..Default::default()
        });

        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn health_result_uses_camel_case_keys() {
        let check = ButtonCheck {
            button_id: "start-lab".into(),
            exists: true,
            has_click_handler: false,
            repaired: Some(true),
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["buttonId"], "start-lab");
        assert_eq!(json["hasClickHandler"], false);
    }
}
