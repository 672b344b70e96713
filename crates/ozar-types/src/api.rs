use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Access, AuthUser, ChatMessage, Session};

// -- JWT Claims --

/// Access-token claims shared by the gateway (issuer) and the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// `session` is `None` while the address awaits confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user: AuthUser,
    pub session: Option<Session>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Update of the auth identity itself (not the profile row).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

// -- Content writes (already validated) --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub short_content: String,
    pub full_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFile {
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub rule: Option<usize>,
    pub message: ChatMessage,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
