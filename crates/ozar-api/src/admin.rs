use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use ozar_app::forms::{BlogForm, FileForm, FileUpload, ServiceForm};
use ozar_app::pages::{AdminConsole, RoleFilter};
use ozar_app::Notifications;
use ozar_types::models::{ProfileUpdate, Session};

use crate::error::ApiError;
use crate::state::AppState;

fn console(state: &AppState, session: Session) -> AdminConsole {
    AdminConsole::new(state.client(session), Notifications::new(), state.orphan_policy)
}

/// A DELETE without `?confirm=true` is refused.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

// -- Services --

pub async fn create_service(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(form): Json<ServiceForm>,
) -> Result<impl IntoResponse, ApiError> {
    let mut console = console(&state, session);
    console.save_service(&form, None).await?;
    Ok((StatusCode::CREATED, Json(console.services)))
}

pub async fn update_service(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(form): Json<ServiceForm>,
) -> Result<impl IntoResponse, ApiError> {
    let mut console = console(&state, session);
    console.save_service(&form, Some(id)).await?;
    Ok(Json(console.services))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    console(&state, session).delete_service(id, &query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Posts --

pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(form): Json<BlogForm>,
) -> Result<impl IntoResponse, ApiError> {
    let post = console(&state, session).publish_post(&form).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    console(&state, session).delete_post(id, &query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Files --

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Original file name; its extension names the stored object.
    pub name: String,
    pub access: Option<String>,
}

/// Raw body upload. Metadata travels in the query string, the MIME type in
/// `Content-Type`.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let file = (!body.is_empty()).then(|| FileUpload {
        name: query.name,
        content_type,
        data: body.to_vec(),
    });
    let form = FileForm {
        title: query.title,
        description: query.description,
        file,
        access: query.access,
    };

    let record = console(&state, session).upload_file(form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state.backend.get_file(id).await?;
    console(&state, session).delete_file(&file, &query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub role: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<UsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter: RoleFilter = query
        .role
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let gateway = state.client(session);
    // Surface the failure instead of the console's empty list
    let users = gateway.list_profiles().await?;
    Ok(Json(users.into_iter().filter(|u| filter.matches(u)).collect::<Vec<_>>()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }
    let gateway = state.client(session);
    gateway.update_profile(id, update).await?;
    Ok(Json(gateway.fetch_profile(id).await?))
}

pub async fn list_contact_messages(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = state.backend.resolve_caller(Some(&session.access_token)).await?;
    Ok(Json(state.backend.list_contact_messages(&caller).await?))
}
