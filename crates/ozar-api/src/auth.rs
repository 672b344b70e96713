use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::info;

use ozar_app::AppError;
use ozar_app::forms::{PasswordForm, ProfileForm};
use ozar_gateway::{Gateway, LocalGateway};
use ozar_types::api::{SignInRequest, SignUpRequest, UpdateUserRequest};
use ozar_types::models::Session;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.anonymous().sign_up(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.anonymous().sign_in(&req.email, &req.password).await?;
    info!("User {} signed in", session.user.id);
    Ok(Json(session))
}

/// Tokens are stateless; this only ends the request's client session.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user.id;
    state.client(session).sign_out().await?;
    info!("User {} signed out", user_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(session)
}

/// Password changes arrive as a form with confirmation; names as-is.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserBody {
    #[serde(default)]
    pub password: Option<PasswordForm>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<UpdateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
    let password = match body.password {
        Some(form) => Some(form.validate().map_err(AppError::from)?),
        None => None,
    };
    let req = UpdateUserRequest {
        password,
        first_name: body.first_name,
        last_name: body.last_name,
    };
    let user = state.client(session).update_user(req).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.backend.confirm_email(&query.token).await?;
    info!("Email confirmed for {}", user.email);
    Ok(Redirect::to("/login"))
}

// -- Own profile --

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session.user.id;
    let profile = state.client(session).fetch_profile(id).await?;
    Ok(Json(profile))
}

/// Profile row first, then the identity's name metadata.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(form): Json<ProfileForm>,
) -> Result<impl IntoResponse, ApiError> {
    let update = form.validate().map_err(AppError::from)?;
    let id = session.user.id;
    let client = LocalGateway::with_session(state.backend.clone(), session);
    client.update_profile(id, update).await?;
    client
        .update_user(UpdateUserRequest {
            first_name: Some(form.first_name.trim().to_string()),
            last_name: Some(form.last_name.trim().to_string()),
            ..Default::default()
        })
        .await?;
    Ok(Json(client.fetch_profile(id).await?))
}
