use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::Serialize;
use uuid::Uuid;

use ozar_app::chat::ChatSession;
use ozar_app::forms::ContactForm;
use ozar_app::pages::pricing::TIERS;
use ozar_app::pages::{BlogPage, ContactPage, DownloadsPage, ServicesPage, Source};
use ozar_app::{Notifications, respond};
use ozar_gateway::GatewayError;
use ozar_types::api::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub source: Source,
    pub items: Vec<T>,
}

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    let mut page = ServicesPage::new(state.anonymous(), Notifications::new());
    page.load().await;
    Json(Listing {
        source: page.source,
        items: page.services,
    })
}

pub async fn list_posts(State(state): State<AppState>) -> impl IntoResponse {
    let mut page = BlogPage::new(state.anonymous(), Notifications::new());
    page.load().await;
    Json(Listing {
        source: page.source,
        items: page.posts,
    })
}

pub async fn list_files(State(state): State<AppState>) -> impl IntoResponse {
    let mut page = DownloadsPage::new(state.anonymous(), Notifications::new());
    page.load().await;
    Json(page.files)
}

/// Redirects to the object's public URL. Premium items need a signed-in
/// visitor.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, ApiError> {
    let signed_in = state.optional_session(bearer).await.is_some();
    let file = state.backend.get_file(id).await?;
    let page = DownloadsPage::new(state.anonymous(), Notifications::new());
    let url = page.download(&file, signed_in)?;
    Ok(Redirect::to(&url))
}

pub async fn pricing() -> impl IntoResponse {
    Json(TIERS)
}

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<impl IntoResponse, ApiError> {
    let mut page = ContactPage::new(state.anonymous(), Notifications::new());
    page.form = form;
    page.submit().await?;
    Ok(StatusCode::CREATED)
}

/// Replies after the typing delay, like the chat widget.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = ChatSession::new(state.chat_delay);
    let pending = session
        .send(&req.text)
        .ok_or_else(|| ApiError::BadRequest("Message must not be empty".into()))?;
    pending.await.map_err(GatewayError::from)?;

    let message = session
        .messages()
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No reply".into()))?;
    Ok(Json(ChatResponse {
        rule: respond(&req.text).rule,
        message,
    }))
}
