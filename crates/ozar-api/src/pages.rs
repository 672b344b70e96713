use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::Serialize;
use serde_json::json;

use ozar_app::guard::{GuardDecision, Route, guard};
use ozar_app::pages::LabsPage;
use ozar_app::pages::dashboard::{DOWNLOADS, DashboardDownload, DashboardLab, LABS, LaunchOutcome, has_premium, launch_lab};
use ozar_app::{Notifications, SessionState};
use ozar_gateway::GatewayError;
use ozar_types::models::{Lab, LabSession, Session};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn resolve_root(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Response {
    resolve(&state, "/", bearer).await
}

pub async fn resolve_route(
    State(state): State<AppState>,
    Path(route): Path<String>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Response {
    resolve(&state, &format!("/{route}"), bearer).await
}

/// Guard a client route for the request's identity: render it or redirect.
async fn resolve(state: &AppState, path: &str, bearer: Option<TypedHeader<Authorization<Bearer>>>) -> Response {
    let route = Route::parse(path);

    let session = state.optional_session(bearer).await;
    let profile = match &session {
        Some(s) => state.client(s.clone()).fetch_profile(s.user.id).await.ok(),
        None => None,
    };

    match guard(route, &SessionState::resolved(session, profile)) {
        GuardDecision::Redirect(to) => Redirect::to(to).into_response(),
        decision @ (GuardDecision::Render | GuardDecision::Placeholder) => {
            let status = if route == Route::NotFound { StatusCode::NOT_FOUND } else { StatusCode::OK };
            (status, Json(json!({ "route": route, "decision": decision }))).into_response()
        }
    }
}

// -- Premium labs --

#[derive(Debug, Serialize)]
pub struct LabsView {
    pub labs: Vec<Lab>,
    pub sessions: Vec<LabSession>,
}

pub async fn list_labs(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> impl IntoResponse {
    let session = state.optional_session(bearer).await;
    let mut page = LabsPage::new(Notifications::new(), state.lab_start_delay);
    page.load(session.as_ref().map(|s| &s.user));
    Json(LabsView {
        labs: page.labs,
        sessions: page.sessions,
    })
}

pub async fn start_lab(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.optional_session(bearer).await;
    let user = session.as_ref().map(|s| &s.user);
    let mut page = LabsPage::new(Notifications::new(), state.lab_start_delay);
    page.load(user);
    let lab_session = page.start_lab(user, &lab_id).await?;
    Ok((StatusCode::CREATED, Json(lab_session)))
}

// -- Dashboard --

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub labs: &'static [DashboardLab],
    pub downloads: &'static [DashboardDownload],
    pub premium: bool,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session.user.id;
    let profile = state.client(session).fetch_profile(id).await?;
    Ok(Json(DashboardView {
        labs: &LABS,
        downloads: &DOWNLOADS,
        premium: has_premium(profile.role),
    }))
}

pub async fn launch_dashboard_lab(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(lab_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lab = LABS
        .iter()
        .find(|l| l.id == lab_id)
        .ok_or(GatewayError::NotFound("Lab"))?;
    let id = session.user.id;
    let profile = state.client(session).fetch_profile(id).await?;
    let outcome: LaunchOutcome = launch_lab(lab, Some(&profile), &Notifications::new());
    Ok(Json(json!({ "lab": lab.id, "outcome": outcome })))
}
