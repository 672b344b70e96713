//! HTTP surface for Ozar Network Labs.

pub mod admin;
pub mod auth;
pub mod content;
pub mod error;
pub mod functions;
pub mod middleware;
pub mod pages;
pub mod state;
pub mod storage;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};

use ozar_app::forms::MAX_UPLOAD_BYTES;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Room for the upload itself; the bucket limit does the exact check.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES as usize + 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::sign_in))
        .route("/auth/confirm", get(auth::confirm_email))
        .route("/services", get(content::list_services))
        .route("/posts", get(content::list_posts))
        .route("/files", get(content::list_files))
        .route("/files/{id}/download", get(content::download_file))
        .route("/labs", get(pages::list_labs))
        .route("/labs/{id}/start", post(pages::start_lab))
        .route("/pricing", get(content::pricing))
        .route("/contact", post(content::submit_contact))
        .route("/chat", post(content::chat))
        .route("/storage/{bucket}/{*path}", get(storage::serve_object))
        .route("/app", get(pages::resolve_root))
        .route("/app/{*route}", get(pages::resolve_route))
        .route("/functions/daily-health-check", post(functions::daily_health_check));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::sign_out))
        .route("/auth/session", get(auth::get_session))
        .route("/auth/user", put(auth::update_user))
        .route("/profile", get(auth::get_profile).patch(auth::update_profile))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/labs/{id}/launch", post(pages::launch_dashboard_lab))
        .route("/admin/services", post(admin::create_service))
        .route("/admin/services/{id}", put(admin::update_service).delete(admin::delete_service))
        .route("/admin/posts", post(admin::create_post))
        .route("/admin/posts/{id}", delete(admin::delete_post))
        .route(
            "/admin/files",
            post(admin::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/admin/files/{id}", delete(admin::delete_file))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", patch(admin::update_user))
        .route("/admin/contact", get(admin::list_contact_messages))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
