use std::sync::Arc;
use std::time::Duration;

use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use tracing::debug;

use ozar_app::HealthJob;
use ozar_app::chat::DEFAULT_TYPING_DELAY;
use ozar_app::pages::OrphanPolicy;
use ozar_app::pages::labs::LAB_START_DELAY;
use ozar_gateway::{Backend, Gateway, LocalGateway};
use ozar_types::models::Session;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub backend: Arc<Backend>,
    pub health: Arc<HealthJob>,
    pub orphan_policy: OrphanPolicy,
    pub chat_delay: Duration,
    pub lab_start_delay: Duration,
}

impl AppStateInner {
    pub fn new(backend: Arc<Backend>) -> Self {
        let service: Arc<dyn Gateway> = Arc::new(LocalGateway::service(backend.clone()));
        Self {
            backend,
            health: Arc::new(HealthJob::new(service)),
            orphan_policy: OrphanPolicy::default(),
            chat_delay: DEFAULT_TYPING_DELAY,
            lab_start_delay: LAB_START_DELAY,
        }
    }

    pub fn anonymous(&self) -> Arc<dyn Gateway> {
        Arc::new(LocalGateway::new(self.backend.clone()))
    }

    /// A gateway client holding the request's session.
    pub fn client(&self, session: Session) -> Arc<dyn Gateway> {
        Arc::new(LocalGateway::with_session(self.backend.clone(), session))
    }

    /// Session for routes where signing in is optional. A bad token counts as
    /// signed out.
    pub async fn optional_session(&self, bearer: Option<TypedHeader<Authorization<Bearer>>>) -> Option<Session> {
        let TypedHeader(Authorization(bearer)) = bearer?;
        match self.backend.session_from_token(bearer.token()).await {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("Ignoring bearer token: {}", e);
                None
            }
        }
    }
}
