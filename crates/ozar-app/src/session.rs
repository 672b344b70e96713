//! Session holder: the signed-in identity and its profile, kept in sync with
//! the gateway's auth events and published to every reader through a watch
//! channel.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ozar_gateway::{Gateway, GatewayError};
use ozar_types::api::{SignUpRequest, UpdateUserRequest};
use ozar_types::events::{AuthChange, AuthEvent};
use ozar_types::models::{AuthUser, Profile, ProfileUpdate, Role, Session};

use crate::error::AppError;
use crate::forms::PasswordForm;
use crate::notify::Notifications;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub auth_loading: bool,
    pub profile_loading: bool,
}

impl SessionState {
    fn starting() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            auth_loading: true,
            profile_loading: true,
        }
    }

    /// State for a request whose identity is already known, as on the server.
    pub fn resolved(session: Option<Session>, profile: Option<Profile>) -> Self {
        Self {
            user: session.as_ref().map(|s| s.user.clone()),
            session,
            profile,
            auth_loading: false,
            profile_loading: false,
        }
    }

    /// Role information is only trustworthy once both flags are down.
    pub fn is_loading(&self) -> bool {
        self.auth_loading || self.profile_loading
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    fn clear_identity(&mut self) {
        self.session = None;
        self.user = None;
        self.profile = None;
        self.profile_loading = false;
    }
}

/// Where the caller should navigate after a successful sign-up.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// A session was issued immediately.
    SignedIn(Session),
    /// The address must be confirmed before the first sign-in.
    AwaitingConfirmation(AuthUser),
}

impl SignUpOutcome {
    pub fn redirect(&self) -> &'static str {
        match self {
            SignUpOutcome::SignedIn(_) => "/",
            SignUpOutcome::AwaitingConfirmation(_) => "/login",
        }
    }
}

/// Explicitly scoped session context. Created with [`SessionContext::start`],
/// torn down with [`SessionContext::shutdown`] or by dropping it.
pub struct SessionContext {
    gateway: Arc<dyn Gateway>,
    state: Arc<watch::Sender<SessionState>>,
    notify: Notifications,
    listener: JoinHandle<()>,
}

impl SessionContext {
    /// Subscribe to auth events, then load any session the gateway already holds.
    pub async fn start(gateway: Arc<dyn Gateway>, notify: Notifications) -> Self {
        let (tx, _) = watch::channel(SessionState::starting());
        let state = Arc::new(tx);

        let listener = tokio::spawn(listen(
            gateway.on_auth_change(),
            gateway.clone(),
            state.clone(),
            notify.clone(),
        ));

        let ctx = Self {
            gateway,
            state,
            notify,
            listener,
        };
        ctx.check_session().await;
        ctx
    }

    async fn check_session(&self) {
        self.state.send_modify(|s| s.auth_loading = true);

        match self.gateway.get_session().await {
            Ok(Some(session)) => {
                let user_id = session.user.id;
                self.state.send_modify(|s| {
                    s.user = Some(session.user.clone());
                    s.session = Some(session);
                });
                fetch_profile(self.gateway.as_ref(), &self.state, user_id).await;
            }
            Ok(None) => self.state.send_modify(SessionState::clear_identity),
            Err(e) => {
                error!("Error checking session: {}", e);
                self.state.send_modify(SessionState::clear_identity);
            }
        }

        self.state.send_modify(|s| s.auth_loading = false);
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notify
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<SignUpOutcome, AppError> {
        self.state.send_modify(|s| s.auth_loading = true);
        let result = self
            .gateway
            .sign_up(SignUpRequest {
                email: email.to_string(),
                password: password.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            })
            .await;
        self.state.send_modify(|s| s.auth_loading = false);

        let response = result.inspect_err(|e| self.notify.error(e.to_string()))?;
        self.notify.success("Signup successful!");

        // With a session, the auth-change listener picks up identity and profile
        Ok(match response.session {
            Some(session) => SignUpOutcome::SignedIn(session),
            None => {
                self.notify.success("Signup successful! Please check your email for verification.");
                SignUpOutcome::AwaitingConfirmation(response.user)
            }
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.state.send_modify(|s| s.auth_loading = true);
        let result = self.gateway.sign_in(email, password).await;
        self.state.send_modify(|s| s.auth_loading = false);

        match result {
            Ok(session) if !session.user.is_confirmed() => {
                // Never keep a session for an unconfirmed address
                if let Err(e) = self.gateway.sign_out().await {
                    warn!("Discarding unconfirmed session failed: {}", e);
                }
                self.state.send_modify(SessionState::clear_identity);
                self.notify.warning("Please confirm your email address before logging in.");
                Err(AppError::EmailNotConfirmed)
            }
            Ok(session) => Ok(session),
            Err(GatewayError::EmailNotConfirmed) => {
                self.notify.warning("Please confirm your email address before logging in.");
                Err(AppError::EmailNotConfirmed)
            }
            Err(e) => {
                self.notify.error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Identity and profile are cleared whatever the gateway reports.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        info!("Sign out initiated");
        self.state.send_modify(|s| s.auth_loading = true);
        let result = self.gateway.sign_out().await;

        self.state.send_modify(|s| {
            s.clear_identity();
            s.auth_loading = false;
        });

        match result {
            Ok(()) => {
                self.notify.success("Successfully signed out");
                Ok(())
            }
            Err(e) => {
                self.notify.error(format!("Failed to sign out: {e}"));
                Err(e.into())
            }
        }
    }

    /// Write the signed-in user's own profile row, then merge the accepted
    /// fields into local state.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), AppError> {
        let Some(user_id) = self.state.borrow().user.as_ref().map(|u| u.id) else {
            self.notify.error("Failed to update profile: No user logged in");
            return Err(AppError::NotSignedIn);
        };

        if let Err(e) = self.gateway.update_profile(user_id, update.clone()).await {
            self.notify.error(format!("Failed to update profile: {e}"));
            return Err(e.into());
        }

        self.state.send_modify(|s| {
            if let Some(profile) = s.profile.as_mut() {
                profile.apply(&update);
            }
        });
        self.notify.success("Profile updated successfully");
        Ok(())
    }

    /// Update the auth identity's name metadata.
    pub async fn update_account_name(&self, first_name: &str, last_name: &str) -> Result<AuthUser, AppError> {
        let req = UpdateUserRequest {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            ..Default::default()
        };
        self.update_user(req, "Failed to update account").await
    }

    pub async fn change_password(&self, form: &PasswordForm) -> Result<(), AppError> {
        let password = form.validate()?;
        let req = UpdateUserRequest {
            password: Some(password),
            ..Default::default()
        };
        self.update_user(req, "Failed to update password").await?;
        self.notify.success("Password updated successfully");
        Ok(())
    }

    async fn update_user(&self, req: UpdateUserRequest, failure: &str) -> Result<AuthUser, AppError> {
        let user = self.gateway.update_user(req).await.inspect_err(|e| {
            self.notify.error(format!("{failure}: {e}"));
        })?;
        self.state.send_modify(|s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// End the auth subscription.
    pub fn shutdown(self) {}
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.listener.abort();
        debug!("Session context shut down");
    }
}

async fn listen(
    mut events: broadcast::Receiver<AuthChange>,
    gateway: Arc<dyn Gateway>,
    state: Arc<watch::Sender<SessionState>>,
    notify: Notifications,
) {
    loop {
        match events.recv().await {
            Ok(change) => on_auth_change(change, gateway.as_ref(), &state, &notify).await,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Session listener lagged, skipped {} auth events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn on_auth_change(
    change: AuthChange,
    gateway: &dyn Gateway,
    state: &watch::Sender<SessionState>,
    notify: &Notifications,
) {
    debug!("Auth state changed: {:?}", change.event);
    let user = change.session.as_ref().map(|s| s.user.clone());
    let user_id = user.as_ref().map(|u| u.id);
    state.send_modify(|s| {
        s.session = change.session.clone();
        s.user = user;
    });

    match (change.event, user_id) {
        (AuthEvent::SignedIn, Some(id)) => {
            notify.success("Successfully signed in");
            fetch_profile(gateway, state, id).await;
        }
        (AuthEvent::SignedOut, _) => {
            notify.info("Signed out");
            state.send_modify(SessionState::clear_identity);
        }
        (AuthEvent::SignedIn, None) | (AuthEvent::UserUpdated, _) => {}
    }
}

/// Last write wins: concurrent fetches are not de-duplicated.
async fn fetch_profile(gateway: &dyn Gateway, state: &watch::Sender<SessionState>, user_id: Uuid) {
    state.send_modify(|s| s.profile_loading = true);
    match gateway.fetch_profile(user_id).await {
        Ok(profile) => state.send_modify(|s| s.profile = Some(profile)),
        Err(e) => error!("Error fetching user profile: {}", e),
    }
    state.send_modify(|s| s.profile_loading = false);
}
