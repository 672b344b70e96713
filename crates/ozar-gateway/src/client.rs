use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use ozar_types::api::{
    NewContactMessage, NewFile, NewPost, NewService, SignUpRequest, SignUpResponse,
    UpdateUserRequest,
};
use ozar_types::events::{AuthChange, AuthEvent};
use ozar_types::models::{
    AuthUser, FileRecord, HealthCheckResult, Post, Profile, ProfileUpdate, Service, Session,
};

use crate::backend::{Backend, Caller};
use crate::error::Result;
use crate::storage::BucketOptions;
use crate::Gateway;

/// One client's connection to the [`Backend`].
///
/// Holds the client's session in memory and notifies subscribers when it
/// changes. Requests run with the identity of the held session.
pub struct LocalGateway {
    backend: Arc<Backend>,
    session: RwLock<Option<Session>>,
    service: bool,
    events: broadcast::Sender<AuthChange>,
}

impl LocalGateway {
    /// Anonymous client.
    pub fn new(backend: Arc<Backend>) -> Self {
        Self::build(backend, None, false)
    }

    /// Client resuming a session it already holds.
    pub fn with_session(backend: Arc<Backend>, session: Session) -> Self {
        Self::build(backend, Some(session), false)
    }

    /// Trusted client for server-side jobs. Row policies do not apply.
    pub fn service(backend: Arc<Backend>) -> Self {
        Self::build(backend, None, true)
    }

    fn build(backend: Arc<Backend>, session: Option<Session>, service: bool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            session: RwLock::new(session),
            service,
            events,
        }
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    async fn caller(&self) -> Result<Caller> {
        if self.service {
            return Ok(Caller::Service);
        }
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());
        self.backend.resolve_caller(token.as_deref()).await
    }

    async fn set_session(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.write().await = session.clone();
        // No subscribers is fine
        let _ = self.events.send(AuthChange::new(event, session));
    }
}

#[async_trait]
impl Gateway for LocalGateway {
    async fn sign_up(&self, req: SignUpRequest) -> Result<SignUpResponse> {
        let (user, session) = self.backend.sign_up(req).await?;
        if let Some(session) = &session {
            self.set_session(AuthEvent::SignedIn, Some(session.clone())).await;
        }
        Ok(SignUpResponse { user, session })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.backend.sign_in(email, password).await?;
        self.set_session(AuthEvent::SignedIn, Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let had_session = self.session.read().await.is_some();
        self.set_session(AuthEvent::SignedOut, None).await;
        if had_session {
            info!("Client signed out");
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let current = self.session.read().await.clone();
        match current {
            Some(session) if session.expires_at <= Utc::now() => {
                debug!("Held session for {} expired", session.user.email);
                self.set_session(AuthEvent::SignedOut, None).await;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn on_auth_change(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn update_user(&self, req: UpdateUserRequest) -> Result<AuthUser> {
        let caller = self.caller().await?;
        let user = self.backend.update_user(&caller, req).await?;

        let refreshed = self.session.read().await.clone().map(|mut session| {
            session.user = user.clone();
            session
        });
        if refreshed.is_some() {
            self.set_session(AuthEvent::UserUpdated, refreshed).await;
        }
        Ok(user)
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Profile> {
        let caller = self.caller().await?;
        self.backend.fetch_profile(&caller, id).await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let caller = self.caller().await?;
        self.backend.list_profiles(&caller).await
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.update_profile(&caller, id, update).await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.backend.list_services().await
    }

    async fn insert_service(&self, new: NewService) -> Result<Service> {
        let caller = self.caller().await?;
        self.backend.insert_service(&caller, new).await
    }

    async fn update_service(&self, id: Uuid, new: NewService) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.update_service(&caller, id, new).await
    }

    async fn delete_service(&self, id: Uuid) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.delete_service(&caller, id).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.backend.list_posts().await
    }

    async fn insert_post(&self, new: NewPost) -> Result<Post> {
        let caller = self.caller().await?;
        self.backend.insert_post(&caller, new).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.delete_post(&caller, id).await
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.backend.list_files().await
    }

    async fn insert_file(&self, new: NewFile) -> Result<FileRecord> {
        let caller = self.caller().await?;
        self.backend.insert_file(&caller, new).await
    }

    async fn delete_file(&self, id: Uuid) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.delete_file(&caller, id).await
    }

    async fn insert_contact_message(&self, new: NewContactMessage) -> Result<()> {
        self.backend.insert_contact_message(new).await
    }

    async fn probe_health_checks(&self) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.probe_health_checks(&caller).await
    }

    async fn insert_health_check(&self, result: &HealthCheckResult) -> Result<i64> {
        let caller = self.caller().await?;
        self.backend.insert_health_check(&caller, result).await
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.backend.bucket_exists(bucket).await
    }

    async fn create_bucket(&self, bucket: &str, options: BucketOptions) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.create_bucket(&caller, bucket, options).await
    }

    async fn upload(&self, bucket: &str, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let caller = self.caller().await?;
        self.backend.upload(&caller, bucket, path, &data, content_type).await
    }

    async fn remove(&self, bucket: &str, paths: Vec<String>) -> Result<usize> {
        let caller = self.caller().await?;
        self.backend.remove(&caller, bucket, &paths).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.backend.public_url(bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendConfig;
    use crate::error::GatewayError;
    use crate::storage::Storage;
    use ozar_db::Database;
    use ozar_types::models::Role;

    async fn backend(require_confirmation: bool) -> (tempfile::TempDir, Arc<Backend>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).await.unwrap();
        let config = BackendConfig {
            require_email_confirmation: require_confirmation,
            admin_emails: vec!["admin@ozar.test".into()],
            public_url: "http://localhost:3000/".into(),
        };
        let backend = Backend::new(
            Database::open_in_memory().unwrap(),
            storage,
            "test-secret".into(),
            config,
        );
        (dir, Arc::new(backend))
    }

    fn signup(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: "hunter22".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn unconfirmed_sign_in_is_rejected_without_session() {
        let (_dir, backend) = backend(true).await;
        let client = LocalGateway::new(backend.clone());

        let res = client.sign_up(signup("ada@example.com")).await.unwrap();
        assert!(res.session.is_none());
        assert!(!res.user.is_confirmed());

        let err = client.sign_in("ada@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, GatewayError::EmailNotConfirmed));
        assert!(client.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_emits_signed_in_event() {
        let (_dir, backend) = backend(false).await;
        let client = LocalGateway::new(backend);
        let mut events = client.on_auth_change();

        client.sign_up(signup("ada@example.com")).await.unwrap();
        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);

        client.sign_out().await.unwrap();
        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());

        let session = client.sign_in("ADA@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");
        assert!(matches!(
            client.sign_in("ada@example.com", "wrong-password").await,
            Err(GatewayError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_refused() {
        let (_dir, backend) = backend(false).await;
        let client = LocalGateway::new(backend);
        client.sign_up(signup("ada@example.com")).await.unwrap();
        assert!(matches!(
            client.sign_up(signup("ada@example.com")).await,
            Err(GatewayError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn password_minimum_counts_characters() {
        let (_dir, backend) = backend(false).await;
        let client = LocalGateway::new(backend);

        // Six bytes, three characters
        let short = SignUpRequest { password: "ééé".into(), ..signup("ada@example.com") };
        assert!(matches!(client.sign_up(short).await, Err(GatewayError::InvalidInput(_))));

        let wide = SignUpRequest { password: "пароль".into(), ..signup("ada@example.com") };
        client.sign_up(wide).await.unwrap();

        let err = client
            .update_user(UpdateUserRequest { password: Some("ключ".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn content_writes_need_admin() {
        let (_dir, backend) = backend(false).await;
        let new = NewService {
            title: "Audit".into(),
            short_description: "Network audit".into(),
            full_description: "A full network security audit".into(),
            price: 49.0,
        };

        let anon = LocalGateway::new(backend.clone());
        assert!(matches!(anon.insert_service(new.clone()).await, Err(GatewayError::NotAuthenticated)));

        let user = LocalGateway::new(backend.clone());
        user.sign_up(signup("ada@example.com")).await.unwrap();
        assert!(matches!(user.insert_service(new.clone()).await, Err(GatewayError::Forbidden(_))));

        let admin = LocalGateway::new(backend.clone());
        let res = admin.sign_up(signup("admin@ozar.test")).await.unwrap();
        let service = admin.insert_service(new).await.unwrap();
        assert_eq!(service.created_by, Some(res.user.id));
        assert_eq!(anon.list_services().await.unwrap().len(), 1);

        admin.delete_service(service.id).await.unwrap();
        assert!(matches!(admin.delete_service(service.id).await, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn owners_edit_their_profile_but_not_their_role() {
        let (_dir, backend) = backend(false).await;
        let client = LocalGateway::new(backend);
        let id = client.sign_up(signup("ada@example.com")).await.unwrap().user.id;

        client
            .update_profile(id, ProfileUpdate { phone_number: Some("555-0100".into()), ..Default::default() })
            .await
            .unwrap();
        let profile = client.fetch_profile(id).await.unwrap();
        assert_eq!(profile.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(profile.role, Role::User);

        let err = client
            .update_profile(id, ProfileUpdate { role: Some(Role::Admin), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert!(matches!(client.fetch_profile(Uuid::new_v4()).await, Err(GatewayError::Forbidden(_))));
    }

    #[tokio::test]
    async fn update_user_refreshes_held_session() {
        let (_dir, backend) = backend(false).await;
        let client = LocalGateway::new(backend);
        client.sign_up(signup("ada@example.com")).await.unwrap();
        let mut events = client.on_auth_change();

        client
            .update_user(UpdateUserRequest { first_name: Some("Augusta".into()), ..Default::default() })
            .await
            .unwrap();
        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::UserUpdated);

        let session = client.get_session().await.unwrap().unwrap();
        assert_eq!(session.user.first_name.as_deref(), Some("Augusta"));

        client
            .update_user(UpdateUserRequest { password: Some("new-pass".into()), ..Default::default() })
            .await
            .unwrap();
        client.sign_out().await.unwrap();
        client.sign_in("ada@example.com", "new-pass").await.unwrap();
    }

    #[tokio::test]
    async fn confirmation_link_enables_sign_in() {
        let (_dir, backend) = backend(true).await;
        let client = LocalGateway::new(backend.clone());
        client.sign_up(signup("ada@example.com")).await.unwrap();

        let token: String = backend_token(&backend, "ada@example.com");
        backend.confirm_email(&token).await.unwrap();
        client.sign_in("ada@example.com", "hunter22").await.unwrap();
        assert!(matches!(backend.confirm_email(&token).await, Err(GatewayError::NotFound(_))));
    }

    fn backend_token(backend: &Backend, email: &str) -> String {
        backend
            .db_for_tests()
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT confirmation_token FROM users WHERE email = ?1",
                    [email],
                    |row| row.get(0),
                )?)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn service_client_records_health_checks() {
        let (_dir, backend) = backend(false).await;
        let result = HealthCheckResult {
            timestamp: Utc::now(),
            database_connected: true,
            route_checks: vec![],
            button_checks: vec![],
            errors: vec![],
            repairs: vec![],
        };

        let anon = LocalGateway::new(backend.clone());
        assert!(anon.insert_health_check(&result).await.is_err());

        let service = LocalGateway::service(backend);
        service.probe_health_checks().await.unwrap();
        assert!(service.insert_health_check(&result).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn storage_writes_are_admin_only_and_urls_are_public() {
        let (_dir, backend) = backend(false).await;
        let service = LocalGateway::service(backend.clone());
        service
            .create_bucket("files", BucketOptions { public: true, file_size_limit: None })
            .await
            .unwrap();

        let user = LocalGateway::new(backend.clone());
        user.sign_up(signup("ada@example.com")).await.unwrap();
        assert!(matches!(
            user.upload("files", "uploads/a.txt", b"hi".to_vec(), "text/plain").await,
            Err(GatewayError::Forbidden(_))
        ));

        service.upload("files", "uploads/a.txt", b"hi".to_vec(), "text/plain").await.unwrap();
        assert_eq!(
            user.public_url("files", "uploads/a.txt"),
            "http://localhost:3000/storage/files/uploads/a.txt"
        );
        assert!(backend.public_object("files", "uploads/a.txt").await.is_ok());
    }
}
