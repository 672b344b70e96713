//! Shared fixtures for the crate's tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::broadcast;
use uuid::Uuid;

use ozar_db::Database;
use ozar_gateway::{
    Backend, BackendConfig, BucketOptions, Caller, Gateway, GatewayError, LocalGateway, Result as GatewayResult, Storage,
};
use ozar_types::api::{
    NewContactMessage, NewFile, NewPost, NewService, SignUpRequest, SignUpResponse, UpdateUserRequest,
};
use ozar_types::events::AuthChange;
use ozar_types::models::{AuthUser, FileRecord, HealthCheckResult, Post, Profile, ProfileUpdate, Service, Session};

pub const ADMIN_EMAIL: &str = "admin@ozar.test";

/// In-memory database with storage in a temp dir. Keep the dir alive for the
/// length of the test.
pub async fn backend(require_confirmation: bool) -> (TempDir, Arc<Backend>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().join("storage")).await.unwrap();
    let config = BackendConfig {
        require_email_confirmation: require_confirmation,
        admin_emails: vec![ADMIN_EMAIL.into()],
        public_url: "http://localhost:3000".into(),
    };
    let backend = Backend::new(Database::open_in_memory().unwrap(), storage, "test-secret".into(), config);
    (dir, Arc::new(backend))
}

pub fn signup(email: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.into(),
        password: "hunter22".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
    }
}

/// A client signed in as the admin address. Requires a backend built
/// without email confirmation.
pub async fn admin_gateway(backend: &Arc<Backend>) -> LocalGateway {
    let gateway = LocalGateway::new(backend.clone());
    let response = gateway.sign_up(signup(ADMIN_EMAIL)).await.unwrap();
    assert!(response.session.is_some(), "admin fixture needs confirmation disabled");
    gateway
}

pub async fn contact_count(backend: &Backend) -> usize {
    backend.list_contact_messages(&Caller::Service).await.unwrap().len()
}

/// Wraps a real client, counting storage calls. Can be told to refuse
/// metadata inserts or sign-outs.
pub struct CountingGateway {
    pub inner: LocalGateway,
    pub uploads: AtomicUsize,
    pub removes: AtomicUsize,
    pub fail_insert: bool,
    pub fail_sign_out: bool,
}

impl CountingGateway {
    pub fn new(inner: LocalGateway) -> Self {
        Self {
            inner,
            uploads: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
            fail_insert: false,
            fail_sign_out: false,
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for CountingGateway {
    async fn sign_up(&self, req: SignUpRequest) -> GatewayResult<SignUpResponse> {
        self.inner.sign_up(req).await
    }
    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session> {
        self.inner.sign_in(email, password).await
    }
    async fn sign_out(&self) -> GatewayResult<()> {
        if self.fail_sign_out {
            return Err(GatewayError::Storage("connection reset".into()));
        }
        self.inner.sign_out().await
    }
    async fn get_session(&self) -> GatewayResult<Option<Session>> {
        self.inner.get_session().await
    }
    fn on_auth_change(&self) -> broadcast::Receiver<AuthChange> {
        self.inner.on_auth_change()
    }
    async fn update_user(&self, req: UpdateUserRequest) -> GatewayResult<AuthUser> {
        self.inner.update_user(req).await
    }
    async fn fetch_profile(&self, id: Uuid) -> GatewayResult<Profile> {
        self.inner.fetch_profile(id).await
    }
    async fn list_profiles(&self) -> GatewayResult<Vec<Profile>> {
        self.inner.list_profiles().await
    }
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> GatewayResult<()> {
        self.inner.update_profile(id, update).await
    }
    async fn list_services(&self) -> GatewayResult<Vec<Service>> {
        self.inner.list_services().await
    }
    async fn insert_service(&self, new: NewService) -> GatewayResult<Service> {
        self.inner.insert_service(new).await
    }
    async fn update_service(&self, id: Uuid, new: NewService) -> GatewayResult<()> {
        self.inner.update_service(id, new).await
    }
    async fn delete_service(&self, id: Uuid) -> GatewayResult<()> {
        self.inner.delete_service(id).await
    }
    async fn list_posts(&self) -> GatewayResult<Vec<Post>> {
        self.inner.list_posts().await
    }
    async fn insert_post(&self, new: NewPost) -> GatewayResult<Post> {
        self.inner.insert_post(new).await
    }
    async fn delete_post(&self, id: Uuid) -> GatewayResult<()> {
        self.inner.delete_post(id).await
    }
    async fn list_files(&self) -> GatewayResult<Vec<FileRecord>> {
        self.inner.list_files().await
    }
    async fn insert_file(&self, new: NewFile) -> GatewayResult<FileRecord> {
        if self.fail_insert {
            return Err(GatewayError::InvalidInput("insert refused".into()));
        }
        self.inner.insert_file(new).await
    }
    async fn delete_file(&self, id: Uuid) -> GatewayResult<()> {
        self.inner.delete_file(id).await
    }
    async fn insert_contact_message(&self, new: NewContactMessage) -> GatewayResult<()> {
        self.inner.insert_contact_message(new).await
    }
    async fn probe_health_checks(&self) -> GatewayResult<()> {
        self.inner.probe_health_checks().await
    }
    async fn insert_health_check(&self, result: &HealthCheckResult) -> GatewayResult<i64> {
        self.inner.insert_health_check(result).await
    }
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        self.inner.bucket_exists(bucket).await
    }
    async fn create_bucket(&self, bucket: &str, options: BucketOptions) -> GatewayResult<()> {
        self.inner.create_bucket(bucket, options).await
    }
    async fn upload(&self, bucket: &str, path: &str, data: Vec<u8>, content_type: &str) -> GatewayResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(bucket, path, data, content_type).await
    }
    async fn remove(&self, bucket: &str, paths: Vec<String>) -> GatewayResult<usize> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(bucket, paths).await
    }
    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }
}
