//! Data gateway: auth, table access and object storage.
//!
//! [`Backend`] is the hosted service. [`LocalGateway`] is one client's handle
//! onto it, holding that client's session the way a BaaS SDK instance does.
//! Application code only sees the [`Gateway`] trait.

pub mod backend;
pub mod client;
mod convert;
pub mod error;
pub mod storage;
pub mod token;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use ozar_types::api::{
    NewContactMessage, NewFile, NewPost, NewService, SignUpRequest, SignUpResponse,
    UpdateUserRequest,
};
use ozar_types::events::AuthChange;
use ozar_types::models::{
    AuthUser, FileRecord, HealthCheckResult, Post, Profile, ProfileUpdate, Service, Session,
};

pub use backend::{Backend, BackendConfig, Caller};
pub use client::LocalGateway;
pub use error::{GatewayError, Result};
pub use storage::{BucketOptions, Storage};

#[async_trait]
pub trait Gateway: Send + Sync {
    // -- Auth --

    async fn sign_up(&self, req: SignUpRequest) -> Result<SignUpResponse>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_out(&self) -> Result<()>;
    async fn get_session(&self) -> Result<Option<Session>>;
    /// Auth events for this handle, starting from the moment of the call.
    fn on_auth_change(&self) -> broadcast::Receiver<AuthChange>;
    async fn update_user(&self, req: UpdateUserRequest) -> Result<AuthUser>;

    // -- Tables --

    async fn fetch_profile(&self, id: Uuid) -> Result<Profile>;
    async fn list_profiles(&self) -> Result<Vec<Profile>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<()>;

    async fn list_services(&self) -> Result<Vec<Service>>;
    async fn insert_service(&self, new: NewService) -> Result<Service>;
    async fn update_service(&self, id: Uuid, new: NewService) -> Result<()>;
    async fn delete_service(&self, id: Uuid) -> Result<()>;

    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn insert_post(&self, new: NewPost) -> Result<Post>;
    async fn delete_post(&self, id: Uuid) -> Result<()>;

    async fn list_files(&self) -> Result<Vec<FileRecord>>;
    async fn insert_file(&self, new: NewFile) -> Result<FileRecord>;
    async fn delete_file(&self, id: Uuid) -> Result<()>;

    async fn insert_contact_message(&self, new: NewContactMessage) -> Result<()>;

    async fn probe_health_checks(&self) -> Result<()>;
    async fn insert_health_check(&self, result: &HealthCheckResult) -> Result<i64>;

    // -- Storage --

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;
    async fn create_bucket(&self, bucket: &str, options: BucketOptions) -> Result<()>;
    async fn upload(&self, bucket: &str, path: &str, data: Vec<u8>, content_type: &str) -> Result<()>;
    async fn remove(&self, bucket: &str, paths: Vec<String>) -> Result<usize>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
