use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{info, warn};
use uuid::Uuid;

use ozar_db::Database;
use ozar_db::models::{ContactRow, FileRow, HealthCheckRow, PostRow, ProfileChanges, ServiceRow};
use ozar_types::api::{
    NewContactMessage, NewFile, NewPost, NewService, SignUpRequest, UpdateUserRequest,
};
use ozar_types::models::{
    AuthUser, ContactMessage, FileRecord, HealthCheckResult, Post, Profile, ProfileUpdate, Role, Service, Session,
};

use crate::convert;
use crate::error::{GatewayError, Result};
use crate::storage::{BucketOptions, Storage};
use crate::token::{create_token, random_token, verify_token};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Behaviour switches for the hosted side.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// New sign-ups get no session until they follow the confirmation link.
    pub require_email_confirmation: bool,
    /// Addresses that receive the admin role at sign-up.
    pub admin_emails: Vec<String>,
    /// Base used when building public object URLs.
    pub public_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            require_email_confirmation: true,
            admin_emails: Vec::new(),
            public_url: "http://localhost:3000".into(),
        }
    }
}

/// Who a request runs as. Row policies are evaluated against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User { id: Uuid, role: Role },
    /// Trusted server-side code (scheduled jobs). Bypasses row policies.
    Service,
}

impl Caller {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::User { id, .. } => Some(*id),
            Caller::Anonymous | Caller::Service => None,
        }
    }

    fn require_user(&self) -> Result<Uuid> {
        self.user_id().ok_or(GatewayError::NotAuthenticated)
    }

    fn require_admin(&self, action: &'static str) -> Result<()> {
        match self {
            Caller::Service => Ok(()),
            Caller::User { role: Role::Admin, .. } => Ok(()),
            Caller::User { .. } => Err(GatewayError::Forbidden(action)),
            Caller::Anonymous => Err(GatewayError::NotAuthenticated),
        }
    }

    fn require_owner_or_admin(&self, owner: Uuid, action: &'static str) -> Result<()> {
        match self {
            Caller::User { id, .. } if *id == owner => Ok(()),
            other => other.require_admin(action),
        }
    }
}

/// The hosted service: auth, tables and object storage.
///
/// Clients never talk to it directly; they go through a
/// [`LocalGateway`](crate::LocalGateway) handle.
pub struct Backend {
    db: Arc<Database>,
    storage: Storage,
    jwt_secret: String,
    config: BackendConfig,
}

impl Backend {
    pub fn new(db: Database, storage: Storage, jwt_secret: String, config: BackendConfig) -> Self {
        Self {
            db: Arc::new(db),
            storage,
            jwt_secret,
            config,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn db_for_tests(&self) -> &Database {
        &self.db
    }

    /// Run a closure against the database on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        Ok(tokio::task::spawn_blocking(move || f(&db)).await??)
    }

    // -- Auth --

    pub async fn sign_up(&self, req: SignUpRequest) -> Result<(AuthUser, Option<Session>)> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(GatewayError::InvalidInput("A valid email address is required".into()));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GatewayError::InvalidInput(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let lookup = email.clone();
        if self.with_db(move |db| db.get_user_by_email(&lookup)).await?.is_some() {
            return Err(GatewayError::AlreadyRegistered);
        }

        let password_hash = hash_password(req.password).await?;
        let role = if self.config.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(&email)) {
            Role::Admin
        } else {
            Role::User
        };
        let confirmed = !self.config.require_email_confirmation;
        let confirmation_token = (!confirmed).then(random_token);

        let id = Uuid::new_v4();
        let (first_name, last_name) = (req.first_name, req.last_name);
        let (insert_email, insert_token) = (email.clone(), confirmation_token.clone());
        self.with_db(move |db| {
            db.create_user(
                &id.to_string(),
                &insert_email,
                &password_hash,
                &first_name,
                &last_name,
                role.as_str(),
                confirmed,
                insert_token.as_deref(),
            )
        })
        .await?;

        let user = self.load_user(id).await?;
        info!("User signed up: {} ({}, role {})", email, id, role);

        match confirmation_token {
            Some(token) => {
                // Email delivery is out of scope; the link goes to the log.
                info!(
                    "Confirmation link for {}: {}/auth/confirm?token={}",
                    email,
                    self.config.public_url.trim_end_matches('/'),
                    token
                );
                Ok((user, None))
            }
            None => {
                let session = self.issue_session(user.clone())?;
                Ok((user, Some(session)))
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let row = self
            .with_db(move |db| db.get_user_by_email(&email))
            .await?
            .ok_or(GatewayError::InvalidCredentials)?;

        verify_password(password.to_string(), row.password.clone()).await?;

        let user = convert::user(row);
        if !user.is_confirmed() {
            warn!("Sign-in refused for unconfirmed address {}", user.email);
            return Err(GatewayError::EmailNotConfirmed);
        }
        info!("User signed in: {}", user.email);
        self.issue_session(user)
    }

    /// Resolve an access token to the identity it was issued for.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthUser> {
        let claims =
            verify_token(&self.jwt_secret, access_token).ok_or(GatewayError::NotAuthenticated)?;
        match self.load_user(claims.sub).await {
            Err(GatewayError::NotFound(_)) => Err(GatewayError::NotAuthenticated),
            other => other,
        }
    }

    /// Rebuild a session from a bearer token presented by an HTTP client.
    pub async fn session_from_token(&self, access_token: &str) -> Result<Session> {
        let claims =
            verify_token(&self.jwt_secret, access_token).ok_or(GatewayError::NotAuthenticated)?;
        let user = self.authenticate(access_token).await?;
        Ok(Session {
            access_token: access_token.to_string(),
            expires_at: chrono::DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_default(),
            user,
        })
    }

    /// Consume a confirmation token. Returns the now-confirmed user.
    pub async fn confirm_email(&self, token: &str) -> Result<AuthUser> {
        let token = token.to_string();
        let id = self
            .with_db(move |db| db.confirm_user(&token))
            .await?
            .ok_or(GatewayError::NotFound("Confirmation token"))?;
        let user = self.load_user(convert::parse_id(&id, "user")).await?;
        info!("Email confirmed: {}", user.email);
        Ok(user)
    }

    pub async fn update_user(&self, caller: &Caller, req: UpdateUserRequest) -> Result<AuthUser> {
        let id = caller.require_user()?;

        if let Some(password) = req.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(GatewayError::InvalidInput(format!(
                    "Password should be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            let hash = hash_password(password).await?;
            self.with_db(move |db| db.update_user_password(&id.to_string(), &hash)).await?;
            info!("Password changed for user {}", id);
        }

        if req.first_name.is_some() || req.last_name.is_some() {
            let (first, last) = (req.first_name, req.last_name);
            self.with_db(move |db| {
                db.update_user_metadata(&id.to_string(), first.as_deref(), last.as_deref())
            })
            .await?;
        }

        self.load_user(id).await
    }

    /// Work out who holds `access_token`. Missing or invalid tokens are anonymous.
    pub async fn resolve_caller(&self, access_token: Option<&str>) -> Result<Caller> {
        let Some(claims) = access_token.and_then(|t| verify_token(&self.jwt_secret, t)) else {
            return Ok(Caller::Anonymous);
        };
        let id = claims.sub;
        let role = self
            .with_db(move |db| db.get_profile(&id.to_string()))
            .await?
            .map(convert::profile)
            .map(|p| p.role)
            .unwrap_or_default();
        Ok(Caller::User { id, role })
    }

    fn issue_session(&self, user: AuthUser) -> Result<Session> {
        let (access_token, expires_at) = create_token(&self.jwt_secret, user.id, &user.email)?;
        Ok(Session {
            access_token,
            expires_at,
            user,
        })
    }

    async fn load_user(&self, id: Uuid) -> Result<AuthUser> {
        self.with_db(move |db| db.get_user_by_id(&id.to_string()))
            .await?
            .map(convert::user)
            .ok_or(GatewayError::NotFound("User"))
    }

    // -- Profiles --

    pub async fn fetch_profile(&self, caller: &Caller, id: Uuid) -> Result<Profile> {
        caller.require_owner_or_admin(id, "read another user's profile")?;
        self.with_db(move |db| db.get_profile(&id.to_string()))
            .await?
            .map(convert::profile)
            .ok_or(GatewayError::NotFound("Profile"))
    }

    pub async fn list_profiles(&self, caller: &Caller) -> Result<Vec<Profile>> {
        caller.require_admin("list users")?;
        let rows = self.with_db(|db| db.list_profiles()).await?;
        Ok(rows.into_iter().map(convert::profile).collect())
    }

    pub async fn update_profile(&self, caller: &Caller, id: Uuid, update: ProfileUpdate) -> Result<()> {
        caller.require_owner_or_admin(id, "edit another user's profile")?;
        if update.role.is_some() {
            caller.require_admin("change roles")?;
        }

        let updated = self
            .with_db(move |db| {
                let changes = ProfileChanges {
                    first_name: update.first_name.as_deref(),
                    last_name: update.last_name.as_deref(),
                    phone_number: update.phone_number.as_deref(),
                    avatar_url: update.avatar_url.as_deref(),
                    role: update.role.map(|r| r.as_str()),
                };
                db.update_profile(&id.to_string(), &changes)
            })
            .await?;

        if !updated {
            return Err(GatewayError::NotFound("Profile"));
        }
        Ok(())
    }

    // -- Services --

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = self.with_db(|db| db.list_services()).await?;
        Ok(rows.into_iter().map(convert::service).collect())
    }

    pub async fn insert_service(&self, caller: &Caller, new: NewService) -> Result<Service> {
        caller.require_admin("create services")?;
        let row = ServiceRow {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            short_description: new.short_description,
            full_description: new.full_description,
            price: new.price,
            created_by: caller.user_id().map(|id| id.to_string()),
            created_at: ozar_db::now(),
        };
        self.with_db(move |db| {
            db.insert_service(&row)?;
            Ok(row)
        })
        .await
        .map(convert::service)
    }

    pub async fn update_service(&self, caller: &Caller, id: Uuid, new: NewService) -> Result<()> {
        caller.require_admin("edit services")?;
        let updated = self
            .with_db(move |db| {
                db.update_service(
                    &id.to_string(),
                    &new.title,
                    &new.short_description,
                    &new.full_description,
                    new.price,
                )
            })
            .await?;
        if !updated {
            return Err(GatewayError::NotFound("Service"));
        }
        Ok(())
    }

    pub async fn delete_service(&self, caller: &Caller, id: Uuid) -> Result<()> {
        caller.require_admin("delete services")?;
        if !self.with_db(move |db| db.delete_service(&id.to_string())).await? {
            return Err(GatewayError::NotFound("Service"));
        }
        Ok(())
    }

    // -- Posts --

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = self.with_db(|db| db.list_posts()).await?;
        Ok(rows.into_iter().map(convert::post).collect())
    }

    pub async fn insert_post(&self, caller: &Caller, new: NewPost) -> Result<Post> {
        caller.require_admin("publish posts")?;
        let row = PostRow {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            short_content: new.short_content,
            full_content: new.full_content,
            author_id: caller.user_id().map(|id| id.to_string()),
            created_at: ozar_db::now(),
        };
        self.with_db(move |db| {
            db.insert_post(&row)?;
            Ok(row)
        })
        .await
        .map(convert::post)
    }

    pub async fn delete_post(&self, caller: &Caller, id: Uuid) -> Result<()> {
        caller.require_admin("delete posts")?;
        if !self.with_db(move |db| db.delete_post(&id.to_string())).await? {
            return Err(GatewayError::NotFound("Post"));
        }
        Ok(())
    }

    // -- Files --

    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let rows = self.with_db(|db| db.list_files()).await?;
        Ok(rows.into_iter().map(convert::file).collect())
    }

    pub async fn get_file(&self, id: Uuid) -> Result<FileRecord> {
        self.with_db(move |db| db.get_file(&id.to_string()))
            .await?
            .map(convert::file)
            .ok_or(GatewayError::NotFound("File"))
    }

    pub async fn insert_file(&self, caller: &Caller, new: NewFile) -> Result<FileRecord> {
        caller.require_admin("add downloads")?;
        let row = FileRow {
            id: Uuid::new_v4().to_string(),
            file_name: new.title,
            description: new.description,
            file_path: new.file_path,
            access: new.access.as_str().to_string(),
            user_id: caller.user_id().map(|id| id.to_string()),
            created_at: ozar_db::now(),
        };
        self.with_db(move |db| {
            db.insert_file(&row)?;
            Ok(row)
        })
        .await
        .map(convert::file)
    }

    pub async fn delete_file(&self, caller: &Caller, id: Uuid) -> Result<()> {
        caller.require_admin("delete downloads")?;
        if !self.with_db(move |db| db.delete_file(&id.to_string())).await? {
            return Err(GatewayError::NotFound("File"));
        }
        Ok(())
    }

    // -- Contact messages --

    /// Anyone may write; only admins read them back.
    pub async fn insert_contact_message(&self, new: NewContactMessage) -> Result<()> {
        let row = ContactRow {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            subject: new.subject,
            message: new.message,
            created_at: ozar_db::now(),
        };
        self.with_db(move |db| db.insert_contact_message(&row)).await
    }

    pub async fn list_contact_messages(&self, caller: &Caller) -> Result<Vec<ContactMessage>> {
        caller.require_admin("read contact messages")?;
        let rows = self.with_db(|db| db.list_contact_messages()).await?;
        Ok(rows.into_iter().map(convert::contact).collect())
    }

    // -- Health checks --

    pub async fn probe_health_checks(&self, caller: &Caller) -> Result<()> {
        caller.require_admin("read health checks")?;
        self.with_db(|db| db.probe_health_checks()).await?;
        Ok(())
    }

    pub async fn insert_health_check(&self, caller: &Caller, result: &HealthCheckResult) -> Result<i64> {
        caller.require_admin("record health checks")?;
        let row = HealthCheckRow {
            timestamp: result.timestamp.to_rfc3339(),
            database_connected: result.database_connected,
            route_checks: to_json(&result.route_checks)?,
            button_checks: to_json(&result.button_checks)?,
            errors: to_json(&result.errors)?,
            repairs: to_json(&result.repairs)?,
        };
        self.with_db(move |db| db.insert_health_check(&row)).await
    }

    // -- Storage --

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.storage.bucket_exists(bucket).await
    }

    pub async fn create_bucket(&self, caller: &Caller, bucket: &str, options: BucketOptions) -> Result<()> {
        caller.require_admin("create buckets")?;
        self.storage.create_bucket(bucket, options).await
    }

    pub async fn upload(&self, caller: &Caller, bucket: &str, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        caller.require_admin("upload objects")?;
        info!("Upload {}/{} ({}, {} bytes)", bucket, path, content_type, data.len());
        self.storage.upload(bucket, path, data).await
    }

    pub async fn remove(&self, caller: &Caller, bucket: &str, paths: &[String]) -> Result<usize> {
        caller.require_admin("delete objects")?;
        self.storage.remove(bucket, paths).await
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.config.public_url.trim_end_matches('/'),
            bucket,
            path
        )
    }

    /// On-disk location of an object in a public bucket, for serving.
    pub async fn public_object(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let options = self.storage.bucket_options(bucket).await?;
        if !options.public {
            return Err(GatewayError::NotFound("Object"));
        }
        if !self.storage.object_exists(bucket, path).await? {
            return Err(GatewayError::NotFound("Object"));
        }
        self.storage.object_path(bucket, path)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value).map_err(anyhow::Error::from)?)
}

async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
    })
    .await?
}

async fn verify_password(password: String, stored_hash: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| GatewayError::InvalidCredentials)
    })
    .await?
}
