use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use ozar_gateway::token::random_token;
use ozar_gateway::{BucketOptions, Gateway};
use ozar_types::api::NewFile;
use ozar_types::models::{FileRecord, Post, Profile, Role, Service, UnknownRole};

use crate::error::AppError;
use crate::forms::{BlogForm, FileForm, MAX_UPLOAD_BYTES, ServiceForm, is_allowed_mime, mime_essence};
use crate::notify::Notifications;

pub const FILES_BUCKET: &str = "files";

/// Asked before every destructive call.
pub trait Confirm: Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

/// What to do with a stored object whose metadata row could not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Delete the object again.
    #[default]
    Compensate,
    /// Keep the object; it stays reachable by URL but is listed nowhere.
    Leave,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compensate" => Ok(OrphanPolicy::Compensate),
            "leave" => Ok(OrphanPolicy::Leave),
            other => Err(format!("unknown orphan policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl RoleFilter {
    pub fn matches(&self, profile: &Profile) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(role) => profile.role == *role,
        }
    }
}

impl FromStr for RoleFilter {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(RoleFilter::All),
            other => other.parse().map(RoleFilter::Only),
        }
    }
}

/// Storage path of an object from its public URL.
pub fn storage_path_from_url(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| format!("uploads/{name}"))
}

/// Admin console: CRUD over services, posts and files, plus the user list.
/// Every write is followed by a refresh of the affected listing.
pub struct AdminConsole {
    gateway: Arc<dyn Gateway>,
    notify: Notifications,
    orphan_policy: OrphanPolicy,
    pub services: Vec<Service>,
    pub posts: Vec<Post>,
    pub files: Vec<FileRecord>,
    pub users: Vec<Profile>,
    pub role_filter: RoleFilter,
}

impl AdminConsole {
    pub fn new(gateway: Arc<dyn Gateway>, notify: Notifications, orphan_policy: OrphanPolicy) -> Self {
        Self {
            gateway,
            notify,
            orphan_policy,
            services: Vec::new(),
            posts: Vec::new(),
            files: Vec::new(),
            users: Vec::new(),
            role_filter: RoleFilter::All,
        }
    }

    pub async fn load_all(&mut self) {
        self.refresh_services().await;
        self.refresh_posts().await;
        self.refresh_files().await;
        self.refresh_users().await;
    }

    pub async fn refresh_services(&mut self) {
        match self.gateway.list_services().await {
            Ok(services) => self.services = services,
            Err(e) => {
                error!("Error fetching services: {}", e);
                self.notify.error("Failed to load services");
            }
        }
    }

    pub async fn refresh_posts(&mut self) {
        match self.gateway.list_posts().await {
            Ok(posts) => self.posts = posts,
            Err(e) => {
                error!("Error fetching blog posts: {}", e);
                self.notify.error("Failed to load blog posts");
            }
        }
    }

    pub async fn refresh_files(&mut self) {
        match self.gateway.list_files().await {
            Ok(files) => self.files = files,
            Err(e) => {
                error!("Error fetching files: {}", e);
                self.notify.error("Failed to load files");
            }
        }
    }

    pub async fn refresh_users(&mut self) {
        match self.gateway.list_profiles().await {
            Ok(users) => self.users = users,
            Err(e) => {
                error!("Error fetching users: {}", e);
                self.notify.error("Failed to load users");
            }
        }
    }

    pub fn filtered_users(&self) -> Vec<&Profile> {
        self.users.iter().filter(|u| self.role_filter.matches(u)).collect()
    }

    // -- Services --

    /// Create a service, or update `editing` when given.
    pub async fn save_service(&mut self, form: &ServiceForm, editing: Option<Uuid>) -> Result<(), AppError> {
        let service = form.validate()?;
        let verb = if editing.is_some() { "update" } else { "create" };

        let result = match editing {
            Some(id) => self.gateway.update_service(id, service).await,
            None => self.gateway.insert_service(service).await.map(|_| ()),
        };
        if let Err(e) = result {
            self.notify.error(format!("Failed to {verb} service: {e}"));
            return Err(e.into());
        }

        self.notify.success(format!("Service {verb}d successfully!"));
        self.refresh_services().await;
        Ok(())
    }

    pub async fn delete_service(&mut self, id: Uuid, confirm: &dyn Confirm) -> Result<(), AppError> {
        if !confirm.confirm("Are you sure you want to delete this service?") {
            return Err(AppError::Cancelled);
        }
        if let Err(e) = self.gateway.delete_service(id).await {
            self.notify.error(format!("Failed to delete service: {e}"));
            return Err(e.into());
        }
        self.notify.success("Service deleted successfully");
        self.refresh_services().await;
        Ok(())
    }

    // -- Posts --

    pub async fn publish_post(&mut self, form: &BlogForm) -> Result<Post, AppError> {
        let post = form.validate()?;
        let post = self.gateway.insert_post(post).await.inspect_err(|e| {
            self.notify.error(format!("Failed to create blog post: {e}"));
        })?;
        self.notify.success("Blog post created successfully!");
        self.refresh_posts().await;
        Ok(post)
    }

    pub async fn delete_post(&mut self, id: Uuid, confirm: &dyn Confirm) -> Result<(), AppError> {
        if !confirm.confirm("Are you sure you want to delete this blog post?") {
            return Err(AppError::Cancelled);
        }
        if let Err(e) = self.gateway.delete_post(id).await {
            self.notify.error(format!("Failed to delete blog post: {e}"));
            return Err(e.into());
        }
        self.notify.success("Blog post deleted successfully");
        self.refresh_posts().await;
        Ok(())
    }

    // -- Files --

    /// Two-phase upload: store the object, then write its metadata row. If
    /// the row cannot be written the orphan policy decides the object's fate.
    pub async fn upload_file(&mut self, form: FileForm) -> Result<FileRecord, AppError> {
        let valid = form.validate()?;

        if !is_allowed_mime(&valid.file.content_type) {
            let err = AppError::UnsupportedFileType(valid.file.content_type.clone());
            self.notify.error(format!("Failed to upload file: {err}"));
            return Err(err);
        }

        let path = format!("uploads/{}.{}", random_token(), valid.file.extension());
        let stored = self
            .store_object(&path, valid.file.data, &mime_essence(&valid.file.content_type))
            .await
            .inspect_err(|e| self.notify.error(format!("Failed to upload file: {e}")))?;
        info!("Stored upload at {}", stored);

        let new = NewFile {
            title: valid.title,
            description: valid.description,
            file_path: self.gateway.public_url(FILES_BUCKET, &path),
            access: valid.access,
        };
        let record = match self.gateway.insert_file(new).await {
            Ok(record) => record,
            Err(e) => {
                self.handle_orphan(&path).await;
                self.notify.error(format!("Failed to upload file: {e}"));
                return Err(e.into());
            }
        };

        self.notify.success("File uploaded successfully!");
        self.refresh_files().await;
        Ok(record)
    }

    async fn store_object(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        if !self.gateway.bucket_exists(FILES_BUCKET).await? {
            let options = BucketOptions {
                public: true,
                file_size_limit: Some(MAX_UPLOAD_BYTES),
            };
            self.gateway.create_bucket(FILES_BUCKET, options).await?;
            info!("Created {} bucket", FILES_BUCKET);
        }
        self.gateway.upload(FILES_BUCKET, path, data, content_type).await?;
        Ok(format!("{FILES_BUCKET}/{path}"))
    }

    async fn handle_orphan(&self, path: &str) {
        match self.orphan_policy {
            OrphanPolicy::Compensate => {
                match self.gateway.remove(FILES_BUCKET, vec![path.to_string()]).await {
                    Ok(_) => info!("Removed {}/{} after failed metadata insert", FILES_BUCKET, path),
                    Err(e) => error!("Could not remove orphaned object {}/{}: {}", FILES_BUCKET, path, e),
                }
            }
            OrphanPolicy::Leave => {
                warn!("Object {}/{} left without a metadata row", FILES_BUCKET, path);
            }
        }
    }

    /// Remove the stored object (failures only logged), then the metadata row.
    pub async fn delete_file(&mut self, file: &FileRecord, confirm: &dyn Confirm) -> Result<(), AppError> {
        if !confirm.confirm("Are you sure you want to delete this file?") {
            return Err(AppError::Cancelled);
        }

        if let Some(path) = storage_path_from_url(&file.file_path) {
            if let Err(e) = self.gateway.remove(FILES_BUCKET, vec![path]).await {
                error!("Error deleting file from storage: {}", e);
            }
        }

        if let Err(e) = self.gateway.delete_file(file.id).await {
            self.notify.error(format!("Failed to delete file: {e}"));
            return Err(e.into());
        }
        self.notify.success("File deleted successfully");
        self.refresh_files().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozar_gateway::LocalGateway;

    use crate::forms::FileUpload;
    use crate::testing::{CountingGateway, admin_gateway, backend};

    struct Recorder(std::sync::Mutex<Vec<String>>, bool);

    impl Confirm for Recorder {
        fn confirm(&self, prompt: &str) -> bool {
            self.0.lock().unwrap().push(prompt.to_string());
            self.1
        }
    }

    fn pdf_form() -> FileForm {
        FileForm {
            title: "Lab guide".into(),
            description: "Printable guide for lab one".into(),
            file: Some(FileUpload {
                name: "guide.pdf".into(),
                content_type: "application/pdf".into(),
                data: b"%PDF-1.4".to_vec(),
            }),
            access: Some("premium".into()),
        }
    }

    #[tokio::test]
    async fn upload_creates_bucket_object_and_row() {
        let (_dir, backend) = backend(false).await;
        let admin: Arc<dyn Gateway> = Arc::new(admin_gateway(&backend).await);
        let mut console = AdminConsole::new(admin, Notifications::new(), OrphanPolicy::Compensate);

        let record = console.upload_file(pdf_form()).await.unwrap();
        assert!(record.file_path.starts_with("http://localhost:3000/storage/files/uploads/"));
        assert!(record.file_path.ends_with(".pdf"));
        assert_eq!(console.files.len(), 1);

        let path = storage_path_from_url(&record.file_path).unwrap();
        assert!(backend.public_object(FILES_BUCKET, &path).await.is_ok());

        console.delete_file(&record, &true).await.unwrap();
        assert!(console.files.is_empty());
        assert!(backend.public_object(FILES_BUCKET, &path).await.is_err());
    }

    async fn counting(fail_insert: bool) -> (tempfile::TempDir, Arc<CountingGateway>) {
        let (dir, backend) = backend(false).await;
        let mut gateway = CountingGateway::new(admin_gateway(&backend).await);
        gateway.fail_insert = fail_insert;
        (dir, Arc::new(gateway))
    }

    #[tokio::test]
    async fn disallowed_mime_never_reaches_storage() {
        let (_dir, gateway) = counting(false).await;
        let mut console = AdminConsole::new(gateway.clone(), Notifications::new(), OrphanPolicy::Compensate);

        let mut form = pdf_form();
        if let Some(file) = form.file.as_mut() {
            file.name = "setup.exe".into();
            file.content_type = "application/x-msdownload".into();
        }
        let err = console.upload_file(form).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFileType(_)));
        assert_eq!(gateway.uploads(), 0);
    }

    #[tokio::test]
    async fn failed_insert_is_compensated_or_left() {
        for (policy, expected_removes) in [(OrphanPolicy::Compensate, 1), (OrphanPolicy::Leave, 0)] {
            let (_dir, gateway) = counting(true).await;
            let mut console = AdminConsole::new(gateway.clone(), Notifications::new(), policy);

            assert!(console.upload_file(pdf_form()).await.is_err());
            assert_eq!(gateway.uploads(), 1);
            assert_eq!(gateway.removes(), expected_removes);
        }
    }

    #[tokio::test]
    async fn deletes_wait_for_confirmation() {
        let (_dir, backend) = backend(false).await;
        let admin: Arc<dyn Gateway> = Arc::new(admin_gateway(&backend).await);
        let mut console = AdminConsole::new(admin, Notifications::new(), OrphanPolicy::default());

        let form = ServiceForm {
            title: "Audit".into(),
            short_description: "Network audit".into(),
            full_description: "A full network security audit".into(),
            price: "19.99".into(),
        };
        console.save_service(&form, None).await.unwrap();
        let id = console.services[0].id;
        assert_eq!(console.services[0].price, 19.99);

        let declined = Recorder(Default::default(), false);
        assert!(matches!(console.delete_service(id, &declined).await, Err(AppError::Cancelled)));
        assert_eq!(declined.0.lock().unwrap()[0], "Are you sure you want to delete this service?");
        assert_eq!(console.services.len(), 1);

        console.delete_service(id, &true).await.unwrap();
        assert!(console.services.is_empty());
    }

    #[tokio::test]
    async fn role_filter_narrows_user_list() {
        let (_dir, backend) = backend(false).await;
        let admin: Arc<dyn Gateway> = Arc::new(admin_gateway(&backend).await);
        let user = LocalGateway::new(backend.clone());
        user.sign_up(crate::testing::signup("ada@example.com")).await.unwrap();

        let mut console = AdminConsole::new(admin, Notifications::new(), OrphanPolicy::default());
        console.refresh_users().await;
        assert_eq!(console.filtered_users().len(), 2);

        console.role_filter = "admin".parse().unwrap();
        assert_eq!(console.filtered_users().len(), 1);
        console.role_filter = "student".parse().unwrap();
        assert!(console.filtered_users().is_empty());
        assert!("owner".parse::<RoleFilter>().is_err());
    }

    #[test]
    fn storage_path_comes_from_last_url_segment() {
        assert_eq!(
            storage_path_from_url("http://localhost:3000/storage/files/uploads/abc.pdf").as_deref(),
            Some("uploads/abc.pdf")
        );
        assert_eq!(storage_path_from_url("http://host/"), None);
    }
}
