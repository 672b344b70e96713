use std::sync::Arc;

use tracing::error;

use ozar_gateway::Gateway;
use ozar_types::models::{Access, FileRecord};

use crate::error::AppError;
use crate::notify::Notifications;

pub struct DownloadsPage {
    gateway: Arc<dyn Gateway>,
    notify: Notifications,
    pub files: Vec<FileRecord>,
}

impl DownloadsPage {
    pub fn new(gateway: Arc<dyn Gateway>, notify: Notifications) -> Self {
        Self {
            gateway,
            notify,
            files: Vec::new(),
        }
    }

    /// On failure the previous listing is kept.
    pub async fn load(&mut self) {
        match self.gateway.list_files().await {
            Ok(files) => self.files = files,
            Err(e) => {
                error!("Error fetching files: {}", e);
                self.notify.error("Failed to load files");
            }
        }
    }

    /// URL to open for `file`. Premium items need a signed-in visitor; this
    /// check is client-side only, the object itself stays public.
    pub fn download(&self, file: &FileRecord, signed_in: bool) -> Result<String, AppError> {
        match (file.access, signed_in) {
            (Access::Premium, false) => {
                self.notify.error("You need to log in to access premium content");
                Err(AppError::NotSignedIn)
            }
            (Access::Premium, true) => {
                self.notify.info("Downloading premium content...");
                Ok(file.file_path.clone())
            }
            (Access::Free, _) => {
                self.notify.info("Downloading file...");
                Ok(file.file_path.clone())
            }
        }
    }
}
