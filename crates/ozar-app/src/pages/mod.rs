//! Page controllers. Each one loads from, and writes to, a single table
//! through the gateway and reports outcomes as notifications.

pub mod admin;
pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod downloads;
pub mod fallback;
pub mod labs;
pub mod pricing;
pub mod profile;

use serde::Serialize;

pub use admin::{AdminConsole, Confirm, OrphanPolicy, RoleFilter};
pub use catalog::{BlogPage, ServicesPage};
pub use contact::ContactPage;
pub use downloads::DownloadsPage;
pub use labs::LabsPage;

/// Whether a listing came from the live table or from sample content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}
