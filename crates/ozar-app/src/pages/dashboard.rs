use serde::Serialize;

use ozar_types::models::{Profile, Role};

use crate::notify::Notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Free,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardLab {
    pub id: &'static str,
    pub name: &'static str,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardDownload {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
}

pub const LABS: [DashboardLab; 3] = [
    DashboardLab { id: "1", name: "CCNA Lab 1", tier: Tier::Free },
    DashboardLab { id: "2", name: "CCNP Enterprise Core", tier: Tier::Premium },
    DashboardLab { id: "3", name: "Network Automation", tier: Tier::Premium },
];

pub const DOWNLOADS: [DashboardDownload; 3] = [
    DashboardDownload { id: "1", title: "Packet Tracer Files", category: "Files" },
    DashboardDownload { id: "2", title: "Lab Guides", category: "Guides" },
    DashboardDownload { id: "3", title: "Study Materials", category: "Documents" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchOutcome {
    Launched,
    /// Show the upgrade prompt.
    UpgradeRequired,
}

pub fn has_premium(role: Role) -> bool {
    match role {
        Role::Premium => true,
        Role::Admin | Role::User | Role::Student => false,
    }
}

pub fn launch_lab(lab: &DashboardLab, profile: Option<&Profile>, notify: &Notifications) -> LaunchOutcome {
    let premium = profile.is_some_and(|p| has_premium(p.role));
    match lab.tier {
        Tier::Premium if !premium => LaunchOutcome::UpgradeRequired,
        Tier::Premium | Tier::Free => {
            notify.success(format!("Launching {}", lab.name));
            LaunchOutcome::Launched
        }
    }
}
