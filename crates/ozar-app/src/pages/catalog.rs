use std::sync::Arc;

use tracing::error;

use ozar_gateway::Gateway;
use ozar_types::models::{Post, Service};

use super::{Source, fallback};
use crate::notify::Notifications;

/// Public services listing. Falls back to sample services when the table
/// is empty or cannot be read.
pub struct ServicesPage {
    gateway: Arc<dyn Gateway>,
    notify: Notifications,
    pub services: Vec<Service>,
    pub source: Source,
}

impl ServicesPage {
    pub fn new(gateway: Arc<dyn Gateway>, notify: Notifications) -> Self {
        Self {
            gateway,
            notify,
            services: Vec::new(),
            source: Source::Fallback,
        }
    }

    pub async fn load(&mut self) {
        match self.gateway.list_services().await {
            Ok(services) if !services.is_empty() => {
                self.services = services;
                self.source = Source::Live;
            }
            Ok(_) => self.use_fallback(),
            Err(e) => {
                error!("Error fetching services: {}", e);
                self.notify.error("Failed to load services");
                self.use_fallback();
            }
        }
    }

    fn use_fallback(&mut self) {
        self.services = fallback::services();
        self.source = Source::Fallback;
    }
}

pub struct BlogPage {
    gateway: Arc<dyn Gateway>,
    notify: Notifications,
    pub posts: Vec<Post>,
    pub source: Source,
}

impl BlogPage {
    pub fn new(gateway: Arc<dyn Gateway>, notify: Notifications) -> Self {
        Self {
            gateway,
            notify,
            posts: Vec::new(),
            source: Source::Fallback,
        }
    }

    pub async fn load(&mut self) {
        match self.gateway.list_posts().await {
            Ok(posts) if !posts.is_empty() => {
                self.posts = posts;
                self.source = Source::Live;
            }
            Ok(_) => self.use_fallback(),
            Err(e) => {
                error!("Error fetching blog posts: {}", e);
                self.notify.error("Failed to load blog posts");
                self.use_fallback();
            }
        }
    }

    fn use_fallback(&mut self) {
        self.posts = fallback::posts();
        self.source = Source::Fallback;
    }
}
