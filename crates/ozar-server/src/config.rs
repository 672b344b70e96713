use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use ozar_app::pages::OrphanPolicy;

const PLACEHOLDER_SECRETS: [&str; 4] = ["", "dev-secret-change-me", "change-me", "secret"];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    pub public_url: String,
    pub jwt_secret: String,
    pub require_email_confirmation: bool,
    pub admin_emails: Vec<String>,
    pub health_interval: Duration,
    pub chat_delay: Duration,
    pub orphan_policy: OrphanPolicy,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("OZAR_JWT_SECRET", "");
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.trim()) {
            bail!("OZAR_JWT_SECRET must be set to a real secret");
        }

        let port = get("OZAR_PORT", "3000")
            .parse()
            .context("OZAR_PORT must be a port number")?;
        let require_email_confirmation = get("OZAR_REQUIRE_EMAIL_CONFIRMATION", "true")
            .parse()
            .context("OZAR_REQUIRE_EMAIL_CONFIRMATION must be true or false")?;
        let health_secs: u64 = get("OZAR_HEALTH_INTERVAL_SECS", "86400")
            .parse()
            .context("OZAR_HEALTH_INTERVAL_SECS must be a number of seconds")?;
        if health_secs == 0 {
            bail!("OZAR_HEALTH_INTERVAL_SECS must be positive");
        }
        let chat_ms: u64 = get("OZAR_CHAT_DELAY_MS", "1500")
            .parse()
            .context("OZAR_CHAT_DELAY_MS must be a number of milliseconds")?;
        let orphan_policy = get("OZAR_UPLOAD_ORPHAN_POLICY", "compensate")
            .parse()
            .map_err(anyhow::Error::msg)?;

        let admin_emails = get("OZAR_ADMIN_EMAILS", "")
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            host: get("OZAR_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(get("OZAR_DB_PATH", "ozar.db")),
            storage_dir: PathBuf::from(get("OZAR_STORAGE_DIR", "./storage")),
            public_url: get("OZAR_PUBLIC_URL", "http://localhost:3000"),
            jwt_secret,
            require_email_confirmation,
            admin_emails,
            health_interval: Duration::from_secs(health_secs),
            chat_delay: Duration::from_millis(chat_ms),
            orphan_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_once_secret_is_set() {
        let config = config(&[("OZAR_JWT_SECRET", "a-long-random-value")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("ozar.db"));
        assert!(config.require_email_confirmation);
        assert!(config.admin_emails.is_empty());
        assert_eq!(config.health_interval, Duration::from_secs(86_400));
        assert_eq!(config.chat_delay, Duration::from_millis(1500));
        assert_eq!(config.orphan_policy, OrphanPolicy::Compensate);
    }

    #[test]
    fn refuses_missing_or_placeholder_secret() {
        assert!(config(&[]).is_err());
        assert!(config(&[("OZAR_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn parses_lists_and_policies() {
        let config = config(&[
            ("OZAR_JWT_SECRET", "a-long-random-value"),
            ("OZAR_ADMIN_EMAILS", " Admin@Ozar.io, ,ops@ozar.io"),
            ("OZAR_UPLOAD_ORPHAN_POLICY", "leave"),
            ("OZAR_REQUIRE_EMAIL_CONFIRMATION", "false"),
        ])
        .unwrap();
        assert_eq!(config.admin_emails, vec!["admin@ozar.io", "ops@ozar.io"]);
        assert_eq!(config.orphan_policy, OrphanPolicy::Leave);
        assert!(!config.require_email_confirmation);

        assert!(
            self::config(&[("OZAR_JWT_SECRET", "x-long-value"), ("OZAR_UPLOAD_ORPHAN_POLICY", "keep")]).is_err()
        );
    }
}
