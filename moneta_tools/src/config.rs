use std::time::Duration;

use log::*;
use vault_common::Secret;

#[derive(Debug, Clone)]
pub struct MonetaConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    /// Hard cap on any single status request. A poll that exceeds this is treated as
    /// "provider unavailable" by callers, never as a settled payment.
    pub timeout: Duration,
}

impl Default for MonetaConfig {
    fn default() -> Self {
        Self { api_url: "https://api.moneta.example.com".to_string(), api_key: Secret::default(), timeout: Duration::from_secs(10) }
    }
}

impl MonetaConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("VPG_MONETA_API_URL").unwrap_or_else(|_| {
            warn!("VPG_MONETA_API_URL not set, using (probably useless) default");
            MonetaConfig::default().api_url
        });
        let api_key = Secret::new(std::env::var("VPG_MONETA_API_KEY").unwrap_or_else(|_| {
            warn!("VPG_MONETA_API_KEY not set, using (probably useless) default");
            "mnt_00000000000000".to_string()
        }));
        let timeout = std::env::var("VPG_MONETA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                warn!("VPG_MONETA_TIMEOUT_SECS not set, using 10s as default");
                Duration::from_secs(10)
            });
        Self { api_url, api_key, timeout }
    }
}
