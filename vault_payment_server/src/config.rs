use std::env;

use chrono::Duration;
use log::*;
use moneta_tools::MonetaConfig;
use vault_common::{parse_boolean_flag, Secret};
use vault_payment_engine::db_types::Provider;

use crate::{errors::ServerError, helpers::HmacAlgorithm};

const DEFAULT_VPG_HOST: &str = "127.0.0.1";
const DEFAULT_VPG_PORT: u16 = 8360;
const DEFAULT_EXPIRY_WINDOW: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    /// Per-provider webhook signature configuration.
    pub astrapay: ProviderAuthConfig,
    pub cardlink: ProviderAuthConfig,
    pub moneta: ProviderAuthConfig,
    /// The API key that guards the operator surface (manual credits, payment audit).
    pub operator_api_key: Secret<String>,
    /// The time a payment may sit in `Pending`/`PendingVerification` before it is expired.
    pub expiry_window: Duration,
    /// Moneta status API client configuration, used by the poll endpoint.
    pub moneta_api: MonetaConfig,
}

/// Signature verification policy differs by environment: a missing webhook secret is a warning
/// in development (checks are skipped so local providers can be faked with curl) and a refusal
/// to start in production.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Debug)]
pub struct ProviderAuthConfig {
    pub provider: Provider,
    /// Header carrying the signature, e.g. `x-astrapay-sig`.
    pub hmac_header: String,
    pub algorithm: HmacAlgorithm,
    pub secret: Secret<String>,
    /// When false, the signature is not checked and every webhook is let through.
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VPG_HOST.to_string(),
            port: DEFAULT_VPG_PORT,
            database_url: String::default(),
            environment: Environment::Development,
            astrapay: ProviderAuthConfig::disabled(Provider::AstraPay),
            cardlink: ProviderAuthConfig::disabled(Provider::CardLink),
            moneta: ProviderAuthConfig::disabled(Provider::Moneta),
            operator_api_key: Secret::default(),
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            moneta_api: MonetaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VPG_HOST").ok().unwrap_or_else(|| DEFAULT_VPG_HOST.into());
        let port = env::var("VPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for VPG_PORT. {e} Using the default, {DEFAULT_VPG_PORT}, instead."
                    );
                    DEFAULT_VPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_VPG_PORT);
        let database_url = env::var("VPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ VPG_DATABASE_URL is not set. Please set it to the URL for the ledger database.");
            String::default()
        });
        let environment = match env::var("VPG_ENVIRONMENT").map(|s| s.to_lowercase()).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("development") | Ok("dev") | Err(_) => Environment::Development,
            Ok(other) => {
                warn!("🪛️ Unknown VPG_ENVIRONMENT value '{other}'. Assuming development.");
                Environment::Development
            },
        };
        let signature_checks = parse_boolean_flag(env::var("VPG_SIGNATURE_CHECKS").ok(), true);
        let astrapay = ProviderAuthConfig::from_env(
            Provider::AstraPay,
            "VPG_ASTRAPAY_WEBHOOK_SECRET",
            "x-astrapay-sig",
            HmacAlgorithm::Sha512Hex,
            signature_checks,
            environment,
        );
        let cardlink = ProviderAuthConfig::from_env(
            Provider::CardLink,
            "VPG_CARDLINK_WEBHOOK_SECRET",
            "x-cardlink-signature",
            HmacAlgorithm::Sha256Base64,
            signature_checks,
            environment,
        );
        let moneta = ProviderAuthConfig::from_env(
            Provider::Moneta,
            "VPG_MONETA_WEBHOOK_SECRET",
            "x-moneta-signature",
            HmacAlgorithm::Sha256Hex,
            signature_checks,
            environment,
        );
        let operator_api_key = Secret::new(env::var("VPG_OPERATOR_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ VPG_OPERATOR_API_KEY is not set. The operator endpoints will refuse all requests.");
            String::default()
        }));
        let expiry_window = env::var("VPG_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::hours)
            .unwrap_or(DEFAULT_EXPIRY_WINDOW);
        let moneta_api = MonetaConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            environment,
            astrapay,
            cardlink,
            moneta,
            operator_api_key,
            expiry_window,
            moneta_api,
        }
    }

    /// A last line of defence before the server binds. In production, running with signature
    /// checks disabled or unset secrets would silently accept forged payment notifications, so
    /// we refuse to start instead.
    pub fn assert_production_ready(&self) -> Result<(), ServerError> {
        if self.environment != Environment::Production {
            return Ok(());
        }
        for provider in [&self.astrapay, &self.cardlink, &self.moneta] {
            if !provider.enabled {
                return Err(ServerError::ConfigurationError(format!(
                    "Signature checks for {} are disabled, which is not allowed in production.",
                    provider.provider
                )));
            }
            if provider.secret.reveal().is_empty() {
                return Err(ServerError::ConfigurationError(format!(
                    "No webhook secret is configured for {} in production.",
                    provider.provider
                )));
            }
        }
        if self.operator_api_key.reveal().is_empty() {
            return Err(ServerError::ConfigurationError(
                "VPG_OPERATOR_API_KEY must be set in production.".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProviderAuthConfig {
    pub fn disabled(provider: Provider) -> Self {
        Self {
            provider,
            hmac_header: String::new(),
            algorithm: HmacAlgorithm::Sha256Hex,
            secret: Secret::default(),
            enabled: false,
        }
    }

    fn from_env(
        provider: Provider,
        secret_var: &str,
        hmac_header: &str,
        algorithm: HmacAlgorithm,
        signature_checks: bool,
        environment: Environment,
    ) -> Self {
        let secret = env::var(secret_var).unwrap_or_else(|_| {
            match environment {
                Environment::Production => {
                    error!("🪛️ {secret_var} is not set. The server will refuse to start in production.")
                },
                Environment::Development => {
                    warn!("🪛️ {secret_var} is not set. {provider} webhook signatures will NOT be checked.")
                },
            }
            String::default()
        });
        let enabled = signature_checks && !secret.is_empty();
        if !signature_checks {
            warn!("🪛️ VPG_SIGNATURE_CHECKS is off. {provider} webhooks will be accepted without verification.");
        }
        Self { provider, hmac_header: hmac_header.into(), algorithm, secret: Secret::new(secret), enabled }
    }
}
