//! API configuration

use domain_bank::Recipient;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Account (IBAN) payment descriptors point at
    pub recipient_account: String,
    /// Optional display name shown by paying apps
    pub recipient_name: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/brewledger".to_string(),
            log_level: "info".to_string(),
            recipient_account: "CZ6508000000192000145399".to_string(),
            recipient_name: None,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured payment recipient for descriptor rendering
    pub fn recipient(&self) -> Recipient {
        Recipient {
            account: self.recipient_account.clone(),
            name: self.recipient_name.clone(),
        }
    }
}
