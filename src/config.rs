//! Configuration with validation at startup.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use contact_email::{EmailConfig, EmailError};
use contact_telemetry::TelemetryConfig;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

/// Origins allowed to post the contact form by default.
const DEFAULT_CORS_ORIGINS: &str =
    "https://portfolio-chilengwe-sichalwe.vercel.app,http://localhost:3000";

/// Mode in which transport error details are returned to clients.
const DEVELOPMENT_MODE: &str = "development";

/// Contact relay configuration.
///
/// All values can be set via environment variables or CLI arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "contact-relay", about = "Contact form email relay")]
pub struct Config {
    /// Listen host
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value = "3333")]
    pub port: u16,

    /// Environment mode; transport error details are exposed only in "development"
    #[arg(long, env = "NODE_ENV")]
    pub environment: Option<String>,

    /// Mail account user (sender address and default recipient)
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: String,

    /// Mail account password or app token
    #[arg(long, env = "EMAIL_PASS")]
    pub email_pass: SecretString,

    /// Recipient of contact messages (defaults to EMAIL_USER)
    #[arg(long, env = "CONTACT_RECIPIENT")]
    pub contact_recipient: Option<String>,

    /// Display name of the sender identity
    #[arg(long, env = "SENDER_NAME", default_value = "Portfolio Contact")]
    pub sender_name: String,

    /// SMTP server URL
    #[arg(long, env = "SMTP_URL", default_value = "smtps://smtp.gmail.com:465")]
    pub smtp_url: String,

    /// SMTP transport timeout in seconds
    #[arg(long, env = "SMTP_TIMEOUT_SECS", default_value = "30")]
    pub smtp_timeout_secs: u64,

    /// CORS allowed origins (comma-separated)
    #[arg(long, env = "CORS_ALLOW_ORIGINS", default_value = DEFAULT_CORS_ORIGINS)]
    pub cors_allow_origins: String,

    /// Max requests per client within one rate-limit window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value = "100")]
    pub rate_limit_max: u32,

    /// Rate-limit window length in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "900")]
    pub rate_limit_window_secs: u64,

    /// Identify clients by proxy headers (X-Forwarded-For etc.) instead of the socket address
    #[arg(long, env = "TRUST_PROXY_HEADERS", default_value = "false")]
    pub trust_proxy_headers: bool,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    /// Use JSON log format
    #[arg(long, env = "JSON_LOGS", default_value = "false")]
    pub json_logs: bool,
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EMAIL_USER must be a valid email address")]
    InvalidEmailUser,
    #[error("EMAIL_PASS must not be empty")]
    MissingEmailPass,
    #[error("CONTACT_RECIPIENT must be a valid email address")]
    InvalidRecipient,
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
    #[error("At least one CORS origin is required")]
    NoOrigins,
    #[error("Rate limit max must be > 0")]
    InvalidRateLimitMax,
    #[error("Rate limit window must be > 0")]
    InvalidRateLimitWindow,
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

impl Config {
    /// Parse and validate configuration.
    pub fn init() -> anyhow::Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if !email_address::EmailAddress::is_valid(&self.email_user) {
            return Err(ConfigError::InvalidEmailUser);
        }
        if self.email_pass.expose_secret().is_empty() {
            return Err(ConfigError::MissingEmailPass);
        }
        if let Some(recipient) = &self.contact_recipient
            && !email_address::EmailAddress::is_valid(recipient)
        {
            return Err(ConfigError::InvalidRecipient);
        }
        if self.allowed_origins()?.is_empty() {
            return Err(ConfigError::NoOrigins);
        }
        if self.rate_limit_max == 0 {
            return Err(ConfigError::InvalidRateLimitMax);
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidRateLimitWindow);
        }
        self.listen_address()?;
        Ok(())
    }

    /// Whether transport error details are returned to clients.
    #[inline]
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.as_deref() == Some(DEVELOPMENT_MODE)
    }

    /// Mode name for logging; an unset mode is reported as development.
    #[must_use]
    pub fn mode(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEVELOPMENT_MODE)
    }

    /// Address contact messages are delivered to.
    #[must_use]
    pub fn recipient(&self) -> &str {
        self.contact_recipient.as_deref().unwrap_or(&self.email_user)
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAddress` if host and port do not form an address.
    pub fn listen_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }

    /// Parsed CORS origin allow-list.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidOrigin` for an origin that is not a valid header value.
    pub fn allowed_origins(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.cors_allow_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidOrigin(o.to_string()))
            })
            .collect()
    }

    /// Rate-limit window as Duration.
    #[inline]
    #[must_use]
    pub const fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// SMTP configuration for the outbound transport.
    ///
    /// # Errors
    /// Returns `EmailError` if the SMTP URL is invalid.
    pub fn email_config(&self) -> Result<EmailConfig, EmailError> {
        Ok(EmailConfig::from_url(&self.smtp_url, &self.email_user)?
            .with_credentials(self.email_user.clone(), self.email_pass.clone())
            .with_sender_name(self.sender_name.clone())
            .with_timeout(Duration::from_secs(self.smtp_timeout_secs)))
    }

    /// Logging configuration.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3333,
        environment: None,
        email_user: "owner@example.com".to_string(),
        email_pass: SecretString::from("app-token"),
        contact_recipient: None,
        sender_name: "Portfolio Contact".to_string(),
        smtp_url: "smtps://smtp.gmail.com:465".to_string(),
        smtp_timeout_secs: 30,
        cors_allow_origins: DEFAULT_CORS_ORIGINS.to_string(),
        rate_limit_max: 100,
        rate_limit_window_secs: 900,
        trust_proxy_headers: false,
        log_level: "INFO".to_string(),
        json_logs: false,
    }
}

#[cfg(test)]
mod tests {
    use contact_email::TlsMode;

    use super::*;

    #[test]
    fn valid_config_passes_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn default_origins_are_the_allow_list() {
        let origins = test_config().allowed_origins().unwrap();
        assert_eq!(
            origins,
            [
                "https://portfolio-chilengwe-sichalwe.vercel.app",
                "http://localhost:3000"
            ]
        );
    }

    #[test]
    fn development_flag_requires_exact_mode() {
        let mut config = test_config();
        assert!(!config.is_development());
        assert_eq!(config.mode(), "development");

        config.environment = Some("production".to_string());
        assert!(!config.is_development());

        config.environment = Some("development".to_string());
        assert!(config.is_development());
    }

    #[test]
    fn recipient_defaults_to_email_user() {
        let mut config = test_config();
        assert_eq!(config.recipient(), "owner@example.com");

        config.contact_recipient = Some("inbox@example.com".to_string());
        assert_eq!(config.recipient(), "inbox@example.com");
    }

    #[test]
    fn invalid_email_user_fails() {
        let mut config = test_config();
        config.email_user = "owner".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEmailUser)
        ));
    }

    #[test]
    fn empty_password_fails() {
        let mut config = test_config();
        config.email_pass = SecretString::from("");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEmailPass)
        ));
    }

    #[test]
    fn zero_rate_limit_fails() {
        let mut config = test_config();
        config.rate_limit_max = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimitMax)
        ));
    }

    #[test]
    fn empty_origin_list_fails() {
        let mut config = test_config();
        config.cors_allow_origins = " , ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::NoOrigins)));
    }

    #[test]
    fn listen_address_combines_host_and_port() {
        let addr = test_config().listen_address().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3333");
    }

    #[test]
    fn email_config_uses_gmail_implicit_tls() {
        let email = test_config().email_config().unwrap();
        assert_eq!(email.host, "smtp.gmail.com");
        assert_eq!(email.port, 465);
        assert_eq!(email.tls_mode, TlsMode::Implicit);
        assert_eq!(email.username.as_deref(), Some("owner@example.com"));
        assert_eq!(email.sender_name.as_deref(), Some("Portfolio Contact"));
    }
}
