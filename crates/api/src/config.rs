use yamdb_core::confirmation::DEFAULT_CODE_LENGTH;

use crate::auth::jwt::JwtConfig;

/// Credentials of the superuser created (or promoted) at startup.
#[derive(Debug, Clone)]
pub struct SuperuserConfig {
    pub username: String,
    pub email: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Length of emailed confirmation codes (default: `24`).
    pub confirmation_code_length: usize,
    /// Optional bootstrap superuser.
    pub superuser: Option<SuperuserConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `CONFIRMATION_CODE_LENGTH` | `24`                    |
    /// | `SUPERUSER_USERNAME`       | unset                   |
    /// | `SUPERUSER_EMAIL`          | unset                   |
    ///
    /// The superuser is bootstrapped only when both of its variables are set.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let confirmation_code_length: usize = std::env::var("CONFIRMATION_CODE_LENGTH")
            .unwrap_or_else(|_| DEFAULT_CODE_LENGTH.to_string())
            .parse()
            .expect("CONFIRMATION_CODE_LENGTH must be a valid usize");
        assert!(
            confirmation_code_length > 0,
            "CONFIRMATION_CODE_LENGTH must be positive"
        );

        let superuser = match (
            std::env::var("SUPERUSER_USERNAME"),
            std::env::var("SUPERUSER_EMAIL"),
        ) {
            (Ok(username), Ok(email)) if !username.is_empty() && !email.is_empty() => {
                Some(SuperuserConfig { username, email })
            }
            _ => None,
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            confirmation_code_length,
            superuser,
        }
    }
}
