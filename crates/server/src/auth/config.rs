// Authentication configuration loaded from environment variables.
// Decision: Access and refresh tokens are signed with separate secrets
// Decision: Missing secrets fall back to random per-process values so dev mode works,
// which invalidates every token on restart

use std::time::Duration;

/// Default access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);
/// Default refresh token lifetime: 7 days
pub const DEFAULT_REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens
    pub access_secret: String,
    /// Secret key for signing refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: random_secret(),
            refresh_secret: random_secret(),
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
        }
    }
}

/// Attributes of the refresh token cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Domain attribute; host-only cookie when None
    pub domain: Option<String>,
    /// Secure attribute. SameSite=None requires it in browsers.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            secure: true,
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Refresh cookie configuration
    pub cookie: CookieConfig,
}

fn random_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn secret_from_env(name: &str) -> String {
    match std::env::var(name) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!("{} not set, using a random per-process secret", name);
            random_secret()
        }
    }
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Parse a boolean flag the way the rest of the config does ("true"/"1")
pub(crate) fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let jwt = JwtConfig {
            access_secret: secret_from_env("TOKEN_SECRET"),
            refresh_secret: secret_from_env("REFRESH_TOKEN_SECRET"),
            access_token_lifetime: duration_from_env(
                "TOKEN_EXPIRES_IN",
                DEFAULT_ACCESS_TOKEN_LIFETIME,
            ),
            refresh_token_lifetime: duration_from_env(
                "REFRESH_EXPIRES_IN",
                DEFAULT_REFRESH_TOKEN_LIFETIME,
            ),
        };

        let domain = std::env::var("COOKIE_DOMAIN")
            .ok()
            .filter(|d| !d.trim().is_empty());

        let secure = std::env::var("COOKIE_SECURE")
            .map(|s| parse_flag(&s))
            .unwrap_or(true);

        Self {
            jwt,
            cookie: CookieConfig { domain, secure },
        }
    }
}
