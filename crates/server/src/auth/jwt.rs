// JWT token service for authentication
// Decision: Use HS256 algorithm for simplicity (symmetric key)
// Decision: Access tokens are stateless; refresh tokens are also stored (hashed) in the DB
// Decision: Every refresh token carries a random jti so two tokens issued in the same
// second never collide, which rotation relies on

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::JwtConfig;

const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Generate a random identifier string (32 hex characters)
fn generate_random_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Why a token was rejected
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("expected a {expected} token")]
    WrongType { expected: &'static str },
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err),
        }
    }
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub user_id: Uuid,
    /// Display name at issue time
    pub username: String,
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenClaims {
    /// Subject (user ID)
    pub user_id: Uuid,
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token ID (for revocation)
    pub jti: String,
}

/// A freshly signed refresh token
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let access_encoding_key = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding_key = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding_key = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding_key = DecodingKey::from_secret(config.refresh_secret.as_bytes());

        Self {
            config,
            access_encoding_key,
            access_decoding_key,
            refresh_encoding_key,
            refresh_decoding_key,
        }
    }

    /// Issue an access token carrying the user's id and username
    pub fn issue_access_token(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.access_token_lifetime)?;

        let claims = AccessTokenClaims {
            user_id,
            username: username.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding_key)
            .context("Failed to encode access token")
    }

    /// Issue a refresh token signed with the refresh secret
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<IssuedRefreshToken> {
        let now = Utc::now();
        let expires_at = now + Duration::from_std(self.config.refresh_token_lifetime)?;
        let jti = generate_random_id();

        let claims = RefreshTokenClaims {
            user_id,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.refresh_encoding_key)
            .context("Failed to encode refresh token")?;

        Ok(IssuedRefreshToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validate and decode an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let token_data =
            decode::<AccessTokenClaims>(token, &self.access_decoding_key, &Validation::default())?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::WrongType {
                expected: ACCESS_TOKEN_TYPE,
            });
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, TokenError> {
        let token_data = decode::<RefreshTokenClaims>(
            token,
            &self.refresh_decoding_key,
            &Validation::default(),
        )?;

        if token_data.claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(TokenError::WrongType {
                expected: REFRESH_TOKEN_TYPE,
            });
        }

        Ok(token_data.claims)
    }

    /// Get access token lifetime in seconds
    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.config.access_token_lifetime.as_secs() as i64
    }

    /// Get refresh token lifetime in seconds
    pub fn refresh_token_lifetime_secs(&self) -> i64 {
        self.config.refresh_token_lifetime.as_secs() as i64
    }
}

/// Hash a token for database storage (using SHA-256)
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(token.as_bytes());
    hex::encode(hash)
}
