// Password hashing using Argon2id
// Decision: Use Argon2id as it's the recommended algorithm for password hashing
// Decision: Work factor is tunable through argon2::Params; verification reads
// the parameters back from the PHC string so old hashes keep verifying
// Decision: Hashing runs on the blocking pool so request tasks stay responsive

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Hash a password using Argon2id with default parameters
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_params(password, Params::default())
}

/// Hash a password using Argon2id with explicit cost parameters
pub fn hash_password_with_params(password: &str, params: Params) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Verify a password against a hash.
///
/// A malformed hash never matches; it is logged and reported as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// `hash_password` on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

/// `verify_password` on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("Password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> Params {
        Params::new(1024, 1, 1, None).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let password = "Abcd1234";
        let hash = hash_password(password).unwrap();

        // Stored value never equals the plaintext
        assert_ne!(hash, password);

        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_different_hashes() {
        let password = "same-password";
        let hash1 = hash_password_with_params(password, cheap_params()).unwrap();
        let hash2 = hash_password_with_params(password, cheap_params()).unwrap();

        // Same password should produce different hashes (different salts)
        assert_ne!(hash1, hash2);

        assert!(verify_password(password, &hash1));
        assert!(verify_password(password, &hash2));
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_password_with_params("test", cheap_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024,t=1,p=1"));
    }

    #[test]
    fn test_malformed_hash_returns_false() {
        assert!(!verify_password("Abcd1234", "not-a-phc-string"));
        assert!(!verify_password("Abcd1234", ""));
        assert!(!verify_password("Abcd1234", "$argon2id$v=19$garbage"));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("Abcd1234".to_string()).await.unwrap();
        assert!(verify_password_blocking("Abcd1234".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("Zzzz9999".to_string(), hash)
            .await
            .unwrap());
    }
}
