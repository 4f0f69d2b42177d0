use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Argon2id PHC string with a fresh random salt. Runs on the blocking pool
/// so only the calling request waits.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))
    })
    .await
    .context("password hashing task")?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(plain: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| anyhow::anyhow!("stored hash: {e}"))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("password verification task")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("secret1".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_per_hash() {
        let a = hash_password("secret1".into()).await.unwrap();
        let b = hash_password("secret1".into()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unreadable_hash_is_an_error() {
        let err = verify_password("anything".into(), "not-a-phc-string".into())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stored hash"));
    }
}
