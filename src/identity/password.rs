//! Password hashing for the in-memory identity provider (Argon2id)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::DirectoryError;

/// Shortest password the providers accept
pub const MIN_PASSWORD_LEN: usize = 6;

/// Reject passwords the provider would refuse on sign-up
pub fn check_password_strength(password: &str) -> Result<(), DirectoryError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DirectoryError::WeakPassword(format!(
            "Password should be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// PHC-formatted Argon2id hash including salt and parameters
pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DirectoryError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, DirectoryError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| DirectoryError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("semper-fi-1775").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("semper-fi-1775", &hash).unwrap());
        assert!(!verify_password("semper-fi-1776", &hash).unwrap());
    }

    #[test]
    fn test_strength() {
        assert!(matches!(
            check_password_strength("12345"),
            Err(DirectoryError::WeakPassword(_))
        ));
        assert!(check_password_strength("123456").is_ok());
    }

    #[test]
    fn test_garbage_hash_is_error() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }
}
