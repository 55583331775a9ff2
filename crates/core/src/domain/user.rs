use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Row of the `users` table without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Trimmed, validated copy ready for insertion.
    pub fn validated(self) -> anyhow::Result<Self> {
        let username = self.username.trim().to_string();
        anyhow::ensure!(
            (3..=80).contains(&username.len()),
            "username must be 3..=80 characters"
        );

        let email = self.email.trim().to_ascii_lowercase();
        anyhow::ensure!(email.len() <= 120, "email must be at most 120 characters");
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        anyhow::ensure!(valid_email, "email is not valid: {email}");

        anyhow::ensure!(
            self.password.len() >= 8,
            "password must be at least 8 characters"
        );

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

const SALT_LEN: usize = 16;

/// `hex(salt)$hex(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    hash_with_salt(&salt, password)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, _)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hash_with_salt(&salt, password) == stored
}

fn hash_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${}", hex::encode(salt), hex::encode(hasher.finalize()))
}
