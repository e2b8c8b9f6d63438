use std::collections::HashMap;
use std::path::Path;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use common_auth::RoleDirectory;
use rand_core::OsRng;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read user file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse user file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate username '{0}'")]
    DuplicateUser(String),
    #[error("user '{0}' has an invalid password hash")]
    InvalidHash(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_activated")]
    pub activated: bool,
}

fn default_activated() -> bool {
    true
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginCheck {
    Accepted,
    UnknownUser,
    WrongPassword,
    NotActivated,
}

/// Read-only user store loaded once at startup.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    pub fn from_records<I>(records: I) -> Result<Self, DirectoryError>
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let mut users = HashMap::new();
        for record in records {
            if PasswordHash::new(&record.password_hash).is_err() {
                return Err(DirectoryError::InvalidHash(record.username));
            }
            if users.contains_key(&record.username) {
                return Err(DirectoryError::DuplicateUser(record.username));
            }
            users.insert(record.username.clone(), record);
        }
        Ok(Self { users })
    }

    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        let records: Vec<UserRecord> = serde_json::from_str(raw)?;
        Self::from_records(records)
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Password is checked before activation so a wrong password never reveals account state.
    pub fn check_login(&self, username: &str, password: &str) -> LoginCheck {
        let Some(user) = self.users.get(username) else {
            return LoginCheck::UnknownUser;
        };

        let password_valid = match PasswordHash::new(&user.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        };

        if !password_valid {
            LoginCheck::WrongPassword
        } else if !user.activated {
            LoginCheck::NotActivated
        } else {
            LoginCheck::Accepted
        }
    }
}

#[async_trait]
impl RoleDirectory for UserDirectory {
    async fn roles_for(&self, subject: &str) -> Option<Vec<String>> {
        self.users.get(subject).map(|user| user.roles.clone())
    }
}

pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| DirectoryError::Hash(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, password: &str, activated: bool) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password_hash: hash_password(password).expect("hash"),
            roles: vec!["editor".to_string()],
            activated,
        }
    }

    #[test]
    fn check_login_outcomes() {
        let directory = UserDirectory::from_records([
            record("alice", "correct horse", true),
            record("dormant", "battery staple", false),
        ])
        .expect("directory");

        assert_eq!(directory.check_login("alice", "correct horse"), LoginCheck::Accepted);
        assert_eq!(directory.check_login("alice", "wrong"), LoginCheck::WrongPassword);
        assert_eq!(directory.check_login("nobody", "x"), LoginCheck::UnknownUser);
        assert_eq!(
            directory.check_login("dormant", "battery staple"),
            LoginCheck::NotActivated
        );
        assert_eq!(directory.check_login("dormant", "nope"), LoginCheck::WrongPassword);
    }

    #[test]
    fn rejects_duplicates_and_bad_hashes() {
        let err = UserDirectory::from_records([
            record("alice", "pw", true),
            record("alice", "pw2", true),
        ])
        .expect_err("duplicate");
        assert!(matches!(err, DirectoryError::DuplicateUser(name) if name == "alice"));

        let err = UserDirectory::from_json(
            r#"[{"username": "bob", "password_hash": "plaintext"}]"#,
        )
        .expect_err("bad hash");
        assert!(matches!(err, DirectoryError::InvalidHash(name) if name == "bob"));
    }

    #[test]
    fn json_defaults_roles_and_activation() {
        let hash = hash_password("pw").expect("hash");
        let raw = format!(r#"[{{"username": "carol", "password_hash": "{hash}"}}]"#);
        let directory = UserDirectory::from_json(&raw).expect("directory");
        let carol = directory.get("carol").expect("carol");
        assert!(carol.activated);
        assert!(carol.roles.is_empty());
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn roles_come_from_the_directory() {
        let directory = UserDirectory::from_records([record("alice", "pw", true)])
            .expect("directory");
        assert_eq!(
            directory.roles_for("alice").await,
            Some(vec!["editor".to_string()])
        );
        assert_eq!(directory.roles_for("ghost").await, None);
    }
}
