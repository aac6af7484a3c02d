//! Configured dashboard users.
//!
//! Users come from `AUTH_USERS` at startup (`name:password[:role]`, comma
//! separated). Plain passwords are hashed with bcrypt on load; entries that
//! already hold a bcrypt hash are kept as-is.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::AuthError;
use crate::config::Secret;
use crate::error::ConfigError;

/// Longest accepted username.
const MAX_USERNAME_LEN: usize = 50;

/// Roles a user entry may carry.
const ROLES: [&str; 2] = ["admin", "user"];

/// One `AUTH_USERS` entry before hashing.
#[derive(Debug, Clone)]
pub struct UserSeed {
    /// Login name.
    pub username: String,
    /// Plain password or an existing bcrypt hash.
    pub password: Secret,
    /// `admin` or `user`.
    pub role: String,
}

impl UserSeed {
    /// Builds a seed from its parts.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
            role: role.into(),
        }
    }

    /// Parses a comma-separated `name:password[:role]` list.
    ///
    /// The role suffix is only recognized for `admin` and `user`, so a
    /// password may itself contain `:`. The role defaults to `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserEntry`] for an entry without a password, a
    /// blank or over-long username, or a repeated username.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ConfigError> {
        let mut seeds: Vec<Self> = Vec::new();
        for (index, entry) in raw.split(',').map(str::trim).enumerate() {
            if entry.is_empty() {
                continue;
            }
            let reject = |reason: &str| ConfigError::UserEntry {
                index,
                reason: reason.to_string(),
            };

            let (username, rest) = entry
                .split_once(':')
                .ok_or_else(|| reject("missing password"))?;
            let username = username.trim();
            if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
                return Err(reject("username must be 1 to 50 characters"));
            }
            let (password, role) = match rest.rsplit_once(':') {
                Some((password, role)) if ROLES.contains(&role) => (password, role),
                _ => (rest, "user"),
            };
            if password.is_empty() {
                return Err(reject("missing password"));
            }
            if seeds.iter().any(|s| s.username == username) {
                return Err(reject("duplicate username"));
            }
            seeds.push(Self::new(username, password, role));
        }
        Ok(seeds)
    }
}

/// A dashboard user.
#[derive(Clone)]
pub struct User {
    /// Stable id, carried as the token subject.
    pub id: u32,
    /// Login name.
    pub username: String,
    /// `admin` or `user`.
    pub role: String,
    /// Inactive users cannot log in and their tokens are refused.
    pub is_active: bool,
    /// Time of the last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Time the user was loaded.
    pub created_at: DateTime<Utc>,
    /// Time of the last change to this record.
    pub updated_at: DateTime<Utc>,
    password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// In-memory user table.
#[derive(Debug)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    /// Hashes `seeds` with bcrypt at `cost` and assigns ids from 1.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hash`] if bcrypt rejects the cost or a password.
    pub fn from_seeds(seeds: &[UserSeed], cost: u32) -> Result<Self, AuthError> {
        let now = Utc::now();
        let mut users = Vec::with_capacity(seeds.len());
        for (id, seed) in (1..).zip(seeds) {
            let plain = seed.password.expose();
            let password_hash = if is_bcrypt_hash(plain) {
                plain.to_string()
            } else {
                bcrypt::hash(plain, cost).map_err(|e| AuthError::Hash(e.to_string()))?
            };
            users.push(User {
                id,
                username: seed.username.clone(),
                role: seed.role.clone(),
                is_active: true,
                last_login: None,
                created_at: now,
                updated_at: now,
                password_hash,
            });
        }
        Ok(Self {
            users: RwLock::new(users),
        })
    }

    /// Number of configured users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if no user is configured.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Looks a user up by id.
    pub async fn get(&self, id: u32) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    /// Enables or disables a user. Returns `false` for an unknown id.
    pub async fn set_active(&self, id: u32, active: bool) -> bool {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return false;
        };
        user.is_active = active;
        user.updated_at = Utc::now();
        true
    }

    /// Checks a username and password pair.
    ///
    /// bcrypt runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown user or a wrong
    /// password, [`AuthError::Inactive`] for a disabled account.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .unwrap_or(false);

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }

    /// Stamps a successful login and returns the updated record.
    pub async fn record_login(&self, id: u32, at: DateTime<Utc>) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.iter_mut().find(|u| u.id == id)?;
        user.last_login = Some(at);
        user.updated_at = at;
        Some(user.clone())
    }
}

/// bcrypt hashes are 60 characters of the form `$2b$<cost>$<salt+hash>`.
fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && ["$2a$", "$2b$", "$2y$"].iter().any(|p| value.starts_with(p))
}
