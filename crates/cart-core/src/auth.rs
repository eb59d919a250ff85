//! # Credential Store
//!
//! Contract for the account store the session logs in against, plus an
//! in-memory implementation keyed by username.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CredentialStore (trait)          │
//! │  ├── authenticate()                     │
//! │  └── register()                         │
//! └─────────────────────────────────────────┘
//!                     ▲
//!         ┌───────────┴───────────┐
//!  ┌──────┴─────────────────┐  ┌──┴──────────────┐
//!  │ InMemoryCredentialStore│  │ (external store)│
//!  └────────────────────────┘  └─────────────────┘
//! ```

use crate::error::{CartError, CartResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Longest accepted password
pub const MAX_PASSWORD_LEN: usize = 8;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{2,11}$").expect("Invalid regex"));

/// Account lookups used by login and signup
pub trait CredentialStore: Send + Sync {
    /// True when the username exists and the password matches
    fn authenticate(&self, username: &str, password: &str) -> bool;

    /// Create an account.
    ///
    /// # Errors
    /// `InvalidUsernameFormat`, `InvalidPasswordFormat` or `UsernameTaken`.
    fn register(&mut self, username: &str, password: &str) -> CartResult<()>;

    fn contains(&self, username: &str) -> bool;
}

/// Username: starts with a letter, then 2 to 11 letters, digits or underscores
pub fn validate_username(username: &str) -> CartResult<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(CartError::InvalidUsernameFormat);
    }
    Ok(())
}

/// Password: 1 to 8 characters
pub fn validate_password(password: &str) -> CartResult<()> {
    let len = password.chars().count();
    if len == 0 || len > MAX_PASSWORD_LEN {
        return Err(CartError::InvalidPasswordFormat {
            max_len: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// A seeded account, as read from `config/users.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
}

/// File layout of `config/users.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSeed {
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

impl UserSeed {
    /// Load seed accounts from TOML string
    pub fn from_toml(toml_str: &str) -> CartResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| CartError::Configuration(format!("invalid user seed: {}", e)))
    }
}

/// Username → password map held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    accounts: HashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Build a store from seed accounts. Seeds bypass the signup format
    /// rules so operators can provision any account.
    pub fn from_seed(seed: UserSeed) -> Self {
        let accounts = seed
            .users
            .into_iter()
            .map(|u| (u.username, u.password))
            .collect();
        Self { accounts }
    }

    /// The two demo accounts, used when no seed file is found
    pub fn demo() -> Self {
        Self::from_seed(UserSeed {
            users: vec![
                UserAccount {
                    username: "user".into(),
                    password: "user123".into(),
                },
                UserAccount {
                    username: "admin".into(),
                    password: "admin123".into(),
                },
            ],
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        self.accounts
            .get(username.trim())
            .is_some_and(|stored| stored == password.trim())
    }

    fn register(&mut self, username: &str, password: &str) -> CartResult<()> {
        let username = username.trim();
        let password = password.trim();

        validate_username(username)?;
        validate_password(password)?;

        if self.accounts.contains_key(username) {
            return Err(CartError::UsernameTaken {
                username: username.to_string(),
            });
        }

        self.accounts
            .insert(username.to_string(), password.to_string());
        Ok(())
    }

    fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username.trim())
    }
}
