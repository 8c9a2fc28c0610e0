use crate::context::Context;
use crate::core_auth::error::AuthError;
use crate::core_auth::helper::{load_passwd_file, verify_password};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Verify-credentials contract used by `PASS`.
///
/// `Ok(false)` is a wrong user or password; `Err` means the backend could not
/// decide. Both end the login attempt with `530`.
#[async_trait]
pub trait Auth: Send + Sync {
    async fn check_passwd(&self, ctx: &Context, user: &str, pass: &str) -> Result<bool, AuthError>;
}

/// One fixed account.
#[derive(Debug, Clone)]
pub struct SimpleAuth {
    name: String,
    password: String,
}

impl SimpleAuth {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl Auth for SimpleAuth {
    async fn check_passwd(&self, _ctx: &Context, user: &str, pass: &str) -> Result<bool, AuthError> {
        Ok(user == self.name && pass == self.password)
    }
}

#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let (username, hashed_password) = line.split_once(':')?;
        if username.is_empty() || hashed_password.is_empty() || hashed_password.contains(':') {
            return None;
        }
        Some(PasswdEntry {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        })
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}

/// Accounts from a bcrypt passwd file, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct PasswdAuth {
    entries: HashMap<String, PasswdEntry>,
}

impl PasswdAuth {
    pub async fn load(path: &Path) -> Result<Self, AuthError> {
        Ok(Self {
            entries: load_passwd_file(path).await?,
        })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = PasswdEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.get_username().to_string(), entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Auth for PasswdAuth {
    async fn check_passwd(&self, _ctx: &Context, user: &str, pass: &str) -> Result<bool, AuthError> {
        let Some(entry) = self.entries.get(user) else {
            return Ok(false);
        };
        // bcrypt verification is CPU bound.
        let user = user.to_string();
        let pass = pass.to_string();
        let hashed = entry.get_hashed_password().to_string();
        tokio::task::spawn_blocking(move || verify_password(&user, &pass, &hashed))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
    }
}
