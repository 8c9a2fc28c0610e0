use crate::core_auth::core_auth::PasswdEntry;
use crate::core_auth::error::AuthError;
use bcrypt::{hash, verify, DEFAULT_COST};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash(password, DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// A hash bcrypt cannot parse is reported as an error, not as a mismatch.
pub fn verify_password(user: &str, password: &str, hashed_password: &str) -> Result<bool, AuthError> {
    verify(password, hashed_password).map_err(|_| AuthError::InvalidHash(user.to_string()))
}

/// Reads `user:hash` lines. Blank lines and `#` comments are skipped; later
/// entries for the same user replace earlier ones.
pub async fn load_passwd_file(path: &Path) -> Result<HashMap<String, PasswdEntry>, AuthError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AuthError::PasswdFile {
            path: path.display().to_string(),
            source,
        })?;

    let mut passwd_map = HashMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match PasswdEntry::from_line(line) {
            Some(entry) => {
                passwd_map.insert(entry.get_username().to_string(), entry);
            }
            None => warn!("Ignoring malformed passwd line {} in {}", lineno + 1, path.display()),
        }
    }
    debug!("Loaded {} passwd entries from {}", passwd_map.len(), path.display());
    Ok(passwd_map)
}
