use thiserror::Error;

/// Failure of the credential backend itself, as opposed to a wrong password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read passwd file {path}: {source}")]
    PasswdFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid password hash for user {0}")]
    InvalidHash(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("credential check did not complete: {0}")]
    Backend(String),
}

impl AuthError {
    pub fn to_ftp_response(&self) -> &'static str {
        "530 Not logged in."
    }
}
