//! Storage abstraction used by the session engine.
//!
//! Paths handed to a [`Driver`] are always absolute, `/`-rooted and already
//! normalized by the session (no `.` or `..` components, no trailing slash
//! except for the root itself).

pub mod error;
pub mod file;
pub mod memory;
pub mod object;

use crate::context::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

pub use error::DriverError;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Readable stream returned by [`Driver::get_file`].
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Callback invoked by [`Driver::list_dir`] once per child entry.
pub type Visitor<'a> = dyn FnMut(FileInfo) -> Result<()> + Send + 'a;

/// Metadata snapshot of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
    pub owner: String,
    pub group: String,
    /// Unix permission bits (`0o755` style), without the file type.
    pub mode: u32,
}

impl FileInfo {
    pub fn file(name: impl Into<String>, size: u64, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            mod_time,
            is_dir: false,
            owner: String::new(),
            group: String::new(),
            mode: 0o644,
        }
    }

    pub fn dir(name: impl Into<String>, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mod_time,
            is_dir: true,
            owner: String::new(),
            group: String::new(),
            mode: 0o755,
        }
    }

    pub fn with_mode(self, mode: u32) -> Self {
        Self { mode, ..self }
    }

    pub fn with_ownership(self, mode: u32, owner: String, group: String) -> Self {
        Self {
            mode,
            owner,
            group,
            ..self
        }
    }
}

/// Storage backend for one authenticated session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Metadata for `path`. The root `/` always exists and is a directory.
    async fn stat(&self, ctx: &Context, path: &str) -> Result<FileInfo>;

    /// Calls `visit` once per immediate child of `path`. Stops at the first
    /// error, whether it comes from enumeration or from `visit`.
    async fn list_dir(&self, ctx: &Context, path: &str, visit: &mut Visitor<'_>) -> Result<()>;

    /// Removes a single file. Directories are rejected.
    async fn delete_file(&self, ctx: &Context, path: &str) -> Result<()>;

    /// Removes a directory and everything below it. A failure part-way
    /// through is reported as one error.
    async fn delete_dir(&self, ctx: &Context, path: &str) -> Result<()>;

    /// Either moves `from` to `to` completely, or leaves `from` in place and
    /// `to` absent.
    async fn rename(&self, ctx: &Context, from: &str, to: &str) -> Result<()>;

    /// Creates a directory. Fails with [`DriverError::AlreadyExists`] if
    /// anything already exists at `path`.
    async fn make_dir(&self, ctx: &Context, path: &str) -> Result<()>;

    /// Returns the number of bytes left after `offset` and a reader
    /// positioned there. An offset at or past the end of a non-empty object
    /// is an error.
    async fn get_file(&self, ctx: &Context, path: &str, offset: u64) -> Result<(u64, FileReader)>;

    /// Writes `data` to `path`. `None` creates or truncates; `Some(n)`
    /// resumes at byte `n` when the backend can, otherwise fails with
    /// [`DriverError::Unsupported`]. Returns the number of bytes written.
    async fn put_file(
        &self,
        ctx: &Context,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: Option<u64>,
    ) -> Result<u64>;
}

/// Builds one driver per authenticated session.
pub trait DriverFactory: Send + Sync {
    fn new_driver(&self, ctx: &Context) -> Result<Box<dyn Driver>>;
}

/// Last path component, or `/` for the root.
pub fn base_name(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit('/').next() {
        Some("") | None => "/",
        Some(name) => name,
    }
}
