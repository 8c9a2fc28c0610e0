//! Driver over a flat object store (S3/minio style key space).
//!
//! Directories are emulated with key prefixes. A directory `/a/b` exists when
//! a zero-length marker object `a/b/` exists, or when any key starts with
//! `a/b/`. `make_dir` always writes the marker so empty directories survive.
//!
//! Object stores have no rename and no append, so `rename` is copy-then-delete
//! (copies are rolled back when the delete fails) and resuming an upload
//! writes a temporary object and composes `[original, temporary]` into the
//! target. The compose step is not atomic against another session writing the
//! same key at the same time: the last compose wins and may drop the other
//! writer's bytes. Temporary objects live under `.plugftpd-upload/`, which
//! clients can neither see nor touch.

use crate::context::Context;
use crate::core_driver::{
    base_name, Driver, DriverError, DriverFactory, FileInfo, FileReader, Result, Visitor,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Minimal set of primitives the driver needs from an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn stat_object(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// Every object whose key starts with `prefix`, sorted by key.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()>;

    async fn copy_object(&self, src: &str, dst: &str) -> Result<()>;

    /// Concatenates `sources` in order into `dst`.
    async fn compose_object(&self, dst: &str, sources: &[String]) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove_object(&self, key: &str) -> Result<()>;
}

/// Key prefix of in-flight resume parts.
const UPLOAD_PREFIX: &str = ".plugftpd-upload/";

fn object_key(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

fn is_reserved(path: &str) -> bool {
    let key = object_key(path);
    key.starts_with(UPLOAD_PREFIX) || key == UPLOAD_PREFIX.trim_end_matches('/')
}

/// Reserved paths do not exist as far as clients can tell.
fn visible(path: &str) -> Result<()> {
    if is_reserved(path) {
        return Err(DriverError::NotFound(path.to_string()));
    }
    Ok(())
}

fn writable(path: &str) -> Result<()> {
    if is_reserved(path) {
        return Err(DriverError::PermissionDenied(format!("{} is reserved", path)));
    }
    Ok(())
}

fn dir_prefix(path: &str) -> String {
    let key = object_key(path);
    if key.is_empty() {
        key
    } else {
        format!("{}/", key.trim_end_matches('/'))
    }
}

fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

pub struct ObjectDriver<S: ObjectStore> {
    store: Arc<S>,
}

impl<S: ObjectStore> ObjectDriver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the file object stored under `path`, ignoring directory markers.
    async fn file_object(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let key = object_key(path);
        if key.is_empty() || key.ends_with('/') {
            return Ok(None);
        }
        self.store.stat_object(&key).await
    }

    async fn dir_exists(&self, path: &str) -> Result<bool> {
        if path == "/" {
            return Ok(true);
        }
        let prefix = dir_prefix(path);
        if self.store.stat_object(&prefix).await?.is_some() {
            return Ok(true);
        }
        Ok(!self.store.list_objects(&prefix).await?.is_empty())
    }

    async fn ensure_parent_dir(&self, path: &str) -> Result<()> {
        let parent = parent_path(path);
        if self.dir_exists(parent).await? {
            Ok(())
        } else {
            Err(DriverError::NotFound(parent.to_string()))
        }
    }

    async fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let src = object_key(from);
        let dst = object_key(to);
        self.store.copy_object(&src, &dst).await?;
        if let Err(e) = self.store.remove_object(&src).await {
            if let Err(rollback) = self.store.remove_object(&dst).await {
                error!("Failed to roll back copy {} after rename error: {}", dst, rollback);
            }
            return Err(DriverError::Partial(format!(
                "copied {} to {} but could not remove the source: {}",
                from, to, e
            )));
        }
        Ok(())
    }

    async fn rename_dir(&self, from: &str, to: &str) -> Result<()> {
        let src_prefix = dir_prefix(from);
        let dst_prefix = dir_prefix(to);
        if dst_prefix.starts_with(&src_prefix) {
            return Err(DriverError::PermissionDenied(format!(
                "cannot move {} into itself",
                from
            )));
        }

        let objects = self.store.list_objects(&src_prefix).await?;
        let mut moves = Vec::with_capacity(objects.len());
        for object in objects {
            let target = format!("{}{}", dst_prefix, &object.key[src_prefix.len()..]);
            moves.push((object.key, target));
        }

        for (idx, (src, dst)) in moves.iter().enumerate() {
            if let Err(e) = self.store.copy_object(src, dst).await {
                for (_, copied) in &moves[..idx] {
                    if let Err(rollback) = self.store.remove_object(copied).await {
                        error!("Failed to roll back copy {}: {}", copied, rollback);
                    }
                }
                return Err(e);
            }
        }

        for (idx, (src, _)) in moves.iter().enumerate() {
            if let Err(e) = self.store.remove_object(src).await {
                // Put back what was already removed, then drop the copies.
                for (restored, copy) in &moves[..idx] {
                    if let Err(rollback) = self.store.copy_object(copy, restored).await {
                        error!("Failed to restore {} from {}: {}", restored, copy, rollback);
                    }
                }
                for (_, copy) in &moves {
                    if let Err(rollback) = self.store.remove_object(copy).await {
                        error!("Failed to roll back copy {}: {}", copy, rollback);
                    }
                }
                return Err(DriverError::Partial(format!(
                    "could not move {} to {}: {}",
                    from, to, e
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ObjectStore> Driver for ObjectDriver<S> {
    async fn stat(&self, _ctx: &Context, path: &str) -> Result<FileInfo> {
        visible(path)?;
        if path == "/" {
            return Ok(FileInfo::dir("/", Utc::now()));
        }
        if let Some(meta) = self.file_object(path).await? {
            return Ok(FileInfo::file(base_name(path), meta.size, meta.last_modified));
        }
        if let Some(marker) = self.store.stat_object(&dir_prefix(path)).await? {
            return Ok(FileInfo::dir(base_name(path), marker.last_modified));
        }
        if self.dir_exists(path).await? {
            return Ok(FileInfo::dir(base_name(path), Utc::now()));
        }
        Err(DriverError::NotFound(path.to_string()))
    }

    async fn list_dir(&self, _ctx: &Context, path: &str, visit: &mut Visitor<'_>) -> Result<()> {
        visible(path)?;
        if !self.dir_exists(path).await? {
            return match self.file_object(path).await? {
                Some(_) => Err(DriverError::NotADirectory(path.to_string())),
                None => Err(DriverError::NotFound(path.to_string())),
            };
        }

        let prefix = dir_prefix(path);
        let mut seen_dirs = BTreeSet::new();
        for object in self.store.list_objects(&prefix).await? {
            let rest = &object.key[prefix.len()..];
            if rest.is_empty() || object.key.starts_with(UPLOAD_PREFIX) {
                continue;
            }
            match rest.split_once('/') {
                Some((child, _)) => {
                    if seen_dirs.insert(child.to_string()) {
                        visit(FileInfo::dir(child, object.last_modified))?;
                    }
                }
                None => visit(FileInfo::file(rest, object.size, object.last_modified))?,
            }
        }
        Ok(())
    }

    async fn delete_file(&self, _ctx: &Context, path: &str) -> Result<()> {
        visible(path)?;
        if self.file_object(path).await?.is_none() {
            return if self.dir_exists(path).await? {
                Err(DriverError::IsADirectory(path.to_string()))
            } else {
                Err(DriverError::NotFound(path.to_string()))
            };
        }
        self.store.remove_object(&object_key(path)).await
    }

    async fn delete_dir(&self, _ctx: &Context, path: &str) -> Result<()> {
        visible(path)?;
        if path == "/" {
            return Err(DriverError::PermissionDenied(
                "the root directory cannot be removed".to_string(),
            ));
        }
        if !self.dir_exists(path).await? {
            return match self.file_object(path).await? {
                Some(_) => Err(DriverError::NotADirectory(path.to_string())),
                None => Err(DriverError::NotFound(path.to_string())),
            };
        }

        let objects = self.store.list_objects(&dir_prefix(path)).await?;
        let total = objects.len();
        for (removed, object) in objects.iter().enumerate() {
            if let Err(e) = self.store.remove_object(&object.key).await {
                return Err(DriverError::Partial(format!(
                    "removed {} of {} objects under {}: {}",
                    removed, total, path, e
                )));
            }
        }
        debug!("Removed {} objects under {}", total, path);
        Ok(())
    }

    async fn rename(&self, _ctx: &Context, from: &str, to: &str) -> Result<()> {
        if from == "/" || to == "/" {
            return Err(DriverError::PermissionDenied(
                "the root directory cannot be renamed".to_string(),
            ));
        }
        visible(from)?;
        writable(to)?;
        if self.file_object(to).await?.is_some() || self.dir_exists(to).await? {
            return Err(DriverError::AlreadyExists(to.to_string()));
        }
        self.ensure_parent_dir(to).await?;

        if self.file_object(from).await?.is_some() {
            self.rename_file(from, to).await
        } else if self.dir_exists(from).await? {
            self.rename_dir(from, to).await
        } else {
            Err(DriverError::NotFound(from.to_string()))
        }
    }

    async fn make_dir(&self, _ctx: &Context, path: &str) -> Result<()> {
        writable(path)?;
        if self.file_object(path).await?.is_some() || self.dir_exists(path).await? {
            return Err(DriverError::AlreadyExists(path.to_string()));
        }
        self.ensure_parent_dir(path).await?;
        self.store.put_object(&dir_prefix(path), Vec::new()).await
    }

    async fn get_file(&self, _ctx: &Context, path: &str, offset: u64) -> Result<(u64, FileReader)> {
        visible(path)?;
        let meta = match self.file_object(path).await? {
            Some(meta) => meta,
            None => {
                return if self.dir_exists(path).await? {
                    Err(DriverError::IsADirectory(path.to_string()))
                } else {
                    Err(DriverError::NotFound(path.to_string()))
                };
            }
        };
        if offset > 0 && offset >= meta.size {
            return Err(DriverError::InvalidOffset {
                path: path.to_string(),
                offset,
                size: meta.size,
            });
        }

        let mut data = self.store.get_object(&meta.key).await?;
        // another session may have shrunk the object since the stat
        if offset > 0 && offset >= data.len() as u64 {
            return Err(DriverError::InvalidOffset {
                path: path.to_string(),
                offset,
                size: data.len() as u64,
            });
        }
        data.drain(..offset as usize);
        Ok((data.len() as u64, Box::new(Cursor::new(data))))
    }

    async fn put_file(
        &self,
        ctx: &Context,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: Option<u64>,
    ) -> Result<u64> {
        writable(path)?;
        if self.dir_exists(path).await? {
            return Err(DriverError::IsADirectory(path.to_string()));
        }
        self.ensure_parent_dir(path).await?;

        // checked before any byte is read so a bad REST fails fast
        let resume = match offset {
            None | Some(0) => false,
            Some(offset) => {
                let existing = self
                    .file_object(path)
                    .await?
                    .ok_or_else(|| DriverError::NotFound(path.to_string()))?;
                if offset != existing.size {
                    return Err(DriverError::Unsupported(format!(
                        "resuming {} at {} requires the offset to equal its size {}",
                        path, offset, existing.size
                    )));
                }
                true
            }
        };

        let key = object_key(path);
        let mut buf = Vec::new();
        data.read_to_end(&mut buf).await?;
        let written = buf.len() as u64;
        if !resume {
            self.store.put_object(&key, buf).await?;
            return Ok(written);
        }

        let temp = format!("{}{}/{}", UPLOAD_PREFIX, ctx.session_id, key);
        self.store.put_object(&temp, buf).await?;
        let composed = self
            .store
            .compose_object(&key, &[key.clone(), temp.clone()])
            .await;
        if let Err(e) = self.store.remove_object(&temp).await {
            warn!("Failed to remove temporary upload object {}: {}", temp, e);
        }
        composed?;
        Ok(written)
    }
}

/// Hands every session its own [`ObjectDriver`] over one shared store.
pub struct ObjectDriverFactory<S: ObjectStore> {
    store: Arc<S>,
}

impl<S: ObjectStore> ObjectDriverFactory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: ObjectStore + 'static> DriverFactory for ObjectDriverFactory<S> {
    fn new_driver(&self, _ctx: &Context) -> Result<Box<dyn Driver>> {
        Ok(Box::new(ObjectDriver::new(Arc::clone(&self.store))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_driver::memory::MemoryStore;
    use std::net::SocketAddr;

    fn ctx() -> Context {
        Context::new(7, SocketAddr::from(([127, 0, 0, 1], 2121)))
    }

    /// Store whose removals of one specific key always fail.
    struct StickyStore {
        inner: MemoryStore,
        sticky_key: String,
    }

    #[async_trait]
    impl ObjectStore for StickyStore {
        async fn stat_object(&self, key: &str) -> Result<Option<ObjectMeta>> {
            self.inner.stat_object(key).await
        }
        async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
            self.inner.list_objects(prefix).await
        }
        async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
            self.inner.get_object(key).await
        }
        async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
            self.inner.put_object(key, data).await
        }
        async fn copy_object(&self, src: &str, dst: &str) -> Result<()> {
            self.inner.copy_object(src, dst).await
        }
        async fn compose_object(&self, dst: &str, sources: &[String]) -> Result<()> {
            self.inner.compose_object(dst, sources).await
        }
        async fn remove_object(&self, key: &str) -> Result<()> {
            if key == self.sticky_key {
                return Err(DriverError::Unavailable("remove refused".into()));
            }
            self.inner.remove_object(key).await
        }
    }

    /// Store whose reads return fewer bytes than `stat_object` reports, as if
    /// another writer shrank the object in between.
    struct ShrinkingStore {
        inner: MemoryStore,
        keep: usize,
    }

    #[async_trait]
    impl ObjectStore for ShrinkingStore {
        async fn stat_object(&self, key: &str) -> Result<Option<ObjectMeta>> {
            self.inner.stat_object(key).await
        }
        async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
            self.inner.list_objects(prefix).await
        }
        async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
            let mut data = self.inner.get_object(key).await?;
            data.truncate(self.keep);
            Ok(data)
        }
        async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
            self.inner.put_object(key, data).await
        }
        async fn copy_object(&self, src: &str, dst: &str) -> Result<()> {
            self.inner.copy_object(src, dst).await
        }
        async fn compose_object(&self, dst: &str, sources: &[String]) -> Result<()> {
            self.inner.compose_object(dst, sources).await
        }
        async fn remove_object(&self, key: &str) -> Result<()> {
            self.inner.remove_object(key).await
        }
    }

    async fn put<S: ObjectStore>(driver: &ObjectDriver<S>, path: &str, content: &[u8], offset: Option<u64>) -> Result<u64> {
        let mut reader: &[u8] = content;
        driver.put_file(&ctx(), path, &mut reader, offset).await
    }

    async fn read_all<S: ObjectStore>(driver: &ObjectDriver<S>, path: &str, offset: u64) -> Result<Vec<u8>> {
        let (_, mut reader) = driver.get_file(&ctx(), path, offset).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn names<S: ObjectStore>(driver: &ObjectDriver<S>, path: &str) -> Vec<(String, bool)> {
        let mut entries = Vec::new();
        driver
            .list_dir(&ctx(), path, &mut |info| {
                entries.push((info.name, info.is_dir));
                Ok(())
            })
            .await
            .unwrap();
        entries
    }

    #[tokio::test]
    async fn test_directories_follow_marker_or_prefix() {
        let store = Arc::new(MemoryStore::new());
        let driver = ObjectDriver::new(Arc::clone(&store));

        driver.make_dir(&ctx(), "/empty").await.unwrap();
        assert!(driver.stat(&ctx(), "/empty").await.unwrap().is_dir);

        // Implicit directory: only a nested key, no marker.
        store.put_object("implicit/file.txt", b"x".to_vec()).await.unwrap();
        assert!(driver.stat(&ctx(), "/implicit").await.unwrap().is_dir);

        let listing = names(&driver, "/").await;
        assert_eq!(
            listing,
            vec![("empty".to_string(), true), ("implicit".to_string(), true)]
        );
        assert_eq!(names(&driver, "/implicit").await, vec![("file.txt".to_string(), false)]);
    }

    #[tokio::test]
    async fn test_make_dir_requires_parent_and_rejects_existing() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        assert!(driver.make_dir(&ctx(), "/a/b").await.unwrap_err().is_not_found());
        driver.make_dir(&ctx(), "/a").await.unwrap();
        driver.make_dir(&ctx(), "/a/b").await.unwrap();
        assert!(matches!(
            driver.make_dir(&ctx(), "/a").await,
            Err(DriverError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_get_file_offsets() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        put(&driver, "/x.txt", b"test", None).await.unwrap();
        assert_eq!(read_all(&driver, "/x.txt", 0).await.unwrap(), b"test");
        assert_eq!(read_all(&driver, "/x.txt", 2).await.unwrap(), b"st");
        assert!(matches!(
            read_all(&driver, "/x.txt", 4).await,
            Err(DriverError::InvalidOffset { .. })
        ));
    }

    #[tokio::test]
    async fn test_resume_requires_offset_equal_to_size() {
        let store = Arc::new(MemoryStore::new());
        let driver = ObjectDriver::new(Arc::clone(&store));
        put(&driver, "/log.txt", b"abc", None).await.unwrap();

        assert!(matches!(
            put(&driver, "/log.txt", b"zz", Some(1)).await,
            Err(DriverError::Unsupported(_))
        ));

        assert_eq!(put(&driver, "/log.txt", b"def", Some(3)).await.unwrap(), 3);
        assert_eq!(read_all(&driver, "/log.txt", 0).await.unwrap(), b"abcdef");

        // The temporary part object is gone.
        let keys: Vec<String> = store
            .list_objects("")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.key)
            .collect();
        assert_eq!(keys, vec!["log.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_dir_removes_descendants() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        driver.make_dir(&ctx(), "/src").await.unwrap();
        driver.make_dir(&ctx(), "/src/deep").await.unwrap();
        put(&driver, "/src/deep/a.rs", b"fn main() {}", None).await.unwrap();
        put(&driver, "/src/b.rs", b"", None).await.unwrap();

        driver.delete_dir(&ctx(), "/src").await.unwrap();
        for path in ["/src", "/src/deep", "/src/deep/a.rs", "/src/b.rs"] {
            assert!(driver.stat(&ctx(), path).await.unwrap_err().is_not_found(), "{}", path);
        }
    }

    #[tokio::test]
    async fn test_rename_moves_files_and_directories() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        put(&driver, "/a.txt", b"hello", None).await.unwrap();
        driver.rename(&ctx(), "/a.txt", "/b.txt").await.unwrap();
        assert!(driver.stat(&ctx(), "/a.txt").await.is_err());
        assert_eq!(read_all(&driver, "/b.txt", 0).await.unwrap(), b"hello");

        driver.make_dir(&ctx(), "/dir").await.unwrap();
        put(&driver, "/dir/inner.txt", b"i", None).await.unwrap();
        driver.rename(&ctx(), "/dir", "/moved").await.unwrap();
        assert!(driver.stat(&ctx(), "/dir").await.is_err());
        assert!(driver.stat(&ctx(), "/moved").await.unwrap().is_dir);
        assert_eq!(read_all(&driver, "/moved/inner.txt", 0).await.unwrap(), b"i");
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_source_and_drops_copy() {
        let store = Arc::new(StickyStore {
            inner: MemoryStore::new(),
            sticky_key: "keep.txt".to_string(),
        });
        let driver = ObjectDriver::new(store);
        put(&driver, "/keep.txt", b"data", None).await.unwrap();

        let err = driver.rename(&ctx(), "/keep.txt", "/gone.txt").await.unwrap_err();
        assert!(matches!(err, DriverError::Partial(_)));
        assert!(driver.stat(&ctx(), "/keep.txt").await.is_ok());
        assert!(driver.stat(&ctx(), "/gone.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failed_dir_rename_restores_source() {
        let store = Arc::new(StickyStore {
            inner: MemoryStore::new(),
            sticky_key: "tree/z.txt".to_string(),
        });
        let driver = ObjectDriver::new(store);
        driver.make_dir(&ctx(), "/tree").await.unwrap();
        put(&driver, "/tree/a.txt", b"a", None).await.unwrap();
        put(&driver, "/tree/z.txt", b"z", None).await.unwrap();

        assert!(driver.rename(&ctx(), "/tree", "/forest").await.is_err());
        assert_eq!(read_all(&driver, "/tree/a.txt", 0).await.unwrap(), b"a");
        assert_eq!(read_all(&driver, "/tree/z.txt", 0).await.unwrap(), b"z");
        assert!(driver.stat(&ctx(), "/forest").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_file_on_directory_is_rejected() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        driver.make_dir(&ctx(), "/d").await.unwrap();
        assert!(matches!(
            driver.delete_file(&ctx(), "/d").await,
            Err(DriverError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_offset_past_shrunk_object_is_an_error() {
        let driver = ObjectDriver::new(Arc::new(ShrinkingStore {
            inner: MemoryStore::new(),
            keep: 2,
        }));
        put(&driver, "/n.txt", b"0123456789", None).await.unwrap();
        assert!(matches!(
            read_all(&driver, "/n.txt", 8).await,
            Err(DriverError::InvalidOffset { size: 2, .. })
        ));
        assert_eq!(read_all(&driver, "/n.txt", 1).await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_bad_resume_fails_before_reading_upload() {
        let driver = ObjectDriver::new(Arc::new(MemoryStore::new()));
        put(&driver, "/log.txt", b"abc", None).await.unwrap();

        let mut upload: &[u8] = b"pending";
        let err = driver
            .put_file(&ctx(), "/log.txt", &mut upload, Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Unsupported(_)));
        assert_eq!(upload, b"pending");

        let mut upload: &[u8] = b"pending";
        let err = driver
            .put_file(&ctx(), "/absent.txt", &mut upload, Some(3))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(upload, b"pending");
    }

    #[tokio::test]
    async fn test_resume_parts_stay_out_of_user_namespace() {
        let store = Arc::new(MemoryStore::new());
        let driver = ObjectDriver::new(Arc::clone(&store));
        put(&driver, "/a.txt", b"ab", None).await.unwrap();
        put(&driver, "/a.txt.7.upload", b"mine", None).await.unwrap();
        store
            .put_object(".plugftpd-upload/9/a.txt", b"part".to_vec())
            .await
            .unwrap();

        put(&driver, "/a.txt", b"cd", Some(2)).await.unwrap();
        assert_eq!(read_all(&driver, "/a.txt", 0).await.unwrap(), b"abcd");
        assert_eq!(read_all(&driver, "/a.txt.7.upload", 0).await.unwrap(), b"mine");

        assert_eq!(
            names(&driver, "/").await,
            vec![("a.txt".to_string(), false), ("a.txt.7.upload".to_string(), false)]
        );
        assert!(driver.stat(&ctx(), "/.plugftpd-upload").await.unwrap_err().is_not_found());
        assert!(driver.list_dir(&ctx(), "/.plugftpd-upload/9", &mut |_| Ok(())).await.is_err());
        assert!(matches!(
            put(&driver, "/.plugftpd-upload/9/a.txt", b"x", None).await,
            Err(DriverError::PermissionDenied(_))
        ));
        assert!(matches!(
            driver.make_dir(&ctx(), "/.plugftpd-upload").await,
            Err(DriverError::PermissionDenied(_))
        ));
    }
}
