use crate::context::Context;
use crate::core_driver::{
    base_name, Driver, DriverError, DriverFactory, FileInfo, FileReader, Result, Visitor,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt};

/// Driver backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileDriver {
    root: PathBuf,
}

impl FileDriver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a normalized FTP path onto the local filesystem below the root.
    fn real_path(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

fn to_file_info(name: &str, metadata: &Metadata) -> FileInfo {
    let mod_time: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let info = if metadata.is_dir() {
        FileInfo::dir(name, mod_time)
    } else {
        FileInfo::file(name, metadata.len(), mod_time)
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        info.with_mode(metadata.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        info
    }
}

#[async_trait]
impl Driver for FileDriver {
    async fn stat(&self, _ctx: &Context, path: &str) -> Result<FileInfo> {
        let metadata = fs::metadata(self.real_path(path)).await?;
        Ok(to_file_info(base_name(path), &metadata))
    }

    async fn list_dir(&self, _ctx: &Context, path: &str, visit: &mut Visitor<'_>) -> Result<()> {
        let real = self.real_path(path);
        if !fs::metadata(&real).await?.is_dir() {
            return Err(DriverError::NotADirectory(path.to_string()));
        }

        let mut entries = fs::read_dir(&real).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            visit(to_file_info(&name, &metadata))?;
        }
        Ok(())
    }

    async fn delete_file(&self, _ctx: &Context, path: &str) -> Result<()> {
        let real = self.real_path(path);
        if fs::metadata(&real).await?.is_dir() {
            return Err(DriverError::IsADirectory(path.to_string()));
        }
        fs::remove_file(&real).await?;
        debug!("Removed file {:?}", real);
        Ok(())
    }

    async fn delete_dir(&self, _ctx: &Context, path: &str) -> Result<()> {
        if path == "/" {
            return Err(DriverError::PermissionDenied(
                "the root directory cannot be removed".to_string(),
            ));
        }
        let real = self.real_path(path);
        if !fs::metadata(&real).await?.is_dir() {
            return Err(DriverError::NotADirectory(path.to_string()));
        }
        fs::remove_dir_all(&real).await.map_err(|e| {
            DriverError::Partial(format!("failed to remove {}: {}", path, e))
        })?;
        info!("Removed directory tree {:?}", real);
        Ok(())
    }

    async fn rename(&self, _ctx: &Context, from: &str, to: &str) -> Result<()> {
        let source = self.real_path(from);
        let target = self.real_path(to);
        // Surface a not-found on the source rather than a generic rename error.
        fs::metadata(&source).await?;
        // fs::rename would replace an existing target
        if fs::symlink_metadata(&target).await.is_ok() {
            return Err(DriverError::AlreadyExists(to.to_string()));
        }
        fs::rename(&source, &target).await?;
        Ok(())
    }

    async fn make_dir(&self, _ctx: &Context, path: &str) -> Result<()> {
        fs::create_dir(self.real_path(path)).await?;
        Ok(())
    }

    async fn get_file(&self, _ctx: &Context, path: &str, offset: u64) -> Result<(u64, FileReader)> {
        let real = self.real_path(path);
        let mut file = File::open(&real).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(DriverError::IsADirectory(path.to_string()));
        }

        let size = metadata.len();
        if offset > 0 && offset >= size {
            return Err(DriverError::InvalidOffset {
                path: path.to_string(),
                offset,
                size,
            });
        }
        file.seek(SeekFrom::Start(offset)).await?;
        Ok((size - offset, Box::new(file)))
    }

    async fn put_file(
        &self,
        _ctx: &Context,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: Option<u64>,
    ) -> Result<u64> {
        let real = self.real_path(path);
        if let Ok(metadata) = fs::metadata(&real).await {
            if metadata.is_dir() {
                return Err(DriverError::IsADirectory(path.to_string()));
            }
        }

        let mut file = match offset {
            None => File::create(&real).await?,
            Some(offset) => {
                let mut file = OpenOptions::new()
                    .write(true)
                    .create(offset == 0)
                    .open(&real)
                    .await?;
                let size = file.metadata().await?.len();
                if offset > size {
                    return Err(DriverError::InvalidOffset {
                        path: path.to_string(),
                        offset,
                        size,
                    });
                }
                file.set_len(offset).await?;
                file.seek(SeekFrom::Start(offset)).await?;
                file
            }
        };

        let written = tokio::io::copy(data, &mut file).await?;
        file.flush().await?;
        debug!("Wrote {} bytes to {:?}", written, real);
        Ok(written)
    }
}

/// Hands every session a [`FileDriver`] over the same root directory.
#[derive(Debug, Clone)]
pub struct FileDriverFactory {
    root: PathBuf,
}

impl FileDriverFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DriverFactory for FileDriverFactory {
    fn new_driver(&self, ctx: &Context) -> Result<Box<dyn Driver>> {
        if !self.root.is_dir() {
            return Err(DriverError::Unavailable(format!(
                "root directory {:?} does not exist",
                self.root
            )));
        }
        debug!(
            "Creating file driver for session {} rooted at {:?}",
            ctx.session_id, self.root
        );
        Ok(Box::new(FileDriver::new(self.root.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::AsyncReadExt;

    fn ctx() -> Context {
        Context::new(1, SocketAddr::from(([127, 0, 0, 1], 2121)))
    }

    async fn put(driver: &FileDriver, path: &str, content: &[u8], offset: Option<u64>) -> Result<u64> {
        let mut reader: &[u8] = content;
        driver.put_file(&ctx(), path, &mut reader, offset).await
    }

    async fn read_from(driver: &FileDriver, path: &str, offset: u64) -> Result<Vec<u8>> {
        let (remaining, mut reader) = driver.get_file(&ctx(), path, offset).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        assert_eq!(remaining as usize, buf.len());
        Ok(buf)
    }

    #[tokio::test]
    async fn test_root_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        let info = driver.stat(&ctx(), "/").await.unwrap();
        assert!(info.is_dir);
        assert_eq!(info.name, "/");
    }

    #[tokio::test]
    async fn test_put_and_get_with_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());

        assert_eq!(put(&driver, "/x.txt", b"test", None).await.unwrap(), 4);
        assert_eq!(read_from(&driver, "/x.txt", 0).await.unwrap(), b"test");
        assert_eq!(read_from(&driver, "/x.txt", 2).await.unwrap(), b"st");
        assert!(matches!(
            read_from(&driver, "/x.txt", 4).await,
            Err(DriverError::InvalidOffset { .. })
        ));
    }

    #[tokio::test]
    async fn test_put_resume_truncates_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());

        put(&driver, "/resume.bin", b"abcdef", None).await.unwrap();
        put(&driver, "/resume.bin", b"XYZ", Some(3)).await.unwrap();
        assert_eq!(read_from(&driver, "/resume.bin", 0).await.unwrap(), b"abcXYZ");

        put(&driver, "/resume.bin", b"12", Some(1)).await.unwrap();
        assert_eq!(read_from(&driver, "/resume.bin", 0).await.unwrap(), b"a12");

        assert!(matches!(
            put(&driver, "/resume.bin", b"!", Some(10)).await,
            Err(DriverError::InvalidOffset { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_dir_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());

        driver.make_dir(&ctx(), "/src").await.unwrap();
        driver.make_dir(&ctx(), "/src/nested").await.unwrap();
        put(&driver, "/src/nested/a.txt", b"a", None).await.unwrap();
        put(&driver, "/src/b.txt", b"b", None).await.unwrap();

        driver.delete_dir(&ctx(), "/src").await.unwrap();
        assert!(driver.stat(&ctx(), "/src/nested/a.txt").await.unwrap_err().is_not_found());
        assert!(driver.stat(&ctx(), "/src").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_make_dir_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        driver.make_dir(&ctx(), "/d").await.unwrap();
        assert!(matches!(
            driver.make_dir(&ctx(), "/d").await,
            Err(DriverError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        driver.make_dir(&ctx(), "/d").await.unwrap();
        assert!(matches!(
            driver.delete_file(&ctx(), "/d").await,
            Err(DriverError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_missing_source_leaves_target_absent() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        assert!(driver.rename(&ctx(), "/nope", "/dest").await.is_err());
        assert!(driver.stat(&ctx(), "/dest").await.is_err());
    }

    #[tokio::test]
    async fn test_rename_onto_existing_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        put(&driver, "/a.txt", b"alpha", None).await.unwrap();
        put(&driver, "/b.txt", b"beta", None).await.unwrap();

        let err = driver.rename(&ctx(), "/a.txt", "/b.txt").await.unwrap_err();
        assert!(matches!(err, DriverError::AlreadyExists(_)));
        assert_eq!(read_from(&driver, "/a.txt", 0).await.unwrap(), b"alpha");
        assert_eq!(read_from(&driver, "/b.txt", 0).await.unwrap(), b"beta");
    }

    #[tokio::test]
    async fn test_list_dir_stops_on_visitor_error() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FileDriver::new(dir.path());
        put(&driver, "/a", b"1", None).await.unwrap();
        put(&driver, "/b", b"2", None).await.unwrap();

        let mut seen = 0;
        let result = driver
            .list_dir(&ctx(), "/", &mut |_info| {
                seen += 1;
                Err(DriverError::Unsupported("stop".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }
}
