use crate::core_driver::object::{ObjectMeta, ObjectStore};
use crate::core_driver::{DriverError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-process object store. Keys are kept sorted so prefix listings come
/// back in key order, like a real bucket listing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| DriverError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn meta(key: &str, object: &StoredObject) -> ObjectMeta {
    ObjectMeta {
        key: key.to_string(),
        size: object.data.len() as u64,
        last_modified: object.last_modified,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn stat_object(&self, key: &str) -> Result<Option<ObjectMeta>> {
        Ok(self.objects()?.get(key).map(|object| meta(key, object)))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects()?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| meta(key, object))
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.objects()?
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| DriverError::NotFound(key.to_string()))
    }

    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.objects()?.insert(
            key.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn copy_object(&self, src: &str, dst: &str) -> Result<()> {
        let mut objects = self.objects()?;
        let data = objects
            .get(src)
            .map(|object| object.data.clone())
            .ok_or_else(|| DriverError::NotFound(src.to_string()))?;
        objects.insert(
            dst.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn compose_object(&self, dst: &str, sources: &[String]) -> Result<()> {
        let mut objects = self.objects()?;
        let mut data = Vec::new();
        for source in sources {
            let object = objects
                .get(source)
                .ok_or_else(|| DriverError::NotFound(source.clone()))?;
            data.extend_from_slice(&object.data);
        }
        objects.insert(
            dst.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove_object(&self, key: &str) -> Result<()> {
        self.objects()?.remove(key);
        Ok(())
    }
}
