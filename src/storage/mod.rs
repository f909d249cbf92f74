//! キーバリューストア
//!
//! 記録・履歴は名前付きのJSON文字列として保存する。
//! - FileStore: `<dir>/<key>.json` に1キー1ファイル
//! - MemoryStore: プロセス内のみ（テスト・お試し用）

use crate::config::{Config, StorageKind};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// キーが無ければ None
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// 設定に従ってストアを生成
pub fn open_store(config: &Config) -> Result<Box<dyn KeyValueStore>> {
    match config.storage {
        StorageKind::File => Ok(Box::new(FileStore::new(config.store_dir()?))),
        StorageKind::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InventoryError::Persistence(format!("{}: {}", path.display(), e))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| InventoryError::Persistence(format!("{}: {}", self.dir.display(), e)))?;

        // 一時ファイルに書いてから置き換える
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| InventoryError::Persistence(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| InventoryError::Persistence(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| InventoryError::Persistence("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| InventoryError::Persistence("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
