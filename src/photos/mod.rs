//! 写真の取り込み
//!
//! - capture: 撮影済みの1ファイルを取り込む（カメラ相当）
//! - pick: フォルダ内の画像をまとめて取り込む（ギャラリー相当）
//!
//! 取り込んだ写真はデータディレクトリの photos/ に `photo_<ms>.<ext>` でコピーする。
//! コピーに失敗した場合は元のパスをそのまま参照として使う。

use crate::config::Config;
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

/// 要求するアクセスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoAccess {
    Camera,
    Library,
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// 許可されれば true
    async fn request(&self, access: PhotoAccess) -> bool;
}

pub struct GrantAll;

#[async_trait]
impl PermissionGate for GrantAll {
    async fn request(&self, _access: PhotoAccess) -> bool {
        true
    }
}

pub struct DenyAll;

#[async_trait]
impl PermissionGate for DenyAll {
    async fn request(&self, access: PhotoAccess) -> bool {
        debug!(?access, "写真へのアクセスを拒否");
        false
    }
}

pub fn permission_gate(config: &Config) -> Box<dyn PermissionGate> {
    if config.photo_access {
        Box::new(GrantAll)
    } else {
        Box::new(DenyAll)
    }
}

/// フォルダ直下の画像ファイル（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(InventoryError::PhotoAcquisition(format!(
            "フォルダが見つかりません: {}",
            folder.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            IMAGE_EXTENSIONS.iter().any(|&e| e == ext)
        })
        .unwrap_or(false)
}

pub struct PhotoImporter {
    gate: Box<dyn PermissionGate>,
    photos_dir: PathBuf,
}

impl PhotoImporter {
    pub fn new(gate: Box<dyn PermissionGate>, photos_dir: impl Into<PathBuf>) -> Self {
        Self {
            gate,
            photos_dir: photos_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(permission_gate(config), config.photos_dir()?))
    }

    /// 1枚取り込む
    pub async fn capture(&self, source: &Path) -> Result<String> {
        if !self.gate.request(PhotoAccess::Camera).await {
            return Err(InventoryError::PermissionDenied);
        }
        if !source.is_file() {
            return Err(InventoryError::PhotoAcquisition(format!(
                "ファイルが見つかりません: {}",
                source.display()
            )));
        }
        Ok(self.save_copy(source).await)
    }

    /// フォルダ内の画像をすべて取り込む
    pub async fn pick(&self, folder: &Path) -> Result<Vec<String>> {
        if !self.gate.request(PhotoAccess::Library).await {
            return Err(InventoryError::PermissionDenied);
        }
        let images = scan_folder(folder)?;
        if images.is_empty() {
            return Err(InventoryError::PhotoAcquisition(format!(
                "画像が見つかりません: {}",
                folder.display()
            )));
        }

        let mut refs = Vec::with_capacity(images.len());
        for image in &images {
            refs.push(self.save_copy(image).await);
        }
        Ok(refs)
    }

    /// 取り込んだコピーを削除する。写真ディレクトリ外の参照には触れない
    pub async fn discard(&self, references: &[String]) -> usize {
        let mut removed = 0;
        for reference in references {
            let path = Path::new(reference);
            if path.parent() != Some(self.photos_dir.as_path()) {
                continue;
            }
            match tokio::fs::remove_file(path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(error = %e, path = %reference, "写真のコピーを削除できません"),
            }
        }
        if removed > 0 {
            debug!(removed, "取り込んだ写真を破棄しました");
        }
        removed
    }

    /// 写真ディレクトリへコピーし、参照パスを返す（失敗時は元のパス）
    async fn save_copy(&self, source: &Path) -> String {
        let original = source.display().to_string();

        if let Err(e) = tokio::fs::create_dir_all(&self.photos_dir).await {
            warn!(error = %e, dir = %self.photos_dir.display(), "写真ディレクトリを作成できません");
            return original;
        }

        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let dest = unique_destination(&self.photos_dir, chrono::Utc::now().timestamp_millis(), &ext);

        match tokio::fs::copy(source, &dest).await {
            Ok(_) => {
                debug!(from = %original, to = %dest.display(), "写真をコピーしました");
                dest.display().to_string()
            }
            Err(e) => {
                warn!(error = %e, path = %original, "写真のコピーに失敗、元のパスを使用します");
                original
            }
        }
    }
}

/// 既存ファイルと重ならない保存先
fn unique_destination(dir: &Path, millis: i64, ext: &str) -> PathBuf {
    let first = dir.join(format!("photo_{}.{}", millis, ext));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("photo_{}_{}.{}", millis, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
