//! 設定ファイル（~/.config/field-inventory/config.json）
//!
//! 保存先・PDF変換・共有・画像縮小などの実装は起動時にここで一度だけ選択する。

use crate::error::{InventoryError, Result};
use field_inventory_common::layout::{THUMBNAIL_JPEG_QUALITY, THUMBNAIL_WIDTH_PX};
use field_inventory_common::query::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 保存先の実装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// データディレクトリ配下のJSONファイル
    #[default]
    File,
    /// プロセス内のみ（終了時に破棄）
    Memory,
}

/// HTML → PDF 変換の実装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RasterizerKind {
    /// printpdfによる表のみの簡易出力（写真は枚数表示）
    #[default]
    Builtin,
    /// 外部コマンド（wkhtmltopdf等）
    Command,
}

/// 共有の実装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    /// OS既定のアプリで開く
    System,
    /// 出力先を表示するだけ
    #[default]
    Reveal,
}

/// 写真のエンコード方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// 縮小してJPEG再圧縮
    #[default]
    Downscale,
    /// 元ファイルをそのままbase64化
    Raw,
}

macro_rules! impl_kind_str {
    ($ty:ty, $($name:literal => $variant:expr),+ $(,)?) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    _ => Err(format!("Unknown value: {}. Use one of: {}", s, [$($name),+].join(", "))),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $(if *self == $variant { return write!(f, "{}", $name); })+
                Ok(())
            }
        }
    };
}

impl_kind_str!(StorageKind, "file" => StorageKind::File, "memory" => StorageKind::Memory);
impl_kind_str!(RasterizerKind, "builtin" => RasterizerKind::Builtin, "command" => RasterizerKind::Command);
impl_kind_str!(ShareKind, "system" => ShareKind::System, "reveal" => ShareKind::Reveal);
impl_kind_str!(EncoderKind, "downscale" => EncoderKind::Downscale, "raw" => EncoderKind::Raw);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// データディレクトリ（未指定時は OS のデータディレクトリ）
    pub data_dir: Option<PathBuf>,
    pub storage: StorageKind,
    pub rasterizer: RasterizerKind,
    /// RasterizerKind::Command で使うプログラム
    pub rasterizer_command: String,
    /// 組み込みPDFに埋め込むフォント（TTF/OTF）。未指定なら既知の場所から探す
    pub pdf_font: Option<PathBuf>,
    pub share: ShareKind,
    pub image_encoder: EncoderKind,
    /// false の場合は写真の取り込みを拒否する
    pub photo_access: bool,
    pub page_size: usize,
    pub thumbnail_width: u32,
    pub jpeg_quality: u8,
    pub report_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InventoryError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("field-inventory").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            data_dir: None,
            storage: StorageKind::File,
            rasterizer: RasterizerKind::Builtin,
            rasterizer_command: "wkhtmltopdf".into(),
            pdf_font: None,
            share: ShareKind::Reveal,
            image_encoder: EncoderKind::Downscale,
            photo_access: true,
            page_size: DEFAULT_PAGE_SIZE,
            thumbnail_width: THUMBNAIL_WIDTH_PX,
            jpeg_quality: THUMBNAIL_JPEG_QUALITY,
            report_title: "文化財記録".into(),
        }
    }

    /// データディレクトリ（store/ photos/ exports/ の親）
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| InventoryError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("field-inventory"))
    }

    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("store"))
    }

    pub fn photos_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("photos"))
    }

    pub fn exports_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("exports"))
    }

    /// `config --set <key> <value>` 用
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |e: String| InventoryError::Config(format!("{}: {}", key, e));
        match key {
            "data_dir" => {
                self.data_dir = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
            }
            "storage" => self.storage = value.parse().map_err(invalid)?,
            "rasterizer" => self.rasterizer = value.parse().map_err(invalid)?,
            "rasterizer_command" => self.rasterizer_command = value.to_string(),
            "pdf_font" => {
                self.pdf_font = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
            }
            "share" => self.share = value.parse().map_err(invalid)?,
            "image_encoder" => self.image_encoder = value.parse().map_err(invalid)?,
            "photo_access" => {
                self.photo_access = value.parse().map_err(|_| invalid("true/false".into()))?;
            }
            "page_size" => {
                let size: usize = value.parse().map_err(|_| invalid("正の整数".into()))?;
                if size == 0 {
                    return Err(invalid("正の整数".into()));
                }
                self.page_size = size;
            }
            "thumbnail_width" => {
                self.thumbnail_width = value.parse().map_err(|_| invalid("整数(px)".into()))?;
            }
            "jpeg_quality" => {
                let quality: u8 = value.parse().map_err(|_| invalid("1-100".into()))?;
                if !(1..=100).contains(&quality) {
                    return Err(invalid("1-100".into()));
                }
                self.jpeg_quality = quality;
            }
            "report_title" => self.report_title = value.to_string(),
            _ => return Err(InventoryError::Config(format!("不明な設定キー: {}", key))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.rasterizer, RasterizerKind::Builtin);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.photo_access);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"rasterizer":"command"}"#).unwrap();
        assert_eq!(config.rasterizer, RasterizerKind::Command);
        assert_eq!(config.rasterizer_command, "wkhtmltopdf");
        assert_eq!(config.image_encoder, EncoderKind::Downscale);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("share", "system").unwrap();
        config.set_value("page_size", "20").unwrap();
        config.set_value("data_dir", "/tmp/inv").unwrap();
        config.set_value("pdf_font", "/fonts/ipag.ttf").unwrap();
        assert_eq!(config.share, ShareKind::System);
        assert_eq!(config.pdf_font, Some(PathBuf::from("/fonts/ipag.ttf")));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/inv"));
        assert_eq!(config.store_dir().unwrap(), PathBuf::from("/tmp/inv/store"));

        assert!(config.set_value("page_size", "0").is_err());
        assert!(config.set_value("jpeg_quality", "101").is_err());
        assert!(config.set_value("rasterizer", "chrome").is_err());
        assert!(config.set_value("unknown", "x").is_err());
    }

    #[test]
    fn test_kind_display_roundtrip() {
        for kind in [EncoderKind::Downscale, EncoderKind::Raw] {
            let parsed: EncoderKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
