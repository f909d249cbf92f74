//! 出力ファイルの共有
//!
//! - SystemShare: OS標準の関連付けで開く
//! - RevealShare: 何もしない（呼び出し側が保存先を表示する）

use crate::config::{Config, ShareKind};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait ShareSheet: Send + Sync {
    /// false の場合、呼び出し側はファイルの場所を表示する
    fn is_available(&self) -> bool;

    async fn share(&self, path: &Path) -> Result<()>;
}

pub fn share_sheet(config: &Config) -> Box<dyn ShareSheet> {
    match config.share {
        ShareKind::System => Box::new(SystemShare),
        ShareKind::Reveal => Box::new(RevealShare),
    }
}

pub struct SystemShare;

impl SystemShare {
    #[cfg(target_os = "macos")]
    fn command(path: &Path) -> Command {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    }

    #[cfg(target_os = "windows")]
    fn command(path: &Path) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn command(path: &Path) -> Command {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

#[async_trait]
impl ShareSheet for SystemShare {
    fn is_available(&self) -> bool {
        true
    }

    async fn share(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "ファイルを開きます");
        let status = Self::command(path)
            .status()
            .await
            .map_err(|e| InventoryError::Share(e.to_string()))?;
        if !status.success() {
            return Err(InventoryError::Share(format!("終了コード {}", status)));
        }
        Ok(())
    }
}

pub struct RevealShare;

#[async_trait]
impl ShareSheet for RevealShare {
    fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
