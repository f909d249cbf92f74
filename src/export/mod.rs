pub mod encoder;
pub mod rasterizer;
pub mod share;

use crate::config::Config;
use crate::error::{InventoryError, Result};
use encoder::{image_encoder, ImageEncoder};
use field_inventory_common::{build_report_html, PhotoCell, ReportRow, Sequenced};
use indicatif::{ProgressBar, ProgressStyle};
use rasterizer::{pdf_rasterizer, PdfRasterizer, ReportDocument};
use share::{share_sheet, ShareSheet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 出力の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// 共有シートに渡した
    Shared(PathBuf),
    /// 共有できないため保存先のみ
    Saved(PathBuf),
}

impl ExportOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ExportOutcome::Shared(path) | ExportOutcome::Saved(path) => path,
        }
    }
}

/// 記録一覧 → HTML → PDF → 共有
pub struct Exporter {
    encoder: Box<dyn ImageEncoder>,
    rasterizer: Box<dyn PdfRasterizer>,
    share: Box<dyn ShareSheet>,
    title: String,
    show_progress: bool,
}

impl Exporter {
    pub fn new(
        encoder: Box<dyn ImageEncoder>,
        rasterizer: Box<dyn PdfRasterizer>,
        share: Box<dyn ShareSheet>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            encoder,
            rasterizer,
            share,
            title: title.into(),
            show_progress: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            image_encoder(config),
            pdf_rasterizer(config),
            share_sheet(config),
            config.report_title.clone(),
        )
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// 写真エンコード中に進捗バーを表示する
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// 1枚をデータURI用にエンコード。失敗時はプレースホルダー
    pub async fn encode_photo(&self, path: &str) -> PhotoCell {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, path, "写真を読み込めません");
                return PhotoCell::Failed;
            }
        };
        match self.encoder.encode(&bytes, path) {
            Ok(cell) => cell,
            Err(e) => {
                warn!(error = %e, path, "写真をエンコードできません");
                PhotoCell::Failed
            }
        }
    }

    /// 表の行と写真を組み立てる（並びは呼び出し側の順）
    pub async fn build_report(&self, entries: &[Sequenced<'_>]) -> ReportDocument {
        let total_photos: usize = entries.iter().map(|e| e.record.photos().len()).sum();
        let progress = if self.show_progress {
            let pb = ProgressBar::new(total_photos as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner} 写真を変換中 [{bar:30}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut photos = Vec::with_capacity(entry.record.photos().len());
            for path in entry.record.photos() {
                photos.push(self.encode_photo(path).await);
                progress.inc(1);
            }
            rows.push(ReportRow::from_sequenced(entry, photos));
        }
        progress.finish_and_clear();

        let html = build_report_html(&self.title, &rows);
        ReportDocument {
            title: self.title.clone(),
            html,
            rows,
        }
    }

    pub async fn build_report_html(&self, entries: &[Sequenced<'_>]) -> String {
        self.build_report(entries).await.html
    }

    /// PDFを書き出して共有する
    ///
    /// 変換に失敗した場合は途中のファイルを残さない。
    /// 共有に失敗した場合はPDFを残したままエラーを返す。
    pub async fn export(&self, entries: &[Sequenced<'_>], output: &Path) -> Result<ExportOutcome> {
        if entries.is_empty() {
            return Err(InventoryError::NothingToExport);
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let report = self.build_report(entries).await;
        if let Err(e) = self.rasterizer.rasterize(&report, output).await {
            let _ = tokio::fs::remove_file(output).await;
            return Err(match e {
                InventoryError::Export(_) => e,
                other => InventoryError::Export(other.to_string()),
            });
        }
        info!(records = entries.len(), path = %output.display(), "PDFを出力しました");

        if !self.share.is_available() {
            return Ok(ExportOutcome::Saved(output.to_path_buf()));
        }
        match self.share.share(output).await {
            Ok(()) => Ok(ExportOutcome::Shared(output.to_path_buf())),
            Err(e) => {
                warn!(error = %e, path = %output.display(), "共有に失敗しました");
                let reason = match e {
                    InventoryError::Share(reason) => reason,
                    other => other.to_string(),
                };
                Err(InventoryError::Share(format!("{} ({})", reason, output.display())))
            }
        }
    }
}

/// 既定の出力先 `<dir>/<title>_<ms>.pdf`
pub fn default_output_path(dir: &Path, title: &str, millis: i64) -> PathBuf {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    let stem = stem.trim();
    let stem = if stem.is_empty() { "report" } else { stem };
    dir.join(format!("{}_{}.pdf", stem, millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/tmp/out"), "文化財記録", 42);
        assert_eq!(path, PathBuf::from("/tmp/out/文化財記録_42.pdf"));

        let path = default_output_path(Path::new("/tmp/out"), "a/b", 1);
        assert_eq!(path, PathBuf::from("/tmp/out/a_b_1.pdf"));

        let path = default_output_path(Path::new("/tmp/out"), "  ", 1);
        assert_eq!(path, PathBuf::from("/tmp/out/report_1.pdf"));
    }
}
