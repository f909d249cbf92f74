//! HTML → PDF 変換
//!
//! - CommandRasterizer: 外部コマンド（wkhtmltopdf互換の引数）でHTMLをそのままPDF化
//! - BuiltinRasterizer: printpdfで表と写真サムネイルを描画
//!
//! 組み込み描画は日本語フォント（設定 pdf_font または既知の候補）を埋め込む。
//! 見つからない場合はHelveticaで描画し、ASCII以外は '?' になる。

use crate::config::{Config, RasterizerKind};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use field_inventory_common::export::html_core::has_scanning_methods;
use field_inventory_common::export::pdf_core::{
    builtin_text, plan_pages, plan_row, PhotoSlot, PlannedRow, TableLayout, PHOTOS_COLUMN,
};
use field_inventory_common::layout::{MARGIN_MM, THUMBNAIL_WIDTH_PX};
use field_inventory_common::{PhotoCell, ReportRow, PHOTO_PLACEHOLDER};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Px,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// 日本語を表示できるフォントの候補（単体のTrueTypeを優先）
const CJK_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/usr/share/fonts/opentype/ipafont-gothic/ipag.ttf",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
];

/// 埋め込み解像度（printpdfの既定と同じ）
const IMAGE_DPI: f32 = 300.0;

/// 変換対象の報告書
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub html: String,
    pub rows: Vec<ReportRow>,
}

#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// output にPDFを書き出す
    async fn rasterize(&self, report: &ReportDocument, output: &Path) -> Result<()>;
}

pub fn pdf_rasterizer(config: &Config) -> Box<dyn PdfRasterizer> {
    match config.rasterizer {
        RasterizerKind::Builtin => Box::new(BuiltinRasterizer {
            font: config.pdf_font.clone(),
        }),
        RasterizerKind::Command => Box::new(CommandRasterizer::new(config.rasterizer_command.clone())),
    }
}

// ============================================
// 外部コマンド
// ============================================

pub struct CommandRasterizer {
    program: String,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// A4・余白10mm・ローカル画像許可
    fn args(html_path: &Path, output: &Path) -> Vec<String> {
        let margin = format!("{}mm", MARGIN_MM);
        let mut args: Vec<String> = vec![
            "--quiet".into(),
            "--encoding".into(),
            "utf-8".into(),
            "--page-size".into(),
            "A4".into(),
        ];
        for side in ["--margin-top", "--margin-bottom", "--margin-left", "--margin-right"] {
            args.push(side.into());
            args.push(margin.clone());
        }
        args.push("--enable-local-file-access".into());
        args.push(html_path.display().to_string());
        args.push(output.display().to_string());
        args
    }
}

fn temp_html_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "field-inventory-{}-{}.html",
        std::process::id(),
        chrono::Utc::now().timestamp_millis()
    ))
}

#[async_trait]
impl PdfRasterizer for CommandRasterizer {
    async fn rasterize(&self, report: &ReportDocument, output: &Path) -> Result<()> {
        let html_path = temp_html_path();
        tokio::fs::write(&html_path, &report.html).await?;

        debug!(program = %self.program, html = %html_path.display(), "PDF変換コマンドを実行");
        let result = Command::new(&self.program)
            .args(Self::args(&html_path, output))
            .output()
            .await;

        // 一時HTMLは成否にかかわらず削除
        let _ = tokio::fs::remove_file(&html_path).await;

        let out = result.map_err(|e| {
            InventoryError::Export(format!("{} を起動できません: {}", self.program, e))
        })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(InventoryError::Export(format!(
                "{} が失敗しました ({}): {}",
                self.program,
                out.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

// ============================================
// 組み込み（printpdf）
// ============================================

#[derive(Debug, Clone, Default)]
pub struct BuiltinRasterizer {
    /// 未指定なら CJK_FONT_CANDIDATES から探す
    font: Option<PathBuf>,
}

impl BuiltinRasterizer {
    pub fn with_font(font: impl Into<PathBuf>) -> Self {
        Self {
            font: Some(font.into()),
        }
    }
}

#[async_trait]
impl PdfRasterizer for BuiltinRasterizer {
    async fn rasterize(&self, report: &ReportDocument, output: &Path) -> Result<()> {
        let report = report.clone();
        let output = output.to_path_buf();
        let font = self.font.clone();
        tokio::task::spawn_blocking(move || render_builtin(&report, &output, font.as_deref()))
            .await
            .map_err(|e| InventoryError::Export(format!("PDF生成タスクエラー: {}", e)))?
    }
}

/// 本文用フォント
struct ReportFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// ASCII以外も描画できる
    unicode: bool,
}

fn load_fonts(doc: &PdfDocumentReference, configured: Option<&Path>) -> Result<ReportFonts> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => CJK_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    for path in candidates.iter().filter(|p| p.is_file()) {
        let loaded = File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|file| doc.add_external_font(file).map_err(|e| format!("{:?}", e)));
        match loaded {
            Ok(font) => {
                debug!(font = %path.display(), "日本語フォントを埋め込みます");
                return Ok(ReportFonts {
                    regular: font.clone(),
                    bold: font,
                    unicode: true,
                });
            }
            Err(e) => warn!(font = %path.display(), error = %e, "フォントを読み込めません"),
        }
    }

    warn!(
        "日本語フォントが見つからないため、PDFの日本語は '?' で表示されます（config --set pdf_font <TTFファイル> で指定できます）"
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InventoryError::Export(format!("フォント追加エラー: {:?}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InventoryError::Export(format!("フォント追加エラー: {:?}", e)))?;
    Ok(ReportFonts {
        regular,
        bold,
        unicode: false,
    })
}

/// base64の写真をRGBの画像XObjectへ（大きい画像はサムネイル幅まで縮小）
fn photo_xobject(base64: &str) -> Option<ImageXObject> {
    let bytes = STANDARD.decode(base64).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let img = if img.width() > THUMBNAIL_WIDTH_PX || img.height() > THUMBNAIL_WIDTH_PX {
        img.thumbnail(THUMBNAIL_WIDTH_PX, THUMBNAIL_WIDTH_PX)
    } else {
        img
    };
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Some(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    })
}

fn render_builtin(report: &ReportDocument, output: &Path, font: Option<&Path>) -> Result<()> {
    let layout = TableLayout::a4(has_scanning_methods(&report.rows));

    let (doc, page1, layer1) = PdfDocument::new(
        builtin_text(&report.title),
        Mm(layout.page_width_mm),
        Mm(layout.page_height_mm),
        "Layer 1",
    );
    let fonts = load_fonts(&doc, font)?;
    let text = |s: &str| if fonts.unicode { s.to_string() } else { builtin_text(s) };

    let planned: Vec<PlannedRow> = report
        .rows
        .iter()
        .map(|r| plan_row(&layout, r, fonts.unicode))
        .collect();
    let heights: Vec<f32> = planned.iter().map(|p| p.height_mm).collect();
    let mut pages = plan_pages(
        &heights,
        layout.rows_available_mm(true),
        layout.rows_available_mm(false),
    );
    if pages.is_empty() {
        pages.push(0..0);
    }

    let header: Vec<Vec<String>> = layout
        .columns
        .iter()
        .map(|c| vec![if fonts.unicode { c.label } else { c.ascii_label }.to_string()])
        .collect();
    let photo_x_mm = layout
        .columns
        .iter()
        .find(|c| c.key == PHOTOS_COLUMN)
        .map(|c| c.x_mm);

    let total_pages = pages.len();
    for (page_index, range) in pages.into_iter().enumerate() {
        let first_page = page_index == 0;
        let layer = if first_page {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(
                Mm(layout.page_width_mm),
                Mm(layout.page_height_mm),
                "Layer 1",
            );
            doc.get_page(page).get_layer(layer)
        };

        if first_page {
            layer.use_text(
                text(&report.title),
                layout.title_font_size_pt,
                Mm(layout.margin_mm),
                Mm(layout.page_height_mm - layout.margin_mm - 6.0),
                &fonts.bold,
            );
        }

        // ヘッダー行は各ページ先頭に繰り返す
        let mut y = layout.content_top_mm(first_page);
        draw_cells(&layer, &layout, &header, y, &fonts.bold);
        y -= layout.header_height_mm();

        for (planned_row, row) in planned[range.clone()].iter().zip(&report.rows[range]) {
            draw_cells(&layer, &layout, &planned_row.cells, y, &fonts.regular);
            if let Some(column_x) = photo_x_mm {
                for slot in &planned_row.photos.slots {
                    let photo = &row.photos[slot.photo_index];
                    draw_photo(&layer, &layout, photo, slot, column_x, y, &fonts.regular);
                }
                if let Some(note) = planned_row.photos.overflow_note() {
                    let baseline = y
                        - layout.cell_padding_mm
                        - planned_row.photos.height_mm
                        - layout.line_height_mm * 0.75;
                    layer.use_text(
                        note,
                        layout.font_size_pt,
                        Mm(column_x + layout.cell_padding_mm),
                        Mm(baseline),
                        &fonts.regular,
                    );
                }
            }
            y -= planned_row.height_mm;
        }

        layer.use_text(
            format!("{} / {}", page_index + 1, total_pages),
            layout.font_size_pt,
            Mm(layout.page_width_mm / 2.0 - 5.0),
            Mm(layout.margin_mm / 2.0),
            &fonts.regular,
        );
    }

    let file = File::create(output)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| InventoryError::Export(format!("PDF保存エラー: {:?}", e)))?;

    Ok(())
}

/// 写真1枚を枠に収めて描画。読めない写真は目印の文字列
fn draw_photo(
    layer: &PdfLayerReference,
    layout: &TableLayout,
    photo: &PhotoCell,
    slot: &PhotoSlot,
    column_x_mm: f32,
    row_top_mm: f32,
    font: &IndirectFontRef,
) {
    let left = column_x_mm + slot.x_offset_mm;
    let top = row_top_mm - slot.y_offset_mm;

    let xobject = match photo {
        PhotoCell::Embedded { base64, .. } => photo_xobject(base64),
        PhotoCell::Failed => None,
    };
    let Some(xobject) = xobject else {
        layer.use_text(
            PHOTO_PLACEHOLDER,
            layout.font_size_pt,
            Mm(left),
            Mm(top - layout.line_height_mm * 0.75),
            font,
        );
        return;
    };

    // 枠に収まる倍率（縦横比は維持）
    let natural_w_mm = xobject.width.0 as f32 * 25.4 / IMAGE_DPI;
    let natural_h_mm = xobject.height.0 as f32 * 25.4 / IMAGE_DPI;
    let scale = (slot.size_mm / natural_w_mm).min(slot.size_mm / natural_h_mm);
    let drawn_h_mm = natural_h_mm * scale;

    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(left)),
            translate_y: Some(Mm(top - drawn_h_mm)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// 1行分のセルを描画（top_mm は行の上端）
fn draw_cells(
    layer: &PdfLayerReference,
    layout: &TableLayout,
    cells: &[Vec<String>],
    top_mm: f32,
    font: &IndirectFontRef,
) {
    for (column, lines) in layout.columns.iter().zip(cells) {
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline = top_mm
                - layout.cell_padding_mm
                - layout.line_height_mm * (i as f32 + 1.0)
                + layout.line_height_mm * 0.25;
            layer.use_text(
                line.clone(),
                layout.font_size_pt,
                Mm(column.x_mm + layout.cell_padding_mm),
                Mm(baseline),
                font,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let args = CommandRasterizer::args(Path::new("/tmp/in.html"), Path::new("/tmp/out.pdf"));
        assert!(args.windows(2).any(|w| w[0] == "--page-size" && w[1] == "A4"));
        assert!(args.windows(2).any(|w| w[0] == "--margin-left" && w[1] == "10mm"));
        assert_eq!(args[args.len() - 2], "/tmp/in.html");
        assert_eq!(args[args.len() - 1], "/tmp/out.pdf");
    }

    #[tokio::test]
    async fn test_command_missing_program_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let rasterizer = CommandRasterizer::new("field-inventory-no-such-program");
        let report = ReportDocument {
            title: "t".to_string(),
            html: "<html></html>".to_string(),
            rows: vec![],
        };
        let err = rasterizer
            .rasterize(&report, &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Export(_)));
    }

    #[test]
    fn test_photo_xobject_downscales_large_images() {
        let img = image::RgbImage::from_pixel(1200, 600, image::Rgb([0, 0, 0]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();

        let xobject = photo_xobject(&STANDARD.encode(png.into_inner())).unwrap();
        assert_eq!(xobject.width.0, THUMBNAIL_WIDTH_PX as usize);
        assert_eq!(xobject.height.0, THUMBNAIL_WIDTH_PX as usize / 2);
        assert_eq!(xobject.image_data.len(), xobject.width.0 * xobject.height.0 * 3);
        assert!(photo_xobject("not base64!").is_none());
    }

    #[tokio::test]
    async fn test_missing_configured_font_falls_back() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("out.pdf");
        let rasterizer = BuiltinRasterizer::with_font(dir.path().join("no-such-font.ttf"));
        let report = ReportDocument {
            title: "文化財記録".to_string(),
            html: String::new(),
            rows: vec![],
        };
        rasterizer.rasterize(&report, &output).await.unwrap();
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    }
}
