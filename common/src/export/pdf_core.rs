//! PDF export core utilities (built-in renderer).
//!
//! printpdfで表を描くための列配置・折り返し・写真枠・改ページ計算。
//! 行はページをまたがず、各ページの先頭にヘッダー行を置く。
//! 幅は半角1・全角2の単位で数える。

use super::html_core::ReportRow;
use crate::layout::{
    report_columns, pt_to_mm, A4_HEIGHT_MM, A4_WIDTH_MM, MARGIN_MM, USABLE_WIDTH_MM,
};
use std::ops::Range;

/// 1セルあたりの最大行数（超過分は省略）
pub const MAX_CELL_LINES: usize = 6;

/// 半角1文字の平均幅（em比）
const AVG_CHAR_WIDTH_EM: f32 = 0.5;

/// 写真1枚の表示枠（mm）
pub const PHOTO_BOX_MM: f32 = 16.0;
pub const PHOTO_GAP_MM: f32 = 1.0;

/// 写真列の最大段数（超過分は "+N" 表示）
pub const MAX_PHOTO_ROWS: usize = 3;

pub const PHOTOS_COLUMN: &str = "photos";

#[derive(Debug, Clone)]
pub struct PlacedColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub ascii_label: &'static str,
    pub x_mm: f32,
    pub width_mm: f32,
    /// 折り返し幅（半角換算）
    pub max_units: usize,
}

/// 表の配置（mm単位）
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub title_height_mm: f32,
    pub font_size_pt: f32,
    pub title_font_size_pt: f32,
    pub line_height_mm: f32,
    pub cell_padding_mm: f32,
    pub columns: Vec<PlacedColumn>,
}

impl TableLayout {
    pub fn a4(include_scanning: bool) -> Self {
        let font_size_pt = 8.0;
        let cell_padding_mm = 1.5;
        let char_width_mm = pt_to_mm(font_size_pt * AVG_CHAR_WIDTH_EM);

        let mut x_mm = MARGIN_MM;
        let columns = report_columns(include_scanning)
            .iter()
            .map(|c| {
                let width_mm = USABLE_WIDTH_MM * c.width_percent as f32 / 100.0;
                let text_width = (width_mm - cell_padding_mm * 2.0).max(char_width_mm);
                let placed = PlacedColumn {
                    key: c.key,
                    label: c.label,
                    ascii_label: c.ascii_label,
                    x_mm,
                    width_mm,
                    max_units: ((text_width / char_width_mm).floor() as usize).max(1),
                };
                x_mm += width_mm;
                placed
            })
            .collect();

        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
            title_height_mm: 12.0,
            font_size_pt,
            title_font_size_pt: 14.0,
            line_height_mm: pt_to_mm(font_size_pt * 1.4),
            cell_padding_mm,
            columns,
        }
    }

    /// ヘッダー行の高さ
    pub fn header_height_mm(&self) -> f32 {
        self.row_height_mm(1)
    }

    pub fn row_height_mm(&self, lines: usize) -> f32 {
        lines.max(1) as f32 * self.line_height_mm + self.cell_padding_mm * 2.0
    }

    /// 本文の上端（PDF座標、下が0）
    pub fn content_top_mm(&self, first_page: bool) -> f32 {
        let top = self.page_height_mm - self.margin_mm;
        if first_page {
            top - self.title_height_mm
        } else {
            top
        }
    }

    /// ヘッダーを除いた行の配置可能高さ
    pub fn rows_available_mm(&self, first_page: bool) -> f32 {
        self.content_top_mm(first_page) - self.margin_mm - self.header_height_mm()
    }
}

/// 写真1枚の配置（列左端・行上端からのオフセット）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoSlot {
    pub photo_index: usize,
    pub x_offset_mm: f32,
    pub y_offset_mm: f32,
    pub size_mm: f32,
}

/// 写真列の枠割り
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoGrid {
    pub slots: Vec<PhotoSlot>,
    /// 枠に入りきらなかった枚数
    pub hidden: usize,
    /// 枠部分の高さ（余白を除く）
    pub height_mm: f32,
}

impl PhotoGrid {
    /// 入りきらない枚数の表示
    pub fn overflow_note(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{}", self.hidden))
    }
}

/// 写真を列幅に並べる（左上から横優先、最大 MAX_PHOTO_ROWS 段）
pub fn plan_photo_grid(layout: &TableLayout, column: &PlacedColumn, count: usize) -> PhotoGrid {
    if count == 0 {
        return PhotoGrid::default();
    }
    let inner = (column.width_mm - layout.cell_padding_mm * 2.0).max(1.0);
    let size = PHOTO_BOX_MM.min(inner);
    let step = size + PHOTO_GAP_MM;
    let per_row = (((inner + PHOTO_GAP_MM) / step).floor() as usize).max(1);
    let shown = count.min(per_row * MAX_PHOTO_ROWS);
    let rows = shown.div_ceil(per_row);

    let slots = (0..shown)
        .map(|i| PhotoSlot {
            photo_index: i,
            x_offset_mm: layout.cell_padding_mm + (i % per_row) as f32 * step,
            y_offset_mm: layout.cell_padding_mm + (i / per_row) as f32 * step,
            size_mm: size,
        })
        .collect();

    PhotoGrid {
        slots,
        hidden: count - shown,
        height_mm: rows as f32 * step - PHOTO_GAP_MM,
    }
}

/// 描画前の1行（列ごとの折り返し済みテキストと写真枠）
#[derive(Debug, Clone)]
pub struct PlannedRow {
    /// 写真列は空
    pub cells: Vec<Vec<String>>,
    pub photos: PhotoGrid,
    pub height_mm: f32,
}

/// 行を列幅で折り返す。unicode が false ならASCII以外を '?' にする
pub fn plan_row(layout: &TableLayout, row: &ReportRow, unicode: bool) -> PlannedRow {
    let mut photos = PhotoGrid::default();
    let cells: Vec<Vec<String>> = layout
        .columns
        .iter()
        .map(|column| {
            if column.key == PHOTOS_COLUMN {
                photos = plan_photo_grid(layout, column, row.photos.len());
                return Vec::new();
            }
            let text = row.text_for(column.key, !unicode);
            let text = if unicode { text } else { builtin_text(&text) };
            wrap_text(&text, column.max_units, MAX_CELL_LINES)
        })
        .collect();

    let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
    let mut photo_height = photos.height_mm;
    if photos.hidden > 0 {
        photo_height += layout.line_height_mm;
    }
    let height_mm = layout
        .row_height_mm(lines)
        .max(photo_height + layout.cell_padding_mm * 2.0);

    PlannedRow {
        cells,
        photos,
        height_mm,
    }
}

/// 組み込みフォントで表示できない文字を '?' に置き換える
pub fn builtin_text(text: &str) -> String {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

/// 半角1・全角2の表示幅
fn char_units(c: char) -> usize {
    if c.is_ascii() {
        1
    } else {
        2
    }
}

pub fn text_units(text: &str) -> usize {
    text.chars().map(char_units).sum()
}

/// 表示幅で折り返す（空白があればそこで区切る）。上限行を超えたら末尾を "..." にする
pub fn wrap_text(text: &str, max_units: usize, max_lines: usize) -> Vec<String> {
    let max_units = max_units.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_units = 0usize;

    for word in text.split_whitespace() {
        let word_units = text_units(word);
        let sep = if current_units == 0 { 0 } else { 1 };
        if current_units + sep + word_units <= max_units {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_units += sep + word_units;
            continue;
        }
        if current_units > 0 {
            lines.push(std::mem::take(&mut current));
            current_units = 0;
        }
        // 1語が列幅を超える場合は文字単位で分割
        for c in word.chars() {
            let units = char_units(c);
            if current_units > 0 && current_units + units > max_units {
                lines.push(std::mem::take(&mut current));
                current_units = 0;
            }
            current.push(c);
            current_units += units;
        }
    }
    if current_units > 0 || lines.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let budget = max_units.saturating_sub(3);
            let mut kept = String::new();
            let mut units = 0usize;
            for c in last.chars() {
                units += char_units(c);
                if units > budget {
                    break;
                }
                kept.push(c);
            }
            *last = kept + "...";
        }
    }
    lines
}

/// 行の高さからページ割りを決める（行は分割しない）
///
/// 1ページに収まらない行は単独でそのページに置く。
pub fn plan_pages(row_heights: &[f32], first_available_mm: f32, available_mm: f32) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0usize;
    let mut remaining = first_available_mm;

    for (i, height) in row_heights.iter().enumerate() {
        if *height > remaining && i > start {
            pages.push(start..i);
            start = i;
            remaining = available_mm;
        }
        remaining -= height;
    }
    if start < row_heights.len() {
        pages.push(start..row_heights.len());
    }
    pages
}
