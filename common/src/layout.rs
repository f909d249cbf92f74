//! レイアウト設定モジュール
//!
//! 報告書（A4縦）のmm基準レイアウトと表の列定義。
//! HTML出力と組み込みPDF出力の両方がこの定義を参照する。

// ============================================
// mm基準レイアウト（Source of Truth）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f32 = 10.0;

/// 利用可能幅・高さ（mm）
pub const USABLE_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_MM * 2.0;   // 190mm
pub const USABLE_HEIGHT_MM: f32 = A4_HEIGHT_MM - MARGIN_MM * 2.0; // 277mm

/// 写真サムネイル（px）
pub const THUMBNAIL_WIDTH_PX: u32 = 300;
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// HTML上のサムネイル表示上限（px）
pub const THUMBNAIL_DISPLAY_MAX_PX: u32 = 90;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}

// ============================================
// 列定義
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinition {
    pub key: &'static str,
    pub label: &'static str,
    /// 組み込みPDFフォントはLatin文字のみ
    pub ascii_label: &'static str,
    /// 表幅に対する割合（%）
    pub width_percent: u8,
}

/// スキャン方法なしの列（合計100%）
pub const REPORT_COLUMNS: &[ColumnDefinition] = &[
    ColumnDefinition { key: "seq", label: "No.", ascii_label: "No.", width_percent: 5 },
    ColumnDefinition { key: "majorLocation", label: "地点名", ascii_label: "Site", width_percent: 16 },
    ColumnDefinition { key: "minorLocation", label: "区域", ascii_label: "Area", width_percent: 16 },
    ColumnDefinition { key: "specificName", label: "名称", ascii_label: "Name", width_percent: 16 },
    ColumnDefinition { key: "itemName", label: "種類", ascii_label: "Type", width_percent: 16 },
    ColumnDefinition { key: "photos", label: "写真", ascii_label: "Photos", width_percent: 21 },
    ColumnDefinition { key: "quantity", label: "数量", ascii_label: "Qty", width_percent: 10 },
];

/// スキャン方法ありの列（合計100%）
pub const REPORT_COLUMNS_WITH_SCANNING: &[ColumnDefinition] = &[
    ColumnDefinition { key: "seq", label: "No.", ascii_label: "No.", width_percent: 5 },
    ColumnDefinition { key: "majorLocation", label: "地点名", ascii_label: "Site", width_percent: 13 },
    ColumnDefinition { key: "minorLocation", label: "区域", ascii_label: "Area", width_percent: 13 },
    ColumnDefinition { key: "specificName", label: "名称", ascii_label: "Name", width_percent: 14 },
    ColumnDefinition { key: "itemName", label: "種類", ascii_label: "Type", width_percent: 14 },
    ColumnDefinition { key: "photos", label: "写真", ascii_label: "Photos", width_percent: 20 },
    ColumnDefinition { key: "quantity", label: "数量", ascii_label: "Qty", width_percent: 8 },
    ColumnDefinition { key: "scanningMethods", label: "スキャン方法", ascii_label: "Scan", width_percent: 13 },
];

/// 列セットを選択
pub fn report_columns(include_scanning: bool) -> &'static [ColumnDefinition] {
    if include_scanning {
        REPORT_COLUMNS_WITH_SCANNING
    } else {
        REPORT_COLUMNS
    }
}
