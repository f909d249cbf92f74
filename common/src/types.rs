//! 記録データの型定義
//!
//! - RecordFields: 入力フォームと記録で共有する項目
//! - Record: 保存済みの1件（id = 作成時刻ms）
//! - ScanningMethod: スキャン方法（固定4種）

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// スキャン方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanningMethod {
    Drone,
    HandheldScanner,
    Camera,
    StationaryScanner,
}

impl ScanningMethod {
    pub const ALL: [ScanningMethod; 4] = [
        ScanningMethod::Drone,
        ScanningMethod::HandheldScanner,
        ScanningMethod::Camera,
        ScanningMethod::StationaryScanner,
    ];

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ScanningMethod::Drone => "ドローン",
            ScanningMethod::HandheldScanner => "ハンディスキャナ",
            ScanningMethod::Camera => "カメラ",
            ScanningMethod::StationaryScanner => "据置スキャナ",
        }
    }

    /// ASCIIのみのラベル（組み込みPDFフォント用）
    pub fn ascii_label(&self) -> &'static str {
        match self {
            ScanningMethod::Drone => "drone",
            ScanningMethod::HandheldScanner => "handheld",
            ScanningMethod::Camera => "camera",
            ScanningMethod::StationaryScanner => "stationary",
        }
    }
}

impl std::str::FromStr for ScanningMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "drone" => Ok(ScanningMethod::Drone),
            "handheld" | "handheldscanner" => Ok(ScanningMethod::HandheldScanner),
            "camera" => Ok(ScanningMethod::Camera),
            "stationary" | "stationaryscanner" => Ok(ScanningMethod::StationaryScanner),
            _ => Err(format!(
                "Unknown scanning method: {}. Use drone, handheld, camera, or stationary",
                s
            )),
        }
    }
}

impl std::fmt::Display for ScanningMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 重複を除いて入力順を保つ（最大4件）
pub fn normalize_scanning_methods(methods: &[ScanningMethod]) -> Vec<ScanningMethod> {
    let mut out: Vec<ScanningMethod> = Vec::with_capacity(ScanningMethod::ALL.len());
    for m in methods {
        if !out.contains(m) {
            out.push(*m);
        }
    }
    out
}

/// 未入力の必須項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    MajorLocation,
    MinorLocation,
    SpecificName,
    ItemName,
    Quantity,
    Photos,
}

impl MissingField {
    pub fn label(&self) -> &'static str {
        match self {
            MissingField::MajorLocation => "地点名",
            MissingField::MinorLocation => "区域",
            MissingField::SpecificName => "名称",
            MissingField::ItemName => "種類",
            MissingField::Quantity => "数量",
            MissingField::Photos => "写真（1枚以上）",
        }
    }
}

/// 記録の入力項目（idを除く全項目）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    #[serde(default)]
    pub major_location: String,   // 地点名

    #[serde(default)]
    pub minor_location: String,   // 区域

    #[serde(default)]
    pub specific_name: String,    // 名称

    #[serde(default)]
    pub item_name: String,        // 種類

    /// 数値文字列（空でないことのみ確認）
    #[serde(default)]
    pub quantity: String,

    /// ローカルファイル参照（順序あり）
    #[serde(default)]
    pub photos: Vec<String>,

    /// 旧形式のデータには存在しない
    #[serde(default)]
    pub scanning_methods: Vec<ScanningMethod>,
}

impl RecordFields {
    /// 不足している必須項目を列挙
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        let text_fields = [
            (&self.major_location, MissingField::MajorLocation),
            (&self.minor_location, MissingField::MinorLocation),
            (&self.specific_name, MissingField::SpecificName),
            (&self.item_name, MissingField::ItemName),
            (&self.quantity, MissingField::Quantity),
        ];
        for (value, field) in text_fields {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if self.photos.is_empty() {
            missing.push(MissingField::Photos);
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(missing))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// 保存済みの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 作成時刻（ミリ秒）。識別子と既定の並び順を兼ねる
    pub id: i64,

    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    pub fn new(id: i64, fields: RecordFields) -> Self {
        Self { id, fields }
    }

    pub fn major_location(&self) -> &str { &self.fields.major_location }
    pub fn minor_location(&self) -> &str { &self.fields.minor_location }
    pub fn specific_name(&self) -> &str { &self.fields.specific_name }
    pub fn item_name(&self) -> &str { &self.fields.item_name }
    pub fn quantity(&self) -> &str { &self.fields.quantity }
    pub fn photos(&self) -> &[String] { &self.fields.photos }
    pub fn scanning_methods(&self) -> &[ScanningMethod] { &self.fields.scanning_methods }
}
