//! 永続化データのスキーマ
//!
//! キーバリューストアに名前付きのJSONとして保存する:
//! - records / locationHistory / itemTypeHistory / lastMajorLocation / schemaVersion
//!
//! schemaVersion が無いものは旧形式（v1）として読み込み、欠けている項目は既定値で補う。
//! 記録は1件ずつ寛容に解釈する（数値の数量は文字列化、未知のスキャン方法は除外）。
//! それでも解釈できない要素は元のJSONのまま保持し、保存時に書き戻す。

use crate::error::{Error, Result};
use crate::history::HistoryList;
use crate::types::{normalize_scanning_methods, Record, RecordFields, ScanningMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 現在のスキーマバージョン
pub const SCHEMA_VERSION: u32 = 2;

/// 旧形式（バージョン番号なし）
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// ストアのキー名
pub mod keys {
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    pub const RECORDS: &str = "records";
    pub const LOCATION_HISTORY: &str = "locationHistory";
    pub const ITEM_TYPE_HISTORY: &str = "itemTypeHistory";
    pub const LAST_MAJOR_LOCATION: &str = "lastMajorLocation";

    pub const ALL: [&str; 5] = [
        SCHEMA_VERSION,
        RECORDS,
        LOCATION_HISTORY,
        ITEM_TYPE_HISTORY,
        LAST_MAJOR_LOCATION,
    ];
}

/// ストアから読み出したままの値（キーが無ければ None）
#[derive(Debug, Clone, Default)]
pub struct RawBlobs {
    pub schema_version: Option<String>,
    pub records: Option<String>,
    pub location_history: Option<String>,
    pub item_type_history: Option<String>,
    pub last_major_location: Option<String>,
}

impl RawBlobs {
    /// キー名で値を設定
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match key {
            keys::SCHEMA_VERSION => self.schema_version = value,
            keys::RECORDS => self.records = value,
            keys::LOCATION_HISTORY => self.location_history = value,
            keys::ITEM_TYPE_HISTORY => self.item_type_history = value,
            keys::LAST_MAJOR_LOCATION => self.last_major_location = value,
            _ => {}
        }
    }
}

/// 読み込み時の補正結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// 読み込んだスキーマバージョン
    pub source_version: u32,
    /// 値を補正して読み込んだ記録の件数
    pub repaired_records: usize,
    /// 解釈できず元のまま保持した記録の件数
    pub unreadable_records: usize,
}

impl LoadReport {
    pub fn migrated(&self) -> bool {
        self.source_version != SCHEMA_VERSION
    }
}

/// 永続化される状態全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub records: Vec<Record>,
    pub location_history: HistoryList,
    pub item_type_history: HistoryList,
    pub last_major_location: Option<String>,
    /// 解釈できなかった記録（保存時にそのまま書き戻す）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreadable_records: Vec<Value>,
}

impl PersistedState {
    /// 読み出した値から状態を復元
    pub fn decode(blobs: &RawBlobs) -> Result<(Self, LoadReport)> {
        let version = match &blobs.schema_version {
            Some(raw) => serde_json::from_str::<u32>(raw)?,
            None => LEGACY_SCHEMA_VERSION,
        };
        if version > SCHEMA_VERSION {
            return Err(Error::Schema(format!(
                "未対応のスキーマバージョン: {} (対応: {})",
                version, SCHEMA_VERSION
            )));
        }

        let mut report = LoadReport {
            source_version: version,
            ..Default::default()
        };

        let (records, unreadable_records) = match &blobs.records {
            Some(raw) => decode_records(raw, &mut report)?,
            None => (Vec::new(), Vec::new()),
        };

        let location_values = decode_string_list(blobs.location_history.as_deref())?;
        let item_values = decode_string_list(blobs.item_type_history.as_deref())?;

        // v1 は末尾追加・上限なし、v2 は先頭が最新
        let (location_history, item_type_history) = if version == LEGACY_SCHEMA_VERSION {
            (
                HistoryList::from_append_order(location_values),
                HistoryList::from_append_order(item_values),
            )
        } else {
            (
                HistoryList::from_recent_first(location_values),
                HistoryList::from_recent_first(item_values),
            )
        };

        let last_major_location = match &blobs.last_major_location {
            Some(raw) => serde_json::from_str::<Option<String>>(raw)?
                .filter(|s| !s.trim().is_empty()),
            None => None,
        };

        Ok((
            Self {
                records,
                location_history,
                item_type_history,
                last_major_location,
                unreadable_records,
            },
            report,
        ))
    }

    /// 保存用に (キー, JSON) の組へ変換
    pub fn encode(&self) -> Result<Vec<(&'static str, String)>> {
        let mut records = Vec::with_capacity(self.records.len() + self.unreadable_records.len());
        for record in &self.records {
            records.push(serde_json::to_value(record)?);
        }
        records.extend(self.unreadable_records.iter().cloned());

        Ok(vec![
            (keys::SCHEMA_VERSION, serde_json::to_string(&SCHEMA_VERSION)?),
            (keys::RECORDS, serde_json::to_string(&records)?),
            (keys::LOCATION_HISTORY, serde_json::to_string(&self.location_history)?),
            (keys::ITEM_TYPE_HISTORY, serde_json::to_string(&self.item_type_history)?),
            (keys::LAST_MAJOR_LOCATION, serde_json::to_string(&self.last_major_location)?),
        ])
    }
}

/// 記録配列を1件ずつ解釈する。解釈できない要素は元のまま返す
fn decode_records(raw: &str, report: &mut LoadReport) -> Result<(Vec<Record>, Vec<Value>)> {
    let values: Option<Vec<Value>> = serde_json::from_str(raw)?;
    let mut records = Vec::new();
    let mut unreadable = Vec::new();
    for value in values.unwrap_or_default() {
        match decode_record(&value) {
            Some((record, repaired)) => {
                if repaired {
                    report.repaired_records += 1;
                }
                records.push(record);
            }
            None => {
                report.unreadable_records += 1;
                unreadable.push(value);
            }
        }
    }
    Ok((records, unreadable))
}

/// 1件分を解釈する。値を補正した場合は true を併せて返す
fn decode_record(value: &Value) -> Option<(Record, bool)> {
    let obj = value.as_object()?;
    let mut repaired = false;

    let id = match obj.get("id")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => {
            repaired = true;
            s.trim().parse().ok()?
        }
        _ => return None,
    };

    let mut text = |key: &str| -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(String::new()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => {
                repaired = true;
                Some(v.to_string())
            }
            Some(_) => None,
        }
    };
    let major_location = text("majorLocation")?;
    let minor_location = text("minorLocation")?;
    let specific_name = text("specificName")?;
    let item_name = text("itemName")?;
    let quantity = text("quantity")?;

    let photos = match obj.get("photos") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?,
        Some(_) => return None,
    };

    let scanning_methods = match obj.get("scanningMethods") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let known = known_scanning_methods(items);
            if known.len() != items.len() {
                repaired = true;
            }
            normalize_scanning_methods(&known)
        }
        Some(_) => return None,
    };

    Some((
        Record::new(
            id,
            RecordFields {
                major_location,
                minor_location,
                specific_name,
                item_name,
                quantity,
                photos,
                scanning_methods,
            },
        ),
        repaired,
    ))
}

/// 既知のスキャン方法のみ取り出す
fn known_scanning_methods(items: &[Value]) -> Vec<ScanningMethod> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<ScanningMethod>(item.clone()).ok())
        .collect()
}

fn decode_string_list(raw: Option<&str>) -> Result<Vec<String>> {
    match raw {
        Some(raw) => Ok(serde_json::from_str::<Option<Vec<String>>>(raw)?.unwrap_or_default()),
        None => Ok(Vec::new()),
    }
}
