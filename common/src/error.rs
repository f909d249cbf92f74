//! エラー型定義

use crate::types::MissingField;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 必須項目の不足（不足項目をすべて列挙する）
    #[error("必須項目が未入力です: {}", join_missing(.0))]
    Validation(Vec<MissingField>),

    #[error("記録が見つかりません: id={0}")]
    NotFound(i64),

    #[error("保存データの形式が不正: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),
}

fn join_missing(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join("、")
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation_lists_fields() {
        let error = Error::Validation(vec![MissingField::ItemName, MissingField::Photos]);
        let display = format!("{}", error);
        assert!(display.contains(MissingField::ItemName.label()));
        assert!(display.contains(MissingField::Photos.label()));
    }

    #[test]
    fn test_error_display_not_found() {
        let error = Error::NotFound(42);
        assert!(format!("{}", error).contains("42"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Config("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Config"));
        assert!(debug.contains("テスト"));
    }
}
