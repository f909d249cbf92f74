//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use field_inventory::config::Config;
use field_inventory::error::InventoryError;
use field_inventory::photos::{scan_folder, DenyAll, GrantAll, PhotoImporter};
use field_inventory_common::{Error as CommonError, MissingField, RecordFields};
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let err = scan_folder(Path::new("/nonexistent/path/12345")).unwrap_err();
    assert!(matches!(err, InventoryError::PhotoAcquisition(_)));
}

/// 空のフォルダはエラーではなく空のVec
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    assert!(scan_folder(dir.path()).unwrap().is_empty());
}

/// 画像のないフォルダから取り込んだ場合
#[tokio::test]
async fn test_pick_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();

    let importer = PhotoImporter::new(Box::new(GrantAll), dir.path().join("photos"));
    let err = importer.pick(dir.path()).await.unwrap_err();
    assert!(err.is_photo_acquisition());
}

/// 権限がない場合はファイルの有無より先に拒否
#[tokio::test]
async fn test_pick_permission_denied() {
    let dir = tempdir().expect("Failed to create temp dir");
    let importer = PhotoImporter::new(Box::new(DenyAll), dir.path().join("photos"));

    let err = importer.pick(Path::new("/nonexistent")).await.unwrap_err();
    assert!(matches!(err, InventoryError::PermissionDenied));
    assert!(err.is_photo_acquisition());
}

#[tokio::test]
async fn test_capture_missing_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let importer = PhotoImporter::new(Box::new(GrantAll), dir.path().join("photos"));

    let err = importer.capture(&dir.path().join("none.jpg")).await.unwrap_err();
    assert!(matches!(err, InventoryError::PhotoAcquisition(_)));
    assert!(!dir.path().join("photos").exists());
}

/// 不足項目がすべて列挙される
#[test]
fn test_validation_lists_missing_fields() {
    let fields = RecordFields {
        major_location: "東大寺".to_string(),
        quantity: "  ".to_string(),
        ..Default::default()
    };
    let err: InventoryError = fields.validate().unwrap_err().into();
    assert!(err.is_validation());

    let InventoryError::Common(CommonError::Validation(missing)) = err else {
        panic!("expected validation error");
    };
    assert_eq!(
        missing,
        vec![
            MissingField::MinorLocation,
            MissingField::SpecificName,
            MissingField::ItemName,
            MissingField::Quantity,
            MissingField::Photos,
        ]
    );
}

#[test]
fn test_config_invalid_values() {
    let mut config = Config::default();
    let err = config.set_value("share", "bluetooth").unwrap_err();
    assert!(matches!(err, InventoryError::Config(_)));
    assert!(config.set_value("photo_access", "maybe").is_err());
    assert!(config.set_value("no_such_key", "1").is_err());
}

#[test]
fn test_config_invalid_json() {
    let result: Result<Config, _> = serde_json::from_str("{ not json");
    let err: InventoryError = result.unwrap_err().into();
    assert!(matches!(err, InventoryError::JsonParse(_)));
}
