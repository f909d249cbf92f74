//! 記録ストアの統合テスト
//!
//! 作成・更新・削除・履歴・保存データの読み込みを検証

use async_trait::async_trait;
use field_inventory::error::{InventoryError, Result};
use field_inventory::storage::{FileStore, KeyValueStore, MemoryStore};
use field_inventory::Inventory;
use field_inventory_common::{select, HistoryKind, RecordFields, ScanningMethod};
use tempfile::tempdir;

fn fields(minor: &str, item: &str) -> RecordFields {
    RecordFields {
        major_location: "東大寺".to_string(),
        minor_location: minor.to_string(),
        specific_name: format!("{}-{}", minor, item),
        item_name: item.to_string(),
        quantity: "1".to_string(),
        photos: vec![format!("/photos/{}.jpg", item)],
        scanning_methods: vec![],
    }
}

/// 書き込みが常に失敗するストア
struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(InventoryError::Persistence(format!("{}: disk full", key)))
    }
}

/// A, B, C を作成 → B を削除 → A を編集
#[tokio::test]
async fn test_create_delete_edit_scenario() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));

    let a = inventory.create(fields("Hall1", "A")).await.unwrap();
    let b = inventory.create(fields("Hall1", "B")).await.unwrap();
    let c = inventory.create(fields("Hall1", "C")).await.unwrap();
    assert_eq!(inventory.len(), 3);

    let order: Vec<i64> = select(inventory.records(), "").iter().map(|e| e.record.id).collect();
    assert_eq!(order, vec![c, b, a]);

    assert!(inventory.delete(b).await.unwrap());
    let order: Vec<i64> = select(inventory.records(), "").iter().map(|e| e.record.id).collect();
    assert_eq!(order, vec![c, a]);

    inventory.start_edit(a).unwrap();
    inventory.form_mut().fields.quantity = "5".to_string();
    let saved = inventory.submit_form().await.unwrap();
    assert_eq!(saved, a);

    assert_eq!(inventory.get(a).unwrap().quantity(), "5");
    let order: Vec<i64> = select(inventory.records(), "").iter().map(|e| e.record.id).collect();
    assert_eq!(order, vec![c, a]);
    assert!(!inventory.form().is_editing());
}

/// 作成後に読み込み直しても同じ内容
#[tokio::test]
async fn test_create_then_reload() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store_dir = dir.path().join("store");

    let mut original = fields("Hall1", "Lantern");
    original.scanning_methods = vec![ScanningMethod::Drone, ScanningMethod::Camera];

    let mut inventory = Inventory::empty(Box::new(FileStore::new(&store_dir)));
    let existing = inventory.create(fields("Hall0", "Bell")).await.unwrap();
    let id = inventory.create(original.clone()).await.unwrap();
    assert_ne!(id, existing);

    let reloaded = Inventory::load(Box::new(FileStore::new(&store_dir))).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get(id).unwrap().fields, original);
}

#[tokio::test]
async fn test_update_keeps_id_and_replaces_fields() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    let id = inventory.create(fields("Hall1", "A")).await.unwrap();

    let replacement = fields("Hall9", "Z");
    inventory.update(id, replacement.clone()).await.unwrap();

    let record = inventory.get(id).unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.fields, replacement);
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    let err = inventory.update(42, fields("Hall1", "A")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_missing_is_noop() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    inventory.create(fields("Hall1", "A")).await.unwrap();
    assert!(!inventory.delete(12345).await.unwrap());
    assert_eq!(inventory.len(), 1);
}

/// 編集中の記録を削除するとフォームも空になる
#[tokio::test]
async fn test_delete_editing_record_clears_form() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    let a = inventory.create(fields("Hall1", "A")).await.unwrap();
    let b = inventory.create(fields("Hall1", "B")).await.unwrap();

    inventory.start_edit(a).unwrap();
    assert_eq!(inventory.form().editing_record_id(), Some(a));

    let removed = inventory.delete_many(&[a, b]).await.unwrap();
    assert_eq!(removed, 2);
    assert!(!inventory.form().is_editing());
    assert_eq!(inventory.form().fields, RecordFields::default());
}

#[tokio::test]
async fn test_delete_other_record_keeps_form() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    let a = inventory.create(fields("Hall1", "A")).await.unwrap();
    let b = inventory.create(fields("Hall1", "B")).await.unwrap();

    inventory.start_edit(a).unwrap();
    inventory.delete(b).await.unwrap();
    assert_eq!(inventory.form().editing_record_id(), Some(a));
}

/// 検証エラー時はフォームも記録も変わらない
#[tokio::test]
async fn test_validation_error_preserves_form() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    inventory.form_mut().fields = RecordFields {
        photos: vec![],
        ..fields("Hall1", "A")
    };
    let before = inventory.form().clone();

    let err = inventory.submit_form().await.unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("写真"));
    assert_eq!(inventory.form(), &before);
    assert!(inventory.is_empty());
    assert!(inventory.location_history().is_empty());
}

/// 書き込みに失敗してもメモリ上の変更は残る
#[tokio::test]
async fn test_persistence_failure_keeps_mutation() {
    let mut inventory = Inventory::empty(Box::new(FailingStore));
    let err = inventory.create(fields("Hall1", "A")).await.unwrap_err();
    assert!(matches!(err, InventoryError::Persistence(_)));
    assert_eq!(inventory.len(), 1);
}

#[tokio::test]
async fn test_history_moves_to_front() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));

    for minor in ["Hall1", "Hall2", "Hall1"] {
        inventory.form_mut().fields = fields(minor, "Stone");
        inventory.submit_form().await.unwrap();
    }

    assert_eq!(inventory.location_history().entries(), ["Hall1", "Hall2"]);
    assert_eq!(inventory.item_type_history().entries(), ["Stone"]);
    assert_eq!(inventory.last_major_location(), Some("東大寺"));
}

#[tokio::test]
async fn test_history_untouched_by_delete_and_direct_create() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    inventory.form_mut().fields = fields("Hall1", "Stone");
    let id = inventory.submit_form().await.unwrap();

    inventory.create(fields("Hall2", "Wood")).await.unwrap();
    inventory.delete(id).await.unwrap();

    assert_eq!(inventory.location_history().entries(), ["Hall1"]);
}

#[tokio::test]
async fn test_remove_from_history() {
    let mut inventory = Inventory::empty(Box::new(MemoryStore::new()));
    inventory.form_mut().fields = fields("Hall1", "Stone");
    inventory.submit_form().await.unwrap();

    assert!(inventory.remove_from_history(HistoryKind::Location, "Hall1").await.unwrap());
    assert!(!inventory.remove_from_history(HistoryKind::Location, "Hall1").await.unwrap());
    assert!(inventory.history(HistoryKind::Location).is_empty());
    assert_eq!(inventory.history(HistoryKind::ItemType).entries(), ["Stone"]);
}

/// 次の新規入力は前回の地点を引き継ぐ
#[tokio::test]
async fn test_new_draft_prefills_major_location() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store_dir = dir.path().join("store");

    let mut inventory = Inventory::empty(Box::new(FileStore::new(&store_dir)));
    inventory.form_mut().fields = fields("Hall1", "Stone");
    inventory.submit_form().await.unwrap();
    inventory.new_draft();
    assert_eq!(inventory.form().fields.major_location, "東大寺");

    let reloaded = Inventory::load(Box::new(FileStore::new(&store_dir))).await.unwrap();
    assert_eq!(reloaded.form().fields.major_location, "東大寺");
    assert!(reloaded.form().fields.minor_location.is_empty());
}

/// 旧形式（バージョンなし）の保存データ
#[tokio::test]
async fn test_load_legacy_blobs() {
    let store = MemoryStore::new();
    store
        .set(
            "records",
            r#"[
                {"id": 1, "majorLocation": "A", "minorLocation": "B", "specificName": "C",
                 "itemName": "D", "quantity": "2", "photos": ["p.jpg"]},
                {"majorLocation": "no id"}
            ]"#,
        )
        .await
        .unwrap();
    store
        .set("locationHistory", r#"["a", "b", "c", "d", "e", "f"]"#)
        .await
        .unwrap();

    let inventory = Inventory::load(Box::new(store)).await.unwrap();
    assert_eq!(inventory.len(), 1);
    let record = inventory.get(1).unwrap();
    assert_eq!(record.item_name(), "D");
    assert!(record.scanning_methods().is_empty());

    assert_eq!(inventory.location_history().entries(), ["f", "e", "d", "c", "b"]);
    assert!(inventory.item_type_history().is_empty());
}

/// 形式の崩れた記録も、読み込み後の保存で消えない
#[tokio::test]
async fn test_loose_records_survive_mutation_and_reload() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store_dir = dir.path().join("store");
    let store = FileStore::new(&store_dir);
    store.set("schemaVersion", "2").await.unwrap();
    store
        .set(
            "records",
            r#"[
                {"id": 1, "majorLocation": "A", "minorLocation": "B", "specificName": "C",
                 "itemName": "D", "quantity": 3, "photos": ["p.jpg"], "scanningMethods": ["laser", "camera"]},
                {"id": [2], "majorLocation": "broken"}
            ]"#,
        )
        .await
        .unwrap();

    let mut inventory = Inventory::load(Box::new(FileStore::new(&store_dir))).await.unwrap();
    assert_eq!(inventory.len(), 1);
    let loose = inventory.get(1).unwrap();
    assert_eq!(loose.quantity(), "3");
    assert_eq!(loose.scanning_methods(), [ScanningMethod::Camera]);

    let added = inventory.create(fields("Hall1", "A")).await.unwrap();

    let reloaded = Inventory::load(Box::new(FileStore::new(&store_dir))).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get(1).unwrap().quantity(), "3");
    assert!(reloaded.get(added).is_some());

    let raw = FileStore::new(&store_dir).get("records").await.unwrap().unwrap();
    assert!(raw.contains("broken"));
}

/// 時計を固定するとidは既存の最大id+1で採番される
#[tokio::test]
async fn test_ids_from_fixed_clock() {
    fn fixed_clock() -> i64 {
        1_000
    }

    let mut inventory = Inventory::empty(Box::new(MemoryStore::new())).with_clock(fixed_clock);
    let first = inventory.create(fields("Hall1", "A")).await.unwrap();
    let second = inventory.create(fields("Hall1", "B")).await.unwrap();
    assert_eq!(first, 1_000);
    assert_eq!(second, 1_001);
}

#[tokio::test]
async fn test_load_newer_schema_fails() {
    let store = MemoryStore::new();
    store.set("schemaVersion", "99").await.unwrap();

    let result = Inventory::load(Box::new(store)).await;
    assert!(matches!(result, Err(InventoryError::Persistence(_))));
}

#[tokio::test]
async fn test_load_empty_store() {
    let inventory = Inventory::load(Box::new(MemoryStore::new())).await.unwrap();
    assert!(inventory.is_empty());
    assert!(inventory.location_history().is_empty());
    assert_eq!(inventory.last_major_location(), None);
}
