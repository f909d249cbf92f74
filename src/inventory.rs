//! 記録ストア
//!
//! 記録一覧・入力履歴・入力フォームをまとめて保持する。
//! 起動時に一度だけ読み込み、変更のたびに全体を書き直す（差分保存はしない）。
//! 書き込みに失敗してもメモリ上の変更は取り消さない。

use crate::error::{InventoryError, Result};
use crate::storage::KeyValueStore;
use field_inventory_common::schema::keys;
use field_inventory_common::{
    Error as CommonError, FormState, HistoryKind, HistoryList, PersistedState, RawBlobs, Record,
    RecordFields,
};
use tracing::{debug, info, warn};

/// 現在時刻（ミリ秒）
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 新しいid（時刻が既存の最大id以下なら最大id+1）
pub fn next_id(now: i64, records: &[Record]) -> i64 {
    match records.iter().map(|r| r.id).max() {
        Some(max) if now <= max => max + 1,
        _ => now,
    }
}

pub struct Inventory {
    storage: Box<dyn KeyValueStore>,
    state: PersistedState,
    form: FormState,
    clock: fn() -> i64,
}

impl Inventory {
    /// 空の状態で作成（読み込みも書き込みもしない）
    pub fn empty(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: PersistedState::default(),
            form: FormState::new(),
            clock: now_millis,
        }
    }

    /// 保存済みの状態を読み込む。キーが無ければ空として扱う
    pub async fn load(storage: Box<dyn KeyValueStore>) -> Result<Self> {
        let mut blobs = RawBlobs::default();
        for key in keys::ALL {
            let value = storage.get(key).await?;
            blobs.set(key, value);
        }

        let (state, report) = PersistedState::decode(&blobs)
            .map_err(|e| InventoryError::Persistence(e.to_string()))?;

        if report.repaired_records > 0 {
            warn!(repaired = report.repaired_records, "値を補正して読み込んだ記録があります");
        }
        if report.unreadable_records > 0 {
            warn!(
                unreadable = report.unreadable_records,
                "解釈できない記録があります（元のまま保持します）"
            );
        }
        if report.migrated() && !state.records.is_empty() {
            info!(from = report.source_version, "旧形式の保存データを読み込みました");
        }
        debug!(records = state.records.len(), "保存データを読み込みました");

        let form = FormState::prefilled(state.last_major_location.as_deref());
        Ok(Self {
            storage,
            state,
            form,
            clock: now_millis,
        })
    }

    /// id生成に使う時計を差し替える
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// 状態全体を書き込む
    pub async fn save(&self) -> Result<()> {
        let entries = self
            .state
            .encode()
            .map_err(|e| InventoryError::Persistence(e.to_string()))?;
        for (key, value) in entries {
            self.storage.set(key, &value).await?;
        }
        debug!(records = self.state.records.len(), "保存しました");
        Ok(())
    }

    // ============================================
    // 参照
    // ============================================

    pub fn records(&self) -> &[Record] {
        &self.state.records
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.state.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.state.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.records.is_empty()
    }

    pub fn location_history(&self) -> &HistoryList {
        &self.state.location_history
    }

    pub fn item_type_history(&self) -> &HistoryList {
        &self.state.item_type_history
    }

    pub fn history(&self, kind: HistoryKind) -> &HistoryList {
        match kind {
            HistoryKind::Location => &self.state.location_history,
            HistoryKind::ItemType => &self.state.item_type_history,
        }
    }

    pub fn last_major_location(&self) -> Option<&str> {
        self.state.last_major_location.as_deref()
    }

    // ============================================
    // 記録の作成・更新・削除
    // ============================================

    /// 検証して末尾に追加し、保存する
    pub async fn create(&mut self, fields: RecordFields) -> Result<i64> {
        let id = self.insert_record(fields)?;
        self.save().await?;
        Ok(id)
    }

    /// id以外の全項目を置き換えて保存する
    pub async fn update(&mut self, id: i64, fields: RecordFields) -> Result<()> {
        self.replace_record(id, fields)?;
        self.save().await
    }

    /// 存在しないidは無視する。編集中の記録ならフォームも破棄する
    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let removed = self.delete_many(&[id]).await?;
        Ok(removed > 0)
    }

    pub async fn delete_many(&mut self, ids: &[i64]) -> Result<usize> {
        let before = self.state.records.len();
        self.state.records.retain(|r| !ids.contains(&r.id));
        let removed = before - self.state.records.len();

        if let Some(editing) = self.form.editing_record_id() {
            if ids.contains(&editing) {
                self.form.clear();
            }
        }

        info!(removed, "記録を削除しました");
        self.save().await?;
        Ok(removed)
    }

    fn insert_record(&mut self, fields: RecordFields) -> Result<i64> {
        fields.validate()?;
        let id = next_id((self.clock)(), &self.state.records);
        self.state.records.push(Record::new(id, fields));
        info!(id, "記録を追加しました");
        Ok(id)
    }

    fn replace_record(&mut self, id: i64, fields: RecordFields) -> Result<()> {
        fields.validate()?;
        let record = self
            .state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CommonError::NotFound(id))?;
        record.fields = fields;
        info!(id, "記録を更新しました");
        Ok(())
    }

    // ============================================
    // 入力履歴
    // ============================================

    fn record_location_used(&mut self, value: &str) {
        self.state.location_history.record_used(value);
    }

    fn record_item_type_used(&mut self, value: &str) {
        self.state.item_type_history.record_used(value);
    }

    /// 履歴から完全一致で削除して保存する
    pub async fn remove_from_history(&mut self, kind: HistoryKind, value: &str) -> Result<bool> {
        let removed = match kind {
            HistoryKind::Location => self.state.location_history.remove(value),
            HistoryKind::ItemType => self.state.item_type_history.remove(value),
        };
        if removed {
            self.save().await?;
        }
        Ok(removed)
    }

    // ============================================
    // 入力フォーム
    // ============================================

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// 新規入力を始める（前回の地点名を引き継ぐ）
    pub fn new_draft(&mut self) {
        self.form = FormState::prefilled(self.state.last_major_location.as_deref());
    }

    /// 既存記録をフォームに読み込んで編集モードにする
    pub fn start_edit(&mut self, id: i64) -> Result<()> {
        let record = self
            .state
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or(CommonError::NotFound(id))?;
        self.form.load_record(record);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.form.clear();
    }

    /// フォームの内容を保存する
    ///
    /// 検証エラー・対象なしの場合はフォームを変更しない。
    /// 成功時は履歴を更新し、フォームを空にして新規作成モードへ戻す。
    pub async fn submit_form(&mut self) -> Result<i64> {
        let fields = self.form.fields.clone();
        let id = match self.form.editing_record_id() {
            Some(id) => {
                self.replace_record(id, fields.clone())?;
                id
            }
            None => self.insert_record(fields.clone())?,
        };

        self.record_location_used(&fields.minor_location);
        self.record_item_type_used(&fields.item_name);
        let major = fields.major_location.trim();
        if !major.is_empty() {
            self.state.last_major_location = Some(major.to_string());
        }

        self.form.clear();
        self.save().await?;
        Ok(id)
    }
}
