//! 入力フォームの状態
//!
//! editing_record_id が None なら新規作成、Some(id) なら既存記録の上書き。

use crate::error::Result;
use crate::types::{normalize_scanning_methods, Record, RecordFields, ScanningMethod};

/// フォームのモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub fields: RecordFields,
    editing_record_id: Option<i64>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前回の地点名を引き継いだ新規フォーム
    pub fn prefilled(last_major_location: Option<&str>) -> Self {
        let mut form = Self::new();
        if let Some(major) = last_major_location {
            form.fields.major_location = major.to_string();
        }
        form
    }

    pub fn mode(&self) -> FormMode {
        match self.editing_record_id {
            Some(id) => FormMode::Edit(id),
            None => FormMode::Create,
        }
    }

    pub fn editing_record_id(&self) -> Option<i64> {
        self.editing_record_id
    }

    pub fn is_editing(&self) -> bool {
        self.editing_record_id.is_some()
    }

    /// 既存記録を読み込んで編集モードに入る
    pub fn load_record(&mut self, record: &Record) {
        self.fields = record.fields.clone();
        self.editing_record_id = Some(record.id);
    }

    /// 全項目を空にして新規作成モードに戻す
    pub fn clear(&mut self) {
        self.fields = RecordFields::default();
        self.editing_record_id = None;
    }

    pub fn add_photos<I>(&mut self, photos: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.fields.photos.extend(photos);
    }

    /// 範囲外のインデックスは無視
    pub fn remove_photo_at(&mut self, index: usize) -> Option<String> {
        if index < self.fields.photos.len() {
            Some(self.fields.photos.remove(index))
        } else {
            None
        }
    }

    pub fn set_scanning_methods(&mut self, methods: &[ScanningMethod]) {
        self.fields.scanning_methods = normalize_scanning_methods(methods);
    }

    pub fn validate(&self) -> Result<()> {
        self.fields.validate()
    }
}
