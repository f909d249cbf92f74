use thiserror::Error;

/// アプリケーションのエラー
///
/// 利用者への通知は種類ごとに1回だけ行い、自動再試行はしない。
#[derive(Error, Debug)]
pub enum InventoryError {
    /// 必須項目不足・記録なし・スキーマ不正など共通ロジック由来
    #[error(transparent)]
    Common(#[from] field_inventory_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("保存データの読み書きに失敗: {0}")]
    Persistence(String),

    #[error("写真を取得できません: {0}")]
    PhotoAcquisition(String),

    #[error("写真へのアクセスが許可されていません")]
    PermissionDenied,

    #[error("出力する記録がありません")]
    NothingToExport,

    #[error("PDF出力に失敗しました: {0}")]
    Export(String),

    #[error("共有に失敗しました: {0}")]
    Share(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// 入力内容の不備（フォームはそのまま残る）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InventoryError::Common(field_inventory_common::Error::Validation(_))
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InventoryError::Common(field_inventory_common::Error::NotFound(_))
        )
    }

    /// 写真取得の失敗（権限拒否を含む）
    pub fn is_photo_acquisition(&self) -> bool {
        matches!(
            self,
            InventoryError::PhotoAcquisition(_) | InventoryError::PermissionDenied
        )
    }

    /// PDF出力の失敗（出力対象なしを含む）
    pub fn is_export(&self) -> bool {
        matches!(
            self,
            InventoryError::NothingToExport | InventoryError::Export(_) | InventoryError::Share(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
