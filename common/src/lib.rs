//! Field Inventory Common Library
//!
//! 記録・入力フォーム・履歴・検索・保存形式・報告書レイアウトなど、
//! 入出力を伴わない共通ロジック

pub mod types;
pub mod layout;
pub mod error;
pub mod form;
pub mod history;
pub mod query;
pub mod schema;
pub mod export;

pub use types::{MissingField, Record, RecordFields, ScanningMethod};
pub use error::{Error, Result};
pub use form::{FormMode, FormState};
pub use history::{HistoryKind, HistoryList, HISTORY_CAP};
pub use query::{clamp_page, filter, page_count, paginate, select, sort_newest_first, Sequenced};
pub use schema::{LoadReport, PersistedState, RawBlobs, SCHEMA_VERSION};
pub use export::{build_report_html, escape_html, PhotoCell, ReportRow, PHOTO_PLACEHOLDER};
