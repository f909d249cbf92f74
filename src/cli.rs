use clap::{Parser, Subcommand};
use field_inventory_common::{HistoryKind, ScanningMethod};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "field-inventory")]
#[command(about = "現地調査の記録・写真管理とPDF報告書出力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 記録を追加
    Add {
        /// 地点（省略時は前回の地点）
        #[arg(long)]
        major: Option<String>,

        /// 区域
        #[arg(long)]
        minor: String,

        /// 名称
        #[arg(long)]
        specific: String,

        /// 種類
        #[arg(long)]
        item: String,

        /// 数量
        #[arg(short, long)]
        quantity: String,

        /// 撮影済み写真（複数指定可）
        #[arg(short, long = "photo")]
        photos: Vec<PathBuf>,

        /// 写真フォルダ（直下の画像をすべて取り込む）
        #[arg(short, long)]
        gallery: Option<PathBuf>,

        /// スキャン方法 (drone/handheld/camera/stationary)
        #[arg(short, long = "scan")]
        scanning: Vec<ScanningMethod>,
    },

    /// 記録を編集（指定した項目のみ変更）
    Edit {
        /// 記録ID
        #[arg(required = true)]
        id: i64,

        #[arg(long)]
        major: Option<String>,

        #[arg(long)]
        minor: Option<String>,

        #[arg(long)]
        specific: Option<String>,

        #[arg(long)]
        item: Option<String>,

        #[arg(short, long)]
        quantity: Option<String>,

        /// 写真を追加
        #[arg(long = "add-photo")]
        add_photos: Vec<PathBuf>,

        /// 写真フォルダから追加
        #[arg(short, long)]
        gallery: Option<PathBuf>,

        /// 写真を削除（show で表示される番号、1始まり）
        #[arg(long = "remove-photo")]
        remove_photos: Vec<usize>,

        /// スキャン方法を置き換え
        #[arg(short, long = "scan")]
        scanning: Vec<ScanningMethod>,

        /// スキャン方法をすべて外す
        #[arg(long)]
        clear_scan: bool,
    },

    /// 記録を削除
    Delete {
        /// 記録ID（複数指定可）
        #[arg(required = true)]
        ids: Vec<i64>,

        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 記録一覧（新しい順）
    List {
        /// 検索語（地点・区域・名称・種類の部分一致）
        #[arg(short, long, default_value = "")]
        query: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// 1ページの件数（省略時は設定値）
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// 記録の詳細
    Show {
        #[arg(required = true)]
        id: i64,
    },

    /// 入力履歴の表示・削除
    History {
        /// 履歴の種類 (location/item)
        #[arg(short, long, default_value = "location")]
        kind: HistoryKind,

        /// 指定した値を履歴から削除
        #[arg(long)]
        remove: Option<String>,
    },

    /// PDF報告書を出力
    Export {
        /// 検索語（一致する記録のみ出力）
        #[arg(short, long, default_value = "")]
        query: String,

        /// 出力PDFファイル（デフォルト: データディレクトリ/exports）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 報告書タイトル（省略時は設定値）
        #[arg(short, long)]
        title: Option<String>,
    },

    /// 設定を表示・変更
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 設定を変更（キー 値）
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,
    },
}

impl Commands {
    /// 保存データを書き換えるコマンド
    pub fn mutates(&self) -> bool {
        match self {
            Commands::Add { .. } | Commands::Edit { .. } | Commands::Delete { .. } => true,
            Commands::History { remove, .. } => remove.is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from([
            "field-inventory", "add", "--minor", "Hall1", "--specific", "Lantern",
            "--item", "Stone", "-q", "2", "-p", "a.jpg", "-p", "b.jpg", "--scan", "drone",
        ]);
        let Commands::Add { major, photos, scanning, .. } = cli.command else {
            panic!("expected add");
        };
        assert!(major.is_none());
        assert_eq!(photos.len(), 2);
        assert_eq!(scanning, vec![ScanningMethod::Drone]);
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::parse_from(["field-inventory", "config", "--set", "share", "system"]);
        let Commands::Config { set, .. } = cli.command else {
            panic!("expected config");
        };
        assert_eq!(set, Some(vec!["share".to_string(), "system".to_string()]));
    }

    #[test]
    fn test_mutates() {
        let cli = Cli::parse_from(["field-inventory", "history", "--kind", "item"]);
        assert!(!cli.command.mutates());
        let cli = Cli::parse_from(["field-inventory", "history", "--remove", "Hall1"]);
        assert!(cli.command.mutates());
        let cli = Cli::parse_from(["field-inventory", "delete", "1", "2", "-y"]);
        assert!(cli.command.mutates());
    }
}
