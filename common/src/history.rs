//! 入力履歴（最近使った値）
//!
//! 区域・種類の入力候補。先頭が最新、重複なし、最大 HISTORY_CAP 件。
//! 記録の保存成功時のみ更新され、記録の削除では変化しない。

use serde::{Deserialize, Serialize};

/// 履歴の上限件数
pub const HISTORY_CAP: usize = 5;

/// 履歴の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    /// 区域（minorLocation）
    Location,
    /// 種類（itemName）
    ItemType,
}

impl std::str::FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location" | "loc" => Ok(HistoryKind::Location),
            "item" | "item-type" | "itemtype" => Ok(HistoryKind::ItemType),
            _ => Err(format!("Unknown history: {}. Use location or item", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryList {
    entries: Vec<String>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 先頭が最新の並びから構築（重複除去・上限適用）
    pub fn from_recent_first<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        let mut collected: Vec<String> = values.into_iter().map(Into::into).collect();
        // 末尾から積むと先頭側が最新として残る
        collected.reverse();
        for value in collected {
            list.record_used(&value);
        }
        list
    }

    /// 旧形式（末尾追加・上限なし）から構築
    pub fn from_append_order<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for value in values {
            list.record_used(&value.into());
        }
        list
    }

    /// 値を先頭に追加し、既存の同一値を除去して上限で切り詰める
    pub fn record_used(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.entries.retain(|e| e != value);
        self.entries.insert(0, value.to_string());
        self.entries.truncate(HISTORY_CAP);
    }

    /// 完全一致で削除。存在しなければ何もしない
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != value);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_used_moves_to_front() {
        let mut history = HistoryList::from_recent_first(["Hall1"]);
        history.record_used("Hall2");
        assert_eq!(history.entries(), ["Hall2", "Hall1"]);

        history.record_used("Hall1");
        assert_eq!(history.entries(), ["Hall1", "Hall2"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = HistoryList::new();
        for i in 1..=7 {
            history.record_used(&format!("H{}", i));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.entries(), ["H7", "H6", "H5", "H4", "H3"]);
    }

    #[test]
    fn test_case_sensitive_match() {
        let mut history = HistoryList::new();
        history.record_used("hall");
        history.record_used("Hall");
        assert_eq!(history.entries(), ["Hall", "hall"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut history = HistoryList::from_recent_first(["A", "B"]);
        assert!(!history.remove("C"));
        assert!(history.remove("A"));
        assert_eq!(history.entries(), ["B"]);
    }

    #[test]
    fn test_blank_values_ignored() {
        let mut history = HistoryList::new();
        history.record_used("  ");
        assert!(history.is_empty());
    }

    #[test]
    fn test_from_append_order_reverses_and_caps() {
        let history = HistoryList::from_append_order(["a", "b", "c", "b", "d", "e", "f"]);
        assert_eq!(history.entries(), ["f", "e", "d", "b", "c"]);
    }

    #[test]
    fn test_from_recent_first_dedup_keeps_front() {
        let history = HistoryList::from_recent_first(["x", "y", "x", "z"]);
        assert_eq!(history.entries(), ["x", "y", "z"]);
    }
}
