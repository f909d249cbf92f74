//! 検索・並び替え・ページ分割
//!
//! すべて純粋関数。表示順は常に id の降順（新しい順）で固定。

use crate::types::Record;
use std::borrow::Borrow;
use std::cmp::Reverse;

/// 既定の1ページあたり件数
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 通し番号付きの記録（新しい順に 1 から採番、絞り込み前に確定）
#[derive(Debug, Clone, Copy)]
pub struct Sequenced<'a> {
    pub seq: usize,
    pub record: &'a Record,
}

/// 4項目のいずれかに部分一致するか（大文字小文字を区別しない）
pub fn matches(record: &Record, query: &str) -> bool {
    let query = query.to_lowercase();
    if query.is_empty() {
        return true;
    }
    [
        record.major_location(),
        record.minor_location(),
        record.specific_name(),
        record.item_name(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&query))
}

/// 検索語で絞り込み（空の検索語は全件、順序は維持）
pub fn filter<'a, I>(records: I, query: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|record| matches(record, query))
        .collect()
}

/// 新しい順に並び替え（安定ソート）
pub fn sort_newest_first<R: Borrow<Record>>(records: &mut [R]) {
    records.sort_by_key(|r| Reverse(<R as Borrow<Record>>::borrow(r).id));
}

/// 新しい順の参照一覧
pub fn sorted_newest_first(records: &[Record]) -> Vec<&Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sort_newest_first(&mut sorted);
    sorted
}

/// 新しい順に並べて通し番号を振る
pub fn sequence(records: &[Record]) -> Vec<Sequenced<'_>> {
    sorted_newest_first(records)
        .into_iter()
        .enumerate()
        .map(|(i, record)| Sequenced { seq: i + 1, record })
        .collect()
}

/// 並び替え → 採番 → 絞り込み（一覧表示・出力で共通）
pub fn select<'a>(records: &'a [Record], query: &str) -> Vec<Sequenced<'a>> {
    sequence(records)
        .into_iter()
        .filter(|s| matches(s.record, query))
        .collect()
}

/// ページ切り出し（1始まり、範囲外は空）
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// 総ページ数 = ceil(total / page_size)
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// 削除などでページ数が減ったときに有効なページへ丸める（最小1）
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    let last = page_count(total, page_size).max(1);
    page.clamp(1, last)
}
