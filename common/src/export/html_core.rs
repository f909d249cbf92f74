//! 報告書HTMLの組み立て
//!
//! 写真は呼び出し側でエンコード済みのものを受け取る（PhotoCell）。
//! 1記録 = 1行、行の順序は呼び出し側の並びのまま。

use crate::layout::{report_columns, ColumnDefinition, MARGIN_MM, THUMBNAIL_DISPLAY_MAX_PX};
use crate::query::Sequenced;
use crate::types::ScanningMethod;

/// 写真エンコード失敗時にセルへ入れる目印
pub const PHOTO_PLACEHOLDER: &str = "[img err]";

/// 写真セルの中身
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoCell {
    /// base64エンコード済み画像
    Embedded { mime: String, base64: String },
    /// 読み込み・変換に失敗
    Failed,
}

impl PhotoCell {
    pub fn data_uri(&self) -> Option<String> {
        match self {
            PhotoCell::Embedded { mime, base64 } => Some(format!("data:{};base64,{}", mime, base64)),
            PhotoCell::Failed => None,
        }
    }
}

/// 報告書の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub seq: usize,
    pub major_location: String,
    pub minor_location: String,
    pub specific_name: String,
    pub item_name: String,
    pub quantity: String,
    pub scanning_methods: Vec<ScanningMethod>,
    pub photos: Vec<PhotoCell>,
}

impl ReportRow {
    pub fn from_sequenced(entry: &Sequenced<'_>, photos: Vec<PhotoCell>) -> Self {
        let record = entry.record;
        Self {
            seq: entry.seq,
            major_location: record.major_location().to_string(),
            minor_location: record.minor_location().to_string(),
            specific_name: record.specific_name().to_string(),
            item_name: record.item_name().to_string(),
            quantity: record.quantity().to_string(),
            scanning_methods: record.scanning_methods().to_vec(),
            photos,
        }
    }

    /// 列キーに対応するテキスト（写真列は除く）
    pub fn text_for(&self, key: &str, ascii: bool) -> String {
        match key {
            "seq" => self.seq.to_string(),
            "majorLocation" => self.major_location.clone(),
            "minorLocation" => self.minor_location.clone(),
            "specificName" => self.specific_name.clone(),
            "itemName" => self.item_name.clone(),
            "quantity" => self.quantity.clone(),
            "scanningMethods" => self
                .scanning_methods
                .iter()
                .map(|m| if ascii { m.ascii_label() } else { m.label() })
                .collect::<Vec<_>>()
                .join(if ascii { ", " } else { "、" }),
            _ => String::new(),
        }
    }
}

/// スキャン方法の列を出すか（いずれかの行に値がある場合のみ）
pub fn has_scanning_methods(rows: &[ReportRow]) -> bool {
    rows.iter().any(|r| !r.scanning_methods.is_empty())
}

/// 印刷用スタイル（A4・余白・行の分割禁止・ヘッダー行の繰り返し）
fn report_styles() -> String {
    format!(
        r#"
      @page {{ size: A4; margin: {margin}mm; }}
      body {{ font-family: "Noto Sans CJK JP", "Hiragino Sans", Arial, sans-serif; -webkit-print-color-adjust: exact; }}
      table {{ width: 100%; border-collapse: collapse; table-layout: fixed; }}
      thead {{ display: table-header-group; }}
      tr {{ page-break-inside: avoid; break-inside: avoid; }}
      th, td {{ border: 1px solid #ccc; padding: 8px; text-align: center; word-wrap: break-word; }}
      th {{ background-color: #4CAF50 !important; color: white !important; font-weight: bold; }}
      tr:nth-child(even) {{ background-color: #f2f2f2 !important; }}
      h1 {{ text-align: center; font-size: 18px; }}
      img {{ max-width: {thumb}px; max-height: {thumb}px; margin: 2px; object-fit: cover; }}
      .photos-container {{ display: flex; flex-wrap: wrap; justify-content: center; align-items: center; }}
      .photos-cell {{ max-height: 120px; overflow: hidden; vertical-align: top; }}
      .img-error {{ color: red; }}
    "#,
        margin = MARGIN_MM,
        thumb = THUMBNAIL_DISPLAY_MAX_PX,
    )
}

fn photos_html(photos: &[PhotoCell]) -> String {
    let mut html = String::from(r#"<div class="photos-container">"#);
    for photo in photos {
        match photo.data_uri() {
            Some(uri) => {
                html.push_str(r#"<img src=""#);
                html.push_str(&uri);
                html.push_str(r#"" />"#);
            }
            None => {
                html.push_str(r#"<p class="img-error">"#);
                html.push_str(PHOTO_PLACEHOLDER);
                html.push_str("</p>");
            }
        }
    }
    html.push_str("</div>");
    html
}

fn row_html(row: &ReportRow, columns: &[ColumnDefinition]) -> String {
    let mut html = String::from("<tr>");
    for column in columns {
        if column.key == "photos" {
            html.push_str(r#"<td class="photos-cell">"#);
            html.push_str(&photos_html(&row.photos));
            html.push_str("</td>");
        } else {
            html.push_str("<td>");
            html.push_str(&escape_html(&row.text_for(column.key, false)));
            html.push_str("</td>");
        }
    }
    html.push_str("</tr>\n");
    html
}

/// 報告書HTMLを生成
pub fn build_report_html(title: &str, rows: &[ReportRow]) -> String {
    let columns = report_columns(has_scanning_methods(rows));

    let col_widths: String = columns
        .iter()
        .map(|c| format!(r#"<col width="{}%">"#, c.width_percent))
        .collect();
    let header: String = columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c.label)))
        .collect();
    let body: String = rows.iter().map(|row| row_html(row, columns)).collect();
    let title = escape_html(title);

    format!(
        r#"<html><head><meta charset="UTF-8"><title>{title}</title><style>{styles}</style></head>
<body><h1>{title}</h1><table>
{col_widths}
<thead><tr>{header}</tr></thead>
<tbody>
{body}</tbody>
</table></body></html>"#,
        title = title,
        styles = report_styles(),
        col_widths = col_widths,
        header = header,
        body = body,
    )
}

/// HTML特殊文字のエスケープ
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
