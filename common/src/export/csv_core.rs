//! 区切りテキスト（CSV）生成
//!
//! カンマ・ダブルクォート・改行を含むフィールドだけをクォートする。
//! それ以外はそのまま出力するので、通常の品目名・出典は素のカンマ区切りになる。

use super::{ExportRow, HEADERS};

/// ヘッダー行 + 品目行を改行区切りで返す（末尾改行なし）
pub fn encode(rows: &[ExportRow<'_>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(join_fields(&HEADERS));

    for row in rows {
        let value = row.value_text();
        lines.push(join_fields(&[row.item, value.as_str(), row.source]));
    }

    lines.join("\n")
}

fn join_fields(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// RFC 4180 形式のクォート
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_field() {
        assert_eq!(escape_field("Coffee Table"), "Coffee Table");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escape_comma_and_quote() {
        assert_eq!(escape_field("Sofa, sectional"), "\"Sofa, sectional\"");
        assert_eq!(escape_field("84\" TV"), "\"84\"\" TV\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_encode_header_only() {
        assert_eq!(encode(&[]), "Item,Estimated Value ($),Source");
    }

    #[test]
    fn test_encode_rows() {
        let rows = vec![
            ExportRow { item: "Rug", value: Some(450.0), source: "Home Decor" },
            ExportRow { item: "Bookshelf", value: None, source: "Manual Entry" },
        ];
        assert_eq!(
            encode(&rows),
            "Item,Estimated Value ($),Source\nRug,450.00,Home Decor\nBookshelf,0.00,Manual Entry"
        );
    }
}
