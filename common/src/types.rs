//! 検出結果の型定義
//!
//! 検出サービス・シミュレーション・セッションファイルで共有される型:
//! - BoundingBox: 画像サイズで正規化された矩形（左上原点、各値0〜1）
//! - DetectedItem: 検出された品目と評価額の出典
//! - Provenance: 評価額の出典（手動入力で上書きされたかどうか）

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 出典が無い、または手動で上書きされた場合の出典表記
pub const MANUAL_ENTRY: &str = "Manual Entry";

/// 正規化座標の矩形
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// [0,1]に収まるよう補正した矩形を返す
    ///
    /// `x + width <= 1` と `y + height <= 1` を保証する。非有限値は0として扱う。
    pub fn clamped(&self) -> Self {
        let x = unit(self.x);
        let y = unit(self.y);
        Self {
            x,
            y,
            width: unit(self.width).min(1.0 - x),
            height: unit(self.height).min(1.0 - y),
        }
    }

    pub fn is_normalized(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }
}

fn unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 品目の補足情報（表示のみ）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
}

impl ItemDetails {
    /// "Color: …" 形式の表示行
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(color) = &self.color {
            lines.push(format!("Color: {}", color));
        }
        if let Some(material) = &self.material {
            lines.push(format!("Material: {}", material));
        }
        if let Some(dimensions) = &self.dimensions {
            lines.push(format!("Size: {}", dimensions));
        }
        lines
    }
}

/// 検出された品目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    pub id: String,
    pub label: String,
    pub bounding_box: BoundingBox,

    /// None は未評価
    #[serde(default)]
    pub estimated_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// 一度trueになったらセッション中はfalseに戻らない
    #[serde(default)]
    pub is_price_modified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ItemDetails>,
}

/// 評価額の出典
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance<'a> {
    /// 手動で上書き済み（元の出典は表示しない）
    Manual,
    Sourced {
        source: &'a str,
        url: Option<&'a str>,
    },
    Unsourced,
}

impl<'a> Provenance<'a> {
    /// エクスポートの Source 列に出力する文字列
    pub fn export_label(&self) -> &'a str {
        match *self {
            Provenance::Sourced { source, .. } => source,
            Provenance::Manual | Provenance::Unsourced => MANUAL_ENTRY,
        }
    }
}

impl DetectedItem {
    pub fn provenance(&self) -> Provenance<'_> {
        if self.is_price_modified {
            return Provenance::Manual;
        }
        // 空文字の出典・URLは無いものとして扱う
        let url = self.source_url.as_deref().filter(|u| !u.trim().is_empty());
        match self.value_source.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(source) => Provenance::Sourced { source, url },
            None => Provenance::Unsourced,
        }
    }

    /// 未評価は0として扱う
    pub fn value_or_zero(&self) -> f64 {
        self.estimated_value.unwrap_or(0.0)
    }
}

/// 評価額の合計（未評価は0）
pub fn total_value(items: &[DetectedItem]) -> f64 {
    items.iter().map(DetectedItem::value_or_zero).sum()
}

/// 検出結果を取り込み可能な形に整える
///
/// - 矩形を[0,1]に補正
/// - 非有限の評価額は未評価に
/// - 重複IDには `-2`, `-3` … を付与
pub fn normalize_items(items: Vec<DetectedItem>) -> Vec<DetectedItem> {
    let mut seen: HashSet<String> = HashSet::new();

    items
        .into_iter()
        .map(|mut item| {
            if !item.bounding_box.is_normalized() {
                tracing::warn!(id = %item.id, "bounding box outside [0,1], clamping");
                item.bounding_box = item.bounding_box.clamped();
            }

            if item.estimated_value.is_some_and(|v| !v.is_finite()) {
                item.estimated_value = None;
            }

            if seen.contains(&item.id) {
                let mut n = 2;
                while seen.contains(&format!("{}-{}", item.id, n)) {
                    n += 1;
                }
                let renamed = format!("{}-{}", item.id, n);
                tracing::warn!(id = %item.id, renamed = %renamed, "duplicate item id");
                item.id = renamed;
            }
            seen.insert(item.id.clone());

            item
        })
        .collect()
}

/// 小数2桁の数値文字列（未評価は "0.00"）
pub fn format_value(value: Option<f64>) -> String {
    let v = value.unwrap_or(0.0);
    let fixed = fixed_2(v.abs());
    if v < 0.0 {
        format!("-{}", fixed)
    } else {
        fixed
    }
}

/// 非負値を小数2桁に丸める
///
/// ちょうど中間の値（10.125 など）は切り上げる。`{:.2}` は偶数丸めなので
/// 中間値だけ別扱いにする。-0 は 0 になる。
fn fixed_2(abs: f64) -> String {
    let scaled = abs * 100.0;
    // mul_add で積の丸め誤差を正確に求め、真の積が k+0.5 のときだけ中間値とみなす
    let is_tie = scaled.fract() == 0.5 && abs.mul_add(100.0, -scaled) == 0.0;
    if is_tie {
        format!("{:.2}", (scaled + 0.5) / 100.0)
    } else {
        format!("{:.2}", abs)
    }
}

/// "$1,200.00" 形式の金額表示
pub fn format_currency(value: Option<f64>) -> String {
    let v = value.unwrap_or(0.0);
    let fixed = fixed_2(v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

/// "7 items detected"
pub fn item_count_summary(count: usize) -> String {
    format!("{} {} detected", count, if count == 1 { "item" } else { "items" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, value: Option<f64>) -> DetectedItem {
        DetectedItem {
            id: id.to_string(),
            label: format!("Item {}", id),
            bounding_box: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
            estimated_value: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_detected_item_deserialize_wire_format() {
        let json = r#"{
            "id": "1",
            "label": "Sofa",
            "boundingBox": {"x": 0.1, "y": 0.3, "width": 0.4, "height": 0.3},
            "estimatedValue": 1200,
            "valueSource": "Furniture Marketplace",
            "sourceUrl": "https://furnitureshop.example.com/sofas/modern-sectional",
            "isPriceModified": false
        }"#;

        let item: DetectedItem = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(item.label, "Sofa");
        assert_eq!(item.bounding_box.width, 0.4);
        assert_eq!(item.estimated_value, Some(1200.0));
        assert_eq!(item.value_source.as_deref(), Some("Furniture Marketplace"));
        assert!(!item.is_price_modified);
        assert!(item.details.is_none());
    }

    #[test]
    fn test_detected_item_deserialize_null_and_missing() {
        let json = r#"{
            "id": "4",
            "label": "Bookshelf",
            "boundingBox": {"x": 0.05, "y": 0.1, "width": 0.15, "height": 0.4},
            "estimatedValue": null
        }"#;

        let item: DetectedItem = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(item.estimated_value, None);
        assert!(!item.is_price_modified);
        assert_eq!(item.provenance(), Provenance::Unsourced);
    }

    #[test]
    fn test_detected_item_serialize_camel_case() {
        let item = DetectedItem {
            details: Some(ItemDetails {
                color: Some("grey".into()),
                ..Default::default()
            }),
            ..item("1", Some(10.0))
        };
        let json = serde_json::to_string(&item).expect("シリアライズ失敗");
        assert!(json.contains("\"boundingBox\""));
        assert!(json.contains("\"estimatedValue\":10.0"));
        assert!(json.contains("\"isPriceModified\":false"));
        assert!(json.contains("\"color\":\"grey\""));
        assert!(!json.contains("valueSource"));
    }

    #[test]
    fn test_provenance_manual_hides_source() {
        let mut it = DetectedItem {
            value_source: Some("Home Goods".into()),
            source_url: Some("https://homegoods.example.com".into()),
            ..item("5", Some(120.0))
        };
        assert_eq!(
            it.provenance(),
            Provenance::Sourced {
                source: "Home Goods",
                url: Some("https://homegoods.example.com"),
            }
        );
        assert_eq!(it.provenance().export_label(), "Home Goods");

        it.is_price_modified = true;
        assert_eq!(it.provenance(), Provenance::Manual);
        assert_eq!(it.provenance().export_label(), MANUAL_ENTRY);
    }

    #[test]
    fn test_total_value_treats_null_as_zero() {
        let items = vec![item("1", Some(1200.0)), item("2", None), item("3", Some(45.5))];
        assert_eq!(total_value(&items), 1245.5);
        assert_eq!(total_value(&[]), 0.0);
    }

    #[test]
    fn test_bounding_box_clamped() {
        let b = BoundingBox::new(0.8, -0.2, 0.5, 1.5).clamped();
        assert_eq!(b.x, 0.8);
        assert_eq!(b.y, 0.0);
        assert!((b.width - 0.2).abs() < 1e-12);
        assert_eq!(b.height, 1.0);
        assert!(b.is_normalized());

        let nan = BoundingBox::new(f64::NAN, 0.1, 0.1, f64::INFINITY).clamped();
        assert_eq!(nan.x, 0.0);
        assert_eq!(nan.height, 0.0);
    }

    #[test]
    fn test_normalize_items_dedupes_ids() {
        let items = normalize_items(vec![
            item("1", Some(1.0)),
            item("1", Some(2.0)),
            item("1", Some(3.0)),
            item("2", Some(f64::NAN)),
        ]);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "1-2", "1-3", "2"]);
        assert_eq!(items[3].estimated_value, None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(1200.0)), "1200.00");
        assert_eq!(format_value(Some(45.5)), "45.50");
        assert_eq!(format_value(None), "0.00");
    }

    #[test]
    fn test_format_value_rounds_half_up() {
        assert_eq!(format_value(Some(0.125)), "0.13");
        assert_eq!(format_value(Some(10.125)), "10.13");
        assert_eq!(format_value(Some(2.375)), "2.38");
        assert_eq!(format_value(Some(0.625)), "0.63");
        assert_eq!(format_value(Some(-10.125)), "-10.13");
        // 1.005 は実際には 1.00499… なので切り捨て
        assert_eq!(format_value(Some(1.005)), "1.00");
    }

    #[test]
    fn test_format_value_negative_zero() {
        assert_eq!(format_value(Some(-0.0)), "0.00");
        assert_eq!(format_currency(Some(-0.0)), "$0.00");
    }

    #[test]
    fn test_provenance_blank_source_is_unsourced() {
        let it = DetectedItem {
            value_source: Some("".into()),
            source_url: Some("https://example.com".into()),
            ..item("8", Some(10.0))
        };
        assert_eq!(it.provenance(), Provenance::Unsourced);
        assert_eq!(it.provenance().export_label(), MANUAL_ENTRY);

        let blank_url = DetectedItem {
            value_source: Some("Home Goods".into()),
            source_url: Some("  ".into()),
            ..item("9", Some(10.0))
        };
        assert_eq!(
            blank_url.provenance(),
            Provenance::Sourced { source: "Home Goods", url: None }
        );
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(1200.0)), "$1,200.00");
        assert_eq!(format_currency(Some(45.5)), "$45.50");
        assert_eq!(format_currency(Some(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(None), "$0.00");
        assert_eq!(format_currency(Some(-12.0)), "-$12.00");
    }

    #[test]
    fn test_item_details_display_lines() {
        let details = ItemDetails {
            color: Some("brown".into()),
            material: None,
            dimensions: Some("84\" x 36\"".into()),
        };
        assert_eq!(
            details.display_lines(),
            vec!["Color: brown".to_string(), "Size: 84\" x 36\"".to_string()]
        );
    }

    #[test]
    fn test_item_count_summary() {
        assert_eq!(item_count_summary(1), "1 item detected");
        assert_eq!(item_count_summary(7), "7 items detected");
    }
}
