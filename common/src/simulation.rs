//! デモ用の検出結果
//!
//! 検出サービスが使えないときに返す固定の7品目。
//! IDは一意、矩形は[0,1]内、`is_price_modified` はすべて false。

use crate::types::{BoundingBox, DetectedItem};

struct Fixture {
    label: &'static str,
    bbox: (f64, f64, f64, f64),
    value: Option<f64>,
    source: Option<(&'static str, &'static str)>,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        label: "Sofa",
        bbox: (0.1, 0.3, 0.4, 0.3),
        value: Some(1200.0),
        source: Some(("Furniture Marketplace", "https://furnitureshop.example.com/sofas/modern-sectional")),
    },
    Fixture {
        label: "Coffee Table",
        bbox: (0.5, 0.5, 0.3, 0.2),
        value: Some(350.0),
        source: Some(("Home Furnishings", "https://homefurnishings.example.com/tables/coffee")),
    },
    Fixture {
        label: "TV",
        bbox: (0.7, 0.2, 0.25, 0.15),
        value: Some(800.0),
        source: Some(("Electronics Store", "https://electronics.example.com/tvs/smart-4k")),
    },
    Fixture {
        label: "Bookshelf",
        bbox: (0.05, 0.1, 0.15, 0.4),
        value: None,
        source: None,
    },
    Fixture {
        label: "Lamp",
        bbox: (0.6, 0.1, 0.1, 0.2),
        value: Some(120.0),
        source: Some(("Home Goods", "https://homegoods.example.com/lighting/table-lamps")),
    },
    Fixture {
        label: "Rug",
        bbox: (0.3, 0.7, 0.5, 0.2),
        value: Some(450.0),
        source: Some(("Home Decor", "https://homedecor.example.com/rugs/area-rugs")),
    },
    Fixture {
        label: "Curtains",
        bbox: (0.85, 0.1, 0.1, 0.5),
        value: Some(180.0),
        source: Some(("Home Textiles", "https://hometextiles.example.com/curtains/blackout")),
    },
];

/// デモ用の品目リスト（画像の内容には依存しない）
pub fn demo_items() -> Vec<DetectedItem> {
    FIXTURES
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let (x, y, width, height) = f.bbox;
            DetectedItem {
                id: (idx + 1).to_string(),
                label: f.label.to_string(),
                bounding_box: BoundingBox::new(x, y, width, height),
                estimated_value: f.value,
                value_source: f.source.map(|(name, _)| name.to_string()),
                source_url: f.source.map(|(_, url)| url.to_string()),
                is_price_modified: false,
                details: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_demo_items_shape() {
        let items = demo_items();
        assert!((6..=7).contains(&items.len()));

        let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), items.len());

        for item in &items {
            assert!(item.bounding_box.is_normalized(), "{} の矩形が範囲外", item.label);
            assert!(!item.is_price_modified);
        }
    }

    #[test]
    fn test_demo_items_include_unpriced() {
        let items = demo_items();
        assert!(items.iter().any(|i| i.estimated_value.is_none()));
    }
}
