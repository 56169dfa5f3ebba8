//! 表示座標モジュール
//!
//! 正規化座標の矩形を画像ピクセル座標に変換し、
//! ズーム・回転は描画面全体へのアフィン変換として別に扱う。

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.25;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// ピクセル座標の矩形（左上原点）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// 正規化矩形を画像ピクセル座標に変換
///
/// 画像が未読込（幅または高さが0）の場合は None を返し、描画はスキップする。
pub fn map_box_to_pixels(
    bbox: &BoundingBox,
    surface_width: u32,
    surface_height: u32,
) -> Option<PixelRect> {
    if surface_width == 0 || surface_height == 0 {
        return None;
    }
    let w = surface_width as f64;
    let h = surface_height as f64;
    Some(PixelRect {
        x: bbox.x * w,
        y: bbox.y * h,
        width: bbox.width * w,
        height: bbox.height * h,
    })
}

/// 回転角（時計回り、90度単位）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// (current + 90) mod 360
    pub fn next(&self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// 90度または270度で縦横が入れ替わる
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// ズーム・回転の表示状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f64,
    rotation: Rotation,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            rotation: Rotation::Deg0,
        }
    }
}

impl ViewState {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            zoom: self.zoom,
            rotation: self.rotation,
        }
    }
}

/// 描画面全体に適用するアフィン変換
///
/// 自然サイズ W×H の画像を時計回りに回転させ、zoom倍に拡縮する。
/// 出力面のサイズは回転後の寸法 × zoom。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub rotation: Rotation,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        zoom: 1.0,
        rotation: Rotation::Deg0,
    };

    /// 変換後の出力面サイズ（ピクセル）
    pub fn output_size(&self, natural_width: u32, natural_height: u32) -> (u32, u32) {
        let (w, h) = if self.rotation.swaps_axes() {
            (natural_height, natural_width)
        } else {
            (natural_width, natural_height)
        };
        (
            (w as f64 * self.zoom).round() as u32,
            (h as f64 * self.zoom).round() as u32,
        )
    }

    /// 自然座標の点を出力面の座標へ
    pub fn apply_point(&self, x: f64, y: f64, natural_width: u32, natural_height: u32) -> (f64, f64) {
        let w = natural_width as f64;
        let h = natural_height as f64;
        let (rx, ry) = match self.rotation {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (h - y, x),
            Rotation::Deg180 => (w - x, h - y),
            Rotation::Deg270 => (y, w - x),
        };
        (rx * self.zoom, ry * self.zoom)
    }

    /// 自然座標の矩形を出力面の矩形へ（90度単位なので軸平行のまま）
    pub fn apply_rect(&self, rect: &PixelRect, natural_width: u32, natural_height: u32) -> PixelRect {
        let (x1, y1) = self.apply_point(rect.x, rect.y, natural_width, natural_height);
        let (x2, y2) = self.apply_point(rect.right(), rect.bottom(), natural_width, natural_height);
        PixelRect {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }
}
