//! 検出枠のオーバーレイ描画
//!
//! 描画は毎回全消去してから全品目を描き直す（差分更新なし）。
//! 実際の描画先は [`Surface`] トレイトで抽象化し、
//! CLIではラスタ画像、テストでは [`RecordingSurface`] を使う。

use crate::types::DetectedItem;
use crate::view::{map_box_to_pixels, PixelRect, ViewTransform};

/// RGBA色（アルファは0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
}

/// ラベル文字のフォント指定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size_px: f64,
    pub bold: bool,
}

/// 1状態分（通常/ホバー）の描画スタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStyle {
    pub stroke: Color,
    pub fill: Color,
    pub line_width: f64,
    pub font: FontSpec,
}

/// オーバーレイ全体のスタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub normal: BoxStyle,
    pub hovered: BoxStyle,
    pub label_height: f64,
    pub label_padding: f64,
    /// ラベル上端からの文字ベースライン位置
    pub label_baseline: f64,
    pub label_text: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            normal: BoxStyle {
                stroke: Color::rgb(0xF5, 0x9E, 0x0B),
                fill: Color::rgba(0xF5, 0x9E, 0x0B, 0.1),
                line_width: 2.0,
                font: FontSpec { size_px: 12.0, bold: false },
            },
            hovered: BoxStyle {
                stroke: Color::rgb(0xF9, 0x73, 0x16),
                fill: Color::rgba(0xF9, 0x73, 0x16, 0.2),
                line_width: 3.0,
                font: FontSpec { size_px: 14.0, bold: true },
            },
            label_height: 20.0,
            label_padding: 5.0,
            label_baseline: 15.0,
            label_text: Color::WHITE,
        }
    }
}

impl OverlayStyle {
    pub fn for_state(&self, hovered: bool) -> &BoxStyle {
        if hovered {
            &self.hovered
        } else {
            &self.normal
        }
    }
}

/// 描画先
///
/// 座標はすべて変換前の画像ピクセル座標。ズーム・回転は
/// `set_transform` で描画面全体に適用される。
pub trait Surface {
    /// 画像の自然サイズ（未読込なら幅・高さのどちらかが0）
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn set_transform(&mut self, transform: ViewTransform);
    fn fill_rect(&mut self, rect: PixelRect, color: Color);
    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: FontSpec, color: Color);
    fn measure_text(&self, text: &str, font: FontSpec) -> f64;
}

/// 描画時に参照する入力一式
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub items: &'a [DetectedItem],
    pub hovered_item_id: Option<&'a str>,
    pub transform: ViewTransform,
}

/// 全オーバーレイを描き直す
///
/// 戻り値は描画した品目数。画像未読込なら何も描かずに0を返す。
pub fn render_annotations<S: Surface + ?Sized>(
    surface: &mut S,
    input: RenderInput<'_>,
    style: &OverlayStyle,
) -> usize {
    let (width, height) = surface.size();
    if width == 0 || height == 0 {
        return 0;
    }

    surface.clear();
    surface.set_transform(input.transform);

    let mut drawn = 0;
    for item in input.items {
        let Some(rect) = map_box_to_pixels(&item.bounding_box, width, height) else {
            continue;
        };
        let is_hovered = input.hovered_item_id == Some(item.id.as_str());
        draw_item(surface, item, rect, style, is_hovered);
        drawn += 1;
    }
    drawn
}

fn draw_item<S: Surface + ?Sized>(
    surface: &mut S,
    item: &DetectedItem,
    rect: PixelRect,
    style: &OverlayStyle,
    is_hovered: bool,
) {
    let box_style = style.for_state(is_hovered);

    surface.fill_rect(rect, box_style.fill);
    surface.stroke_rect(rect, box_style.stroke, box_style.line_width);

    // ラベルは枠の左上から真上に置く（描画面の上端を越えてもよい）
    let label_width = surface.measure_text(&item.label, box_style.font) + style.label_padding * 2.0;
    let tag = PixelRect::new(rect.x, rect.y - style.label_height, label_width, style.label_height);
    surface.fill_rect(tag, box_style.stroke);
    surface.fill_text(
        &item.label,
        tag.x + style.label_padding,
        tag.y + style.label_baseline,
        box_style.font,
        style.label_text,
    );
}

/// 記録された描画命令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetTransform(ViewTransform),
    FillRect(PixelRect, Color),
    StrokeRect(PixelRect, Color, f64),
    FillText {
        text: String,
        x: f64,
        y: f64,
        font: FontSpec,
        color: Color,
    },
}

/// 描画命令を記録するだけの描画先
///
/// `clear` で記録を消すので、`commands()` は常に最新の描画結果を表す。
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    /// 1文字あたりの幅（フォントサイズ比）
    char_width_ratio: f64,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            char_width_ratio: 0.6,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: f64) {
        self.commands.push(DrawCommand::StrokeRect(rect, color, line_width));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: FontSpec, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font,
            color,
        });
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * self.char_width_ratio
    }
}
