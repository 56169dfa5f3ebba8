//! 画像への検出枠描画
//!
//! 元画像を回転・拡縮した上に、同じ変換をかけた矩形を重ねる。
//! フォントは同梱していないため、ラベルは背景タグのみ描き文字は省略する。

use crate::error::{EmberAidError, Result};
use emberaid_common::annotation::{Color, FontSpec, Surface};
use emberaid_common::{PixelRect, Rotation, ViewTransform};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, Blend};
use imageproc::rect::Rect;
use std::path::Path;

/// 1文字あたりの推定幅（フォントサイズ比）
const CHAR_WIDTH_RATIO: f64 = 0.6;

pub struct ImageSurface {
    base: RgbaImage,
    canvas: RgbaImage,
    transform: ViewTransform,
}

impl ImageSurface {
    pub fn new(base: RgbaImage) -> Self {
        let canvas = base.clone();
        Self {
            base,
            canvas,
            transform: ViewTransform::IDENTITY,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| EmberAidError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(img.to_rgba8()))
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.canvas
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| EmberAidError::ImageLoad(format!("{}: {}", path.display(), e)))
    }

    /// 表示変換をかけた元画像
    fn transformed_base(&self) -> RgbaImage {
        let rotated = match self.transform.rotation {
            Rotation::Deg0 => self.base.clone(),
            Rotation::Deg90 => imageops::rotate90(&self.base),
            Rotation::Deg180 => imageops::rotate180(&self.base),
            Rotation::Deg270 => imageops::rotate270(&self.base),
        };
        if self.transform.zoom == 1.0 {
            return rotated;
        }
        let (w, h) = self.base.dimensions();
        let (out_w, out_h) = self.transform.output_size(w, h);
        imageops::resize(&rotated, out_w.max(1), out_h.max(1), FilterType::Triangle)
    }

    /// 変換後の座標で矩形を塗る（半透明色は合成）
    fn blend_rect(&mut self, rect: PixelRect, color: Color) {
        let x0 = rect.x.floor();
        let y0 = rect.y.floor();
        let x1 = rect.right().ceil();
        let y1 = rect.bottom().ceil();
        let width = (x1 - x0).max(1.0) as u32;
        let height = (y1 - y0).max(1.0) as u32;

        let area = Rect::at(x0 as i32, y0 as i32).of_size(width, height);

        if color.a >= 1.0 {
            draw_filled_rect_mut(&mut self.canvas, area, to_rgba(color));
            return;
        }
        let mut blend = Blend(std::mem::take(&mut self.canvas));
        draw_filled_rect_mut(&mut blend, area, to_rgba(color));
        self.canvas = blend.0;
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([color.r, color.g, color.b, alpha])
}

impl Surface for ImageSurface {
    fn size(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    fn clear(&mut self) {
        self.canvas = self.transformed_base();
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        if transform != self.transform {
            self.transform = transform;
            self.canvas = self.transformed_base();
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let (w, h) = self.base.dimensions();
        let mapped = self.transform.apply_rect(&rect, w, h);
        self.blend_rect(mapped, color);
    }

    /// 線は矩形の辺を中心に描く
    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: f64) {
        let (w, h) = self.base.dimensions();
        let r = self.transform.apply_rect(&rect, w, h);
        let t = (line_width * self.transform.zoom).max(1.0);
        let half = t / 2.0;

        let edges = [
            PixelRect::new(r.x - half, r.y - half, r.width + t, t),
            PixelRect::new(r.x - half, r.bottom() - half, r.width + t, t),
            PixelRect::new(r.x - half, r.y + half, t, (r.height - t).max(0.0)),
            PixelRect::new(r.right() - half, r.y + half, t, (r.height - t).max(0.0)),
        ];
        for edge in edges {
            if edge.width > 0.0 && edge.height > 0.0 {
                self.blend_rect(edge, color);
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, _font: FontSpec, _color: Color) {
        tracing::trace!(text, x, y, "label glyphs not rasterized");
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * CHAR_WIDTH_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberaid_common::annotation::{render_annotations, OverlayStyle};
    use emberaid_common::{BoundingBox, DetectedItem, DetectionSession};

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn session() -> DetectionSession {
        DetectionSession::with_items(vec![DetectedItem {
            id: "1".into(),
            label: "Sofa".into(),
            bounding_box: BoundingBox::new(0.25, 0.5, 0.5, 0.25),
            ..Default::default()
        }])
    }

    #[test]
    fn test_stroke_paints_box_edge() {
        let session = session();
        let mut surface = ImageSurface::new(white(200, 100));
        let drawn = render_annotations(&mut surface, session.render_input(), &OverlayStyle::default());
        assert_eq!(drawn, 1);

        // 枠の左辺 (x=50, y=60) はストローク色
        let px = surface.canvas().get_pixel(50, 60);
        assert_eq!(px.0[..3], [0xF5, 0x9E, 0x0B]);

        // 枠の外は白のまま
        assert_eq!(surface.canvas().get_pixel(10, 90).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_fill_is_translucent() {
        let session = session();
        let mut surface = ImageSurface::new(white(200, 100));
        render_annotations(&mut surface, session.render_input(), &OverlayStyle::default());

        let inside = surface.canvas().get_pixel(100, 62).0;
        assert_ne!(inside, [255, 255, 255, 255]);
        assert_ne!(inside[..3], [0xF5, 0x9E, 0x0B]);
    }

    #[test]
    fn test_rotated_canvas_size() {
        let mut session = session();
        session.rotate();
        session.zoom_in();
        let mut surface = ImageSurface::new(white(200, 100));
        render_annotations(&mut surface, session.render_input(), &OverlayStyle::default());
        assert_eq!(surface.canvas().dimensions(), (125, 250));
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let mut session = session();
        session.set_hover(Some("1"));
        let mut surface = ImageSurface::new(white(120, 80));
        let style = OverlayStyle::default();

        render_annotations(&mut surface, session.render_input(), &style);
        let first = surface.canvas().clone();
        render_annotations(&mut surface, session.render_input(), &style);
        assert_eq!(surface.canvas(), &first);
    }

    #[test]
    fn test_unloaded_image_draws_nothing() {
        let session = session();
        let mut surface = ImageSurface::new(RgbaImage::new(0, 0));
        assert_eq!(
            render_annotations(&mut surface, session.render_input(), &OverlayStyle::default()),
            0
        );
    }
}
