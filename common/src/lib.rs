//! EmberAid Common Library
//!
//! 損害写真の品目検出結果を扱う共通部分:
//! 検出結果の型、検出枠の座標変換と描画、評価額の照合、エクスポート

pub mod types;
pub mod view;
pub mod annotation;
pub mod session;
pub mod export;
pub mod upload;
pub mod simulation;
pub mod error;

pub use types::{BoundingBox, DetectedItem, ItemDetails, Provenance, MANUAL_ENTRY};
pub use view::{map_box_to_pixels, PixelRect, Rotation, ViewState, ViewTransform};
pub use annotation::{render_annotations, OverlayStyle, RecordingSurface, RenderInput, Surface};
pub use session::{DetectionSession, EditState, InFlight, InFlightGuard};
pub use export::{ExportFile, ExportFormat};
pub use upload::{ImageUpload, UploadError};
pub use error::{Error, Result};
