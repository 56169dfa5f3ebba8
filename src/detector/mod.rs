//! 品目検出
//!
//! - live: 外部の検出サービスに画像を送る
//! - simulated: 固定のデモ品目を返す
//! - auto: liveを試し、失敗したら以降はずっとsimulated
//!
//! フォールバック状態はプロセス全体ではなく `Detector` が持つ。

mod live;
mod simulated;

pub use live::LiveDetector;
pub use simulated::SimulatedDetector;

use crate::cli::DetectionMode;
use crate::config::Config;
use crate::error::{EmberAidError, Result};
use emberaid_common::upload::mime_for_extension;
use emberaid_common::{DetectedItem, ImageUpload, UploadError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 検出結果の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Live,
    Simulated,
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSource::Live => write!(f, "detection service"),
            DetectionSource::Simulated => write!(f, "simulation"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub items: Vec<DetectedItem>,
    pub source: DetectionSource,
}

/// 画像ファイルを読み込んでアップロード形式にする
///
/// 種類は拡張子で判定し、JPEG/PNG以外は読み込む前に弾く。
pub fn read_image_upload(path: &Path) -> Result<ImageUpload> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let mime = mime_for_extension(ext)
        .ok_or_else(|| UploadError::UnsupportedType(file_name.clone()))?;

    let bytes = std::fs::read(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to read image");
        UploadError::Unreadable(path.display().to_string())
    })?;

    Ok(ImageUpload::new(file_name, mime, bytes)?)
}

/// 検出の呼び出し先
pub trait DetectionBackend {
    fn detect(
        &self,
        image: &ImageUpload,
    ) -> impl std::future::Future<Output = Result<Vec<DetectedItem>>>;
}

/// モードとフォールバック状態を持つ検出クライアント
pub struct Detector<L = LiveDetector, S = SimulatedDetector> {
    mode: DetectionMode,
    live: L,
    simulated: S,
    use_fallback: bool,
}

impl Detector {
    pub fn from_config(config: &Config, mode: DetectionMode) -> Result<Self> {
        let live = LiveDetector::new(&config.api_url(), Duration::from_secs(config.timeout_seconds))?;
        let simulated = SimulatedDetector::new(Duration::from_millis(config.simulated_delay_ms));
        Ok(Self::new(mode, live, simulated))
    }
}

impl<L: DetectionBackend, S: DetectionBackend> Detector<L, S> {
    pub fn new(mode: DetectionMode, live: L, simulated: S) -> Self {
        Self {
            mode,
            live,
            simulated,
            use_fallback: mode == DetectionMode::Simulated,
        }
    }

    /// 以降の検出がシミュレーションになっているか
    pub fn is_fallback(&self) -> bool {
        self.use_fallback
    }

    pub async fn detect(&mut self, image: &ImageUpload) -> Result<DetectionOutcome> {
        if self.use_fallback {
            return self.detect_simulated(image).await;
        }

        match self.live.detect(image).await {
            Ok(items) => Ok(DetectionOutcome {
                items,
                source: DetectionSource::Live,
            }),
            Err(e) if self.mode == DetectionMode::Auto => {
                tracing::warn!(error = %e, file = %image.file_name, "detection service failed, falling back to simulation");
                self.use_fallback = true;
                self.detect_simulated(image).await
            }
            Err(e) => Err(e),
        }
    }

    async fn detect_simulated(&self, image: &ImageUpload) -> Result<DetectionOutcome> {
        match self.simulated.detect(image).await {
            Ok(items) => Ok(DetectionOutcome {
                items,
                source: DetectionSource::Simulated,
            }),
            Err(e) => {
                tracing::error!(error = %e, "simulated detection failed");
                Err(EmberAidError::ProcessingFailed)
            }
        }
    }
}
