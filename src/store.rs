//! セッションファイル
//!
//! 1画像分の検出結果を `<画像名>.emberaid.json` に保存する。
//! ズーム・回転・ホバーなどの一時状態は保存しない。

use crate::detector::DetectionSource;
use crate::error::{EmberAidError, Result};
use emberaid_common::{DetectedItem, DetectionSession};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

const SESSION_SUFFIX: &str = "emberaid.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    /// バージョン（互換性チェック用）
    version: u32,
    pub image_path: PathBuf,
    pub detection_source: DetectionSource,
    pub items: Vec<DetectedItem>,
}

impl SessionFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(image_path: PathBuf, detection_source: DetectionSource, items: Vec<DetectedItem>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            image_path,
            detection_source,
            items,
        }
    }

    /// 画像と同じディレクトリ（または指定ディレクトリ）のセッションパス
    pub fn path_for_image(image: &Path, output_dir: Option<&Path>) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "session".to_string());
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| image.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}.{}", stem, SESSION_SUFFIX))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EmberAidError::FileNotFound(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        let file: SessionFile = serde_json::from_reader(reader)?;
        if file.version != Self::CURRENT_VERSION {
            return Err(EmberAidError::SessionVersion {
                found: file.version,
                expected: Self::CURRENT_VERSION,
            });
        }
        Ok(file)
    }

    /// 一時ファイルに書いてから置き換える（失敗しても既存のセッションは残る）
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".emberaid-session-")
            .suffix(".partial")
            .tempfile_in(dir)?;
        temp.write_all(&content)?;
        temp.as_file().sync_all()?;
        temp.persist(path)
            .map_err(|e| EmberAidError::Io(e.error))?;
        Ok(())
    }

    /// 相対パスの画像はセッションファイルの場所を基準に解決
    pub fn resolve_image_path(&self, session_path: &Path) -> PathBuf {
        if self.image_path.is_absolute() {
            return self.image_path.clone();
        }
        session_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.image_path)
    }

    pub fn into_session(self) -> (DetectionSession, SessionMeta) {
        let meta = SessionMeta {
            image_path: self.image_path,
            detection_source: self.detection_source,
        };
        (DetectionSession::with_items(self.items), meta)
    }

    pub fn from_session(session: &DetectionSession, meta: &SessionMeta) -> Self {
        Self::new(meta.image_path.clone(), meta.detection_source, session.snapshot())
    }
}

/// 品目以外のセッション情報
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub image_path: PathBuf,
    pub detection_source: DetectionSource,
}
