//! エクスポートファイルの書き出し
//!
//! 一時ファイルに書いてから名前を付けて確定する。途中で失敗した場合は
//! 一時ファイルが削除されるので、不完全なファイルは残らない。

use crate::error::{EmberAidError, Result};
use emberaid_common::export::{self, ExportFile, ExportFormat};
use emberaid_common::{DetectedItem, DetectionSession};
use std::io::Write;
use std::path::{Path, PathBuf};

/// セッションを指定形式で書き出す
///
/// 書き出し中は `session.exporting()` が立ち、二重実行は `ExportInProgress` になる。
pub fn export_session(
    session: &DetectionSession,
    formats: &[ExportFormat],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let _guard = session
        .exporting()
        .try_acquire()
        .ok_or(EmberAidError::ExportInProgress)?;

    let items = session.snapshot();
    let mut written = Vec::with_capacity(formats.len());

    for &format in formats {
        let path = export_one(&items, format, output_dir)
            .inspect_err(|e| tracing::error!(error = %e, format = %format, "export failed"))?;
        written.push(path);
    }

    Ok(written)
}

/// シリアライズから書き出しまで（どちらの失敗も呼び出し側でログ）
fn export_one(items: &[DetectedItem], format: ExportFormat, output_dir: &Path) -> Result<PathBuf> {
    let file = export::serialize_today(items, format)?;
    let path = write_export_file(&file, output_dir)?;
    tracing::info!(path = %path.display(), mime = file.mime_type, "export written");
    Ok(path)
}

/// 1ファイルを書き出して確定する
pub fn write_export_file(file: &ExportFile, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".emberaid-")
        .suffix(".partial")
        .tempfile_in(output_dir)?;
    temp.write_all(&file.content)?;
    temp.as_file().sync_all()?;

    let dest = output_dir.join(&file.file_name);
    temp.persist(&dest)
        .map_err(|e| EmberAidError::Export(format!("{}: {}", dest.display(), e.error)))?;

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberaid_common::simulation::demo_items;
    use tempfile::tempdir;

    #[test]
    fn test_write_export_file_leaves_no_temp() {
        let dir = tempdir().expect("一時ディレクトリ作成失敗");
        let file = ExportFile {
            content: b"Item,Estimated Value ($),Source".to_vec(),
            file_name: "emberaid-export-2025-01-01.csv".into(),
            mime_type: export::CSV_MIME,
        };
        let path = write_export_file(&file, dir.path()).expect("書き出し失敗");
        assert_eq!(std::fs::read(&path).unwrap(), file.content);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["emberaid-export-2025-01-01.csv".to_string()]);
    }

    #[test]
    fn test_export_session_both_formats() {
        let dir = tempdir().expect("一時ディレクトリ作成失敗");
        let session = DetectionSession::with_items(demo_items());
        let paths = export_session(
            &session,
            &[ExportFormat::Delimited, ExportFormat::Spreadsheet],
            dir.path(),
        )
        .expect("エクスポート失敗");

        assert_eq!(paths.len(), 2);
        assert!(paths[0].extension().is_some_and(|e| e == "csv"));
        assert!(paths[1].extension().is_some_and(|e| e == "xlsx"));
        assert!(!session.exporting().is_busy());
    }

    #[test]
    fn test_export_session_rejects_concurrent_export() {
        let dir = tempdir().expect("一時ディレクトリ作成失敗");
        let session = DetectionSession::with_items(demo_items());
        let _held = session.exporting().try_acquire().unwrap();

        let err = export_session(&session, &[ExportFormat::Delimited], dir.path()).unwrap_err();
        assert!(matches!(err, EmberAidError::ExportInProgress));
    }

    /// ログ出力をメモリに溜める
    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_failure_is_logged() {
        let dir = tempdir().expect("一時ディレクトリ作成失敗");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let session = DetectionSession::with_items(demo_items());
        let result = tracing::subscriber::with_default(subscriber, || {
            export_session(&session, &[ExportFormat::Spreadsheet], &blocker)
        });
        assert!(result.is_err());

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("export failed"));
        assert!(output.contains("format=Excel"));
    }
}
