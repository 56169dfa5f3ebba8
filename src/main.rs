use clap::Parser;
use emberaid::{cli, config, detector, error, export, raster, review, store};
use cli::{Cli, Commands, DetectionMode};
use config::Config;
use detector::Detector;
use emberaid_common::annotation::{render_annotations, OverlayStyle};
use emberaid_common::types::{format_currency, item_count_summary};
use emberaid_common::DetectionSession;
use error::{EmberAidError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::{SessionFile, SessionMeta};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Detect { images, output, mode } => {
            println!("🔥 emberaid - 品目検出\n");

            let mode = mode.unwrap_or(config.default_mode);
            let mut detector = Detector::from_config(&config, mode)?;

            for (i, image) in images.iter().enumerate() {
                println!("[{}/{}] {}", i + 1, images.len(), image.display());
                let (session_path, session) = detect_image(&mut detector, image, output.as_deref()).await?;
                println!("✔ {}", item_count_summary(session.len()));
                println!("  合計: {}", format_currency(Some(session.total_value())));
                println!("  保存: {}\n", session_path.display());
            }

            if detector.is_fallback() && mode == DetectionMode::Auto {
                println!("⚠ 検出サービスに接続できなかったため、デモ品目を使用しました");
            }
            println!("✅ 検出完了");
        }

        Commands::Show { session } => {
            let (session, meta) = SessionFile::load(&session)?.into_session();
            println!("画像: {} ({})\n", meta.image_path.display(), meta.detection_source);
            review::print_summary(&session);
        }

        Commands::SetValue { session: session_path, id, value } => {
            let (mut session, meta) = SessionFile::load(&session_path)?.into_session();

            if session.set_value(&id, value) {
                save_session(&session_path, &session, &meta)?;
                println!("✔ [{}] → {}", id, format_currency(Some(value)));
                println!("  合計: {}", format_currency(Some(session.total_value())));
            } else if !value.is_finite() {
                println!("数値ではない値は設定できません: {}", value);
            } else {
                println!("品目が見つかりません: {}（変更なし）", id);
            }
        }

        Commands::Review { session } => {
            println!("💲 emberaid - 評価額確認\n");
            review::run_interactive_review(&session)?;
        }

        Commands::Annotate { session: session_path, output, image, zoom_in, zoom_out, rotate, hover } => {
            let file = SessionFile::load(&session_path)?;
            let image_path = image.unwrap_or_else(|| file.resolve_image_path(&session_path));
            let (mut session, _meta) = file.into_session();

            for _ in 0..zoom_in {
                session.zoom_in();
            }
            for _ in 0..zoom_out {
                session.zoom_out();
            }
            for _ in 0..rotate % 4 {
                session.rotate();
            }
            if let Some(id) = hover.as_deref() {
                if session.item(id).is_none() {
                    tracing::warn!(id, "hover target not found");
                }
                session.set_hover(Some(id));
            }

            let mut surface = raster::ImageSurface::open(&image_path)?;
            let drawn = render_annotations(&mut surface, session.render_input(), &OverlayStyle::default());
            surface.save_png(&output)?;

            let view = session.view();
            println!(
                "✔ {}件の枠を描画 (zoom {:.2}, {}°): {}",
                drawn,
                view.zoom(),
                view.rotation().degrees(),
                output.display()
            );
        }

        Commands::Export { session: session_path, format, output } => {
            println!("📄 emberaid - エクスポート\n");

            let (session, _meta) = SessionFile::load(&session_path)?.into_session();
            if session.is_empty() {
                println!("No items detected");
            }
            let output_dir = output.unwrap_or_else(|| default_dir(&session_path));
            let written = export::export_session(&session, &format.formats(), &output_dir)?;
            for path in &written {
                println!("✔ {}", path.display());
            }

            println!("\n✅ エクスポート完了");
        }

        Commands::Run { image, format, output, mode } => {
            println!("🚀 emberaid - 一括処理\n");

            let mode = mode.unwrap_or(config.default_mode);
            let mut detector = Detector::from_config(&config, mode)?;

            println!("[1/2] 品目を検出中...");
            let (session_path, session) = detect_image(&mut detector, &image, output.as_deref()).await?;
            println!("✔ {}", item_count_summary(session.len()));
            println!("  セッション: {}\n", session_path.display());

            println!("[2/2] エクスポート中...");
            let output_dir = output.unwrap_or_else(|| default_dir(&image));
            let written = export::export_session(&session, &format.formats(), &output_dir)?;
            for path in &written {
                println!("✔ {}", path.display());
            }

            println!("\n合計: {}", format_currency(Some(session.total_value())));
            println!("✅ 完了");
        }

        Commands::Config { set_api_url, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ 検出サービスのURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  検出サービス: {}", config.api_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  シミュレーション遅延: {}ms", config.simulated_delay_ms);
                println!("  検出モード: {}", config.default_mode);
            }
        }
    }

    Ok(())
}

/// RUST_LOG があればそれを優先。なければ warn（-v で debug）
fn init_tracing(verbose: bool) {
    let default = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 1画像を検出してセッションファイルに保存
async fn detect_image(
    detector: &mut Detector,
    image: &Path,
    output_dir: Option<&Path>,
) -> Result<(PathBuf, DetectionSession)> {
    let upload = detector::read_image_upload(image)?;

    let mut session = DetectionSession::new();
    let outcome = {
        let _guard = session
            .processing()
            .try_acquire()
            .ok_or_else(|| EmberAidError::Detection("detection already running".into()))?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.yellow} {msg}")
                .map_err(|e| EmberAidError::CliExecution(e.to_string()))?,
        );
        spinner.set_message(format!("Analyzing {}...", upload.file_name));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = detector.detect(&upload).await;
        spinner.finish_and_clear();
        result?
    };

    session.replace_items(outcome.items);
    tracing::info!(file = %upload.file_name, items = session.len(), source = %outcome.source, "detection finished");

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }
    let session_path = SessionFile::path_for_image(image, output_dir);
    let meta = SessionMeta {
        image_path: image.canonicalize().unwrap_or_else(|_| image.to_path_buf()),
        detection_source: outcome.source,
    };
    save_session(&session_path, &session, &meta)?;

    Ok((session_path, session))
}

fn save_session(path: &Path, session: &DetectionSession, meta: &SessionMeta) -> Result<()> {
    SessionFile::from_session(session, meta).save(path)
}

fn default_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
