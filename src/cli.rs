use clap::{Parser, Subcommand, ValueEnum};
use emberaid_common::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emberaid")]
#[command(about = "Document property loss: detect items in a photo, review values, export a claim", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像から品目を検出してセッションファイルを作成
    Detect {
        /// 画像ファイル（JPEG/PNG）
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// 出力ディレクトリ（デフォルト: 画像と同じ場所）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 検出モード (auto/live/simulated)
        #[arg(short, long)]
        mode: Option<DetectionMode>,
    },

    /// セッションの品目一覧と合計額を表示
    Show {
        #[arg(required = true)]
        session: PathBuf,
    },

    /// 品目の評価額を手動で設定
    SetValue {
        #[arg(required = true)]
        session: PathBuf,

        /// 品目ID
        #[arg(required = true)]
        id: String,

        /// 評価額（ドル）
        #[arg(required = true, allow_negative_numbers = true)]
        value: f64,
    },

    /// 対話的に評価額を確認・修正
    Review {
        #[arg(required = true)]
        session: PathBuf,
    },

    /// 検出枠を描画したPNGを出力
    Annotate {
        #[arg(required = true)]
        session: PathBuf,

        /// 出力PNG
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// 元画像（省略時はセッションに記録された画像）
        #[arg(long)]
        image: Option<PathBuf>,

        /// ズームイン回数（0.25刻み、最大3.0）
        #[arg(long, default_value = "0")]
        zoom_in: u32,

        /// ズームアウト回数（0.25刻み、最小0.5）
        #[arg(long, default_value = "0")]
        zoom_out: u32,

        /// 90度回転の回数
        #[arg(long, default_value = "0")]
        rotate: u32,

        /// 強調表示する品目ID
        #[arg(long)]
        hover: Option<String>,
    },

    /// セッションをCSV/Excelに出力
    Export {
        #[arg(required = true)]
        session: PathBuf,

        /// 出力形式 (csv/xlsx/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportTarget,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 検出からエクスポートまで一括実行
    Run {
        #[arg(required = true)]
        image: PathBuf,

        /// 出力形式 (csv/xlsx/both)
        #[arg(short, long, default_value = "both")]
        format: ExportTarget,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 検出モード (auto/live/simulated)
        #[arg(short, long)]
        mode: Option<DetectionMode>,
    },

    /// 設定を表示/編集
    Config {
        /// 検出サービスのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 検出サービスの使い方
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// サービスを試し、失敗したら以降はシミュレーション
    #[default]
    Auto,
    Live,
    Simulated,
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMode::Auto => write!(f, "auto"),
            DetectionMode::Live => write!(f, "live"),
            DetectionMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// 出力対象
#[derive(Clone, Debug, Default)]
pub enum ExportTarget {
    #[default]
    Csv,
    Excel,
    Both,
}

impl ExportTarget {
    pub fn formats(&self) -> Vec<ExportFormat> {
        match self {
            ExportTarget::Csv => vec![ExportFormat::Delimited],
            ExportTarget::Excel => vec![ExportFormat::Spreadsheet],
            ExportTarget::Both => vec![ExportFormat::Delimited, ExportFormat::Spreadsheet],
        }
    }
}

impl std::str::FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportTarget::Csv),
            "excel" | "xlsx" => Ok(ExportTarget::Excel),
            "both" => Ok(ExportTarget::Both),
            _ => Err(format!("Unknown format: {}. Use csv, xlsx, or both", s)),
        }
    }
}
