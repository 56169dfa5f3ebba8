//! エクスポート（区切りテキスト / スプレッドシート）
//!
//! 列は両形式とも `Item`, `Estimated Value ($)`, `Source` の順。
//! 行は品目リストの順序のまま（ソートしない）。

pub mod csv_core;

#[cfg(feature = "excel")]
pub mod excel_core;

use crate::error::Result;
use crate::types::{format_value, DetectedItem};
use chrono::NaiveDate;

pub const HEADERS: [&str; 3] = ["Item", "Estimated Value ($)", "Source"];
pub const CSV_MIME: &str = "text/csv;charset=utf-8;";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const FILE_PREFIX: &str = "emberaid-export";

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Delimited,
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Delimited => "csv",
            ExportFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Delimited => CSV_MIME,
            ExportFormat::Spreadsheet => XLSX_MIME,
        }
    }

    /// `emberaid-export-2025-03-14.csv`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}-{}.{}", FILE_PREFIX, date.format("%Y-%m-%d"), self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" | "delimited" => Ok(ExportFormat::Delimited),
            "xlsx" | "excel" | "spreadsheet" => Ok(ExportFormat::Spreadsheet),
            _ => Err(format!("Unknown format: {}. Use csv or xlsx", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Delimited => write!(f, "CSV"),
            ExportFormat::Spreadsheet => write!(f, "Excel"),
        }
    }
}

/// エクスポート結果（内容・ファイル名・MIMEタイプ）
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub content: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// 1行分のセル
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow<'a> {
    pub item: &'a str,
    pub value: Option<f64>,
    pub source: &'a str,
}

impl ExportRow<'_> {
    /// 小数2桁の値文字列
    pub fn value_text(&self) -> String {
        format_value(self.value)
    }
}

/// 品目リストを行に変換（手動上書き済みは出典を "Manual Entry" に）
pub fn rows(items: &[DetectedItem]) -> Vec<ExportRow<'_>> {
    items
        .iter()
        .map(|item| ExportRow {
            item: &item.label,
            value: item.estimated_value,
            source: item.provenance().export_label(),
        })
        .collect()
}

/// 指定形式でシリアライズ
pub fn serialize(items: &[DetectedItem], format: ExportFormat, date: NaiveDate) -> Result<ExportFile> {
    let rows = rows(items);
    let content = match format {
        ExportFormat::Delimited => csv_core::encode(&rows).into_bytes(),
        ExportFormat::Spreadsheet => encode_spreadsheet(&rows)?,
    };

    Ok(ExportFile {
        content,
        file_name: format.file_name(date),
        mime_type: format.mime_type(),
    })
}

/// 今日の日付（UTC）でシリアライズ
pub fn serialize_today(items: &[DetectedItem], format: ExportFormat) -> Result<ExportFile> {
    serialize(items, format, chrono::Utc::now().date_naive())
}

#[cfg(feature = "excel")]
fn encode_spreadsheet(rows: &[ExportRow<'_>]) -> Result<Vec<u8>> {
    excel_core::generate_excel_buffer(rows).map_err(crate::error::Error::Export)
}

/// excel機能なし: 区切りテキストをそのままスプレッドシート名で出す
#[cfg(not(feature = "excel"))]
fn encode_spreadsheet(rows: &[ExportRow<'_>]) -> Result<Vec<u8>> {
    Ok(csv_core::encode(rows).into_bytes())
}
