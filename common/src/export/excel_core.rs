//! Excel生成（共通ライブラリ）
//!
//! 区切りテキストと同じ列・行順で、値列だけ数値セル（書式 0.00）にする。

use super::{ExportRow, HEADERS};
use rust_xlsxwriter::*;

const SHEET_NAME: &str = "Claim Items";
const ITEM_COL_WIDTH: f64 = 28.0;
const VALUE_COL_WIDTH: f64 = 20.0;
const SOURCE_COL_WIDTH: f64 = 32.0;

/// Excelをバッファに生成
pub fn generate_excel_buffer(rows: &[ExportRow<'_>]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_num_format("0.00")
        .set_align(FormatAlign::Right);

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, width) in [ITEM_COL_WIDTH, VALUE_COL_WIDTH, SOURCE_COL_WIDTH]
        .into_iter()
        .enumerate()
    {
        worksheet
            .set_column_width(col as u16, width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet
            .write_string(r, 0, row.item)
            .map_err(|e| format!("品目書き込みエラー: {}", e))?;
        worksheet
            .write_number_with_format(r, 1, row.value.unwrap_or(0.0), &value_format)
            .map_err(|e| format!("値書き込みエラー: {}", e))?;
        worksheet
            .write_string(r, 2, row.source)
            .map_err(|e| format!("出典書き込みエラー: {}", e))?;
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
