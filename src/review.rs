//! 対話式の評価額確認
//!
//! 品目を選んで評価額を入力する。入力は編集状態（開始→確定/取消）を経由して
//! セッションに反映され、確定した品目は以降「手動入力」扱いになる。

use crate::error::{EmberAidError, Result};
use crate::store::SessionFile;
use dialoguer::{Input, Select};
use emberaid_common::types::{format_currency, format_value, item_count_summary};
use emberaid_common::{DetectedItem, DetectionSession, EditState, Provenance};
use std::path::Path;

/// 値入力の解釈結果
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Commit(f64),
    Cancel,
    Invalid(String),
}

/// 入力文字列を解釈（"$1,200.50" も可、空・"c"・"esc" は取消）
pub fn parse_edit_input(input: &str) -> EditAction {
    let trimmed = input.trim();
    match trimmed {
        "" | "c" | "C" | "esc" | "cancel" => return EditAction::Cancel,
        _ => {}
    }

    let cleaned: String = trimmed
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => EditAction::Commit(v),
        _ => EditAction::Invalid(trimmed.to_string()),
    }
}

/// 一覧表示用の1行
pub fn format_item_line(item: &DetectedItem) -> String {
    let source = match item.provenance() {
        Provenance::Manual => "Manually adjusted".to_string(),
        Provenance::Sourced { source, url: Some(url) } => format!("Source: {} <{}>", source, url),
        // URLのない出典は表示しない
        Provenance::Sourced { url: None, .. } | Provenance::Unsourced => String::new(),
    };
    format!(
        "[{}] {:<16} {:>12}  {}",
        item.id,
        item.label,
        format_currency(item.estimated_value),
        source
    )
    .trim_end()
    .to_string()
}

/// 一覧と合計を表示
pub fn print_summary(session: &DetectionSession) {
    println!("{}", item_count_summary(session.len()));
    for item in session.items() {
        println!("  {}", format_item_line(item));
        if let Some(details) = &item.details {
            for line in details.display_lines() {
                println!("      {}", line);
            }
        }
    }
    println!("Total: {}", format_currency(Some(session.total_value())));
}

/// 対話式で評価額を修正して保存
pub fn run_interactive_review(session_path: &Path) -> Result<()> {
    let file = SessionFile::load(session_path)?;
    let (mut session, meta) = file.into_session();

    if session.is_empty() {
        println!("No items detected");
        return Ok(());
    }

    println!("操作: 品目を選択 → 金額を入力 [Enter]確定 / 空欄・c で取消、[Esc]で保存して終了");
    println!("---\n");

    let mut changed = 0usize;

    loop {
        print_summary(&session);
        println!();

        let labels: Vec<String> = session.items().iter().map(format_item_line).collect();
        let selection = Select::new()
            .with_prompt("Edit which item?")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(|e| EmberAidError::CliExecution(e.to_string()))?;

        let Some(idx) = selection else {
            break;
        };
        let id = session.items()[idx].id.clone();
        session.begin_edit(&id);

        let initial = match session.edit_state() {
            EditState::Editing { candidate, .. } => format_value(Some(*candidate)),
            EditState::Idle => String::new(),
        };

        let input: String = Input::new()
            .with_prompt("Value ($)")
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| EmberAidError::CliExecution(e.to_string()))?;

        match parse_edit_input(&input) {
            EditAction::Commit(value) => {
                if session.commit_edit(value) {
                    changed += 1;
                    println!("  → {}\n", format_currency(Some(value)));
                }
            }
            EditAction::Cancel => {
                session.cancel_edit();
                println!("  → 取消\n");
            }
            EditAction::Invalid(text) => {
                session.cancel_edit();
                println!("  → 数値ではありません: {}\n", text);
            }
        }
    }

    if changed > 0 {
        SessionFile::from_session(&session, &meta).save(session_path)?;
        println!("\n✓ 保存しました: {} ({}件修正)", session_path.display(), changed);
    }

    Ok(())
}
