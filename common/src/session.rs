//! 検出セッション（評価額の照合）
//!
//! 1枚の画像に対する品目リストと一時的な表示状態を保持する。
//! 品目の変更は `set_value` 経由のみで、描画・エクスポートには読み取り専用の
//! スライスかスナップショットを渡す。

use crate::annotation::RenderInput;
use crate::types::{self, DetectedItem};
use crate::view::ViewState;
use std::cell::Cell;
use std::rc::Rc;

/// 評価額編集の状態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        item_id: String,
        candidate: f64,
    },
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing { .. })
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            EditState::Editing { item_id, .. } => Some(item_id),
            EditState::Idle => None,
        }
    }
}

/// 実行中フラグ
///
/// 同じ操作の二重起動を防ぐ。ガードを落とすとフラグは必ず下りる。
#[derive(Debug, Clone, Default)]
pub struct InFlight(Rc<Cell<bool>>);

impl InFlight {
    pub fn is_busy(&self) -> bool {
        self.0.get()
    }

    /// 実行中なら None
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        if self.0.get() {
            return None;
        }
        self.0.set(true);
        Some(InFlightGuard(Rc::clone(&self.0)))
    }
}

#[derive(Debug)]
pub struct InFlightGuard(Rc<Cell<bool>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// 検出セッション
#[derive(Debug, Default)]
pub struct DetectionSession {
    items: Vec<DetectedItem>,
    hovered_item_id: Option<String>,
    view: ViewState,
    edit: EditState,
    processing: InFlight,
    exporting: InFlight,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<DetectedItem>) -> Self {
        let mut session = Self::new();
        session.replace_items(items);
        session
    }

    /// 品目リストを丸ごと置き換える（新しい画像のアップロード）
    ///
    /// ホバー・編集・ズーム・回転はすべて初期値に戻る。
    pub fn replace_items(&mut self, items: Vec<DetectedItem>) {
        self.items = types::normalize_items(items);
        self.hovered_item_id = None;
        self.edit = EditState::Idle;
        self.view.reset();
    }

    pub fn items(&self) -> &[DetectedItem] {
        &self.items
    }

    /// エクスポート用のコピー
    pub fn snapshot(&self) -> Vec<DetectedItem> {
        self.items.clone()
    }

    pub fn item(&self, id: &str) -> Option<&DetectedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 評価額を手動で設定する
    ///
    /// 未知のIDは何もしない（古いUI参照からしか起きない）。値が同じでも
    /// `is_price_modified` は立つ。戻り値は適用したかどうか。
    pub fn set_value(&mut self, id: &str, value: f64) -> bool {
        if !value.is_finite() {
            tracing::debug!(id, value, "ignoring non-finite value");
            return false;
        }
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.estimated_value = Some(value);
                item.is_price_modified = true;
                true
            }
            None => {
                tracing::debug!(id, "set_value on unknown item id");
                false
            }
        }
    }

    /// 合計額（毎回計算し直す）
    pub fn total_value(&self) -> f64 {
        types::total_value(&self.items)
    }

    // ---- 編集 ----

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    /// 編集を開始する。候補値は現在の評価額（未評価なら0）
    ///
    /// 別の品目を編集中なら、その編集は破棄される。未知のIDでは状態を変えない。
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(item) = self.item(id) else {
            return false;
        };
        let candidate = item.value_or_zero();
        self.edit = EditState::Editing {
            item_id: id.to_string(),
            candidate,
        };
        true
    }

    /// 入力中の候補値を更新する
    pub fn update_candidate(&mut self, value: f64) {
        if let EditState::Editing { candidate, .. } = &mut self.edit {
            *candidate = value;
        }
    }

    /// 指定値で確定する。編集中でなければ何もしない
    pub fn commit_edit(&mut self, value: f64) -> bool {
        match std::mem::take(&mut self.edit) {
            EditState::Editing { item_id, .. } => self.set_value(&item_id, value),
            EditState::Idle => false,
        }
    }

    /// 入力中の候補値で確定する
    pub fn commit_candidate(&mut self) -> bool {
        match &self.edit {
            EditState::Editing { candidate, .. } => {
                let value = *candidate;
                self.commit_edit(value)
            }
            EditState::Idle => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = EditState::Idle;
    }

    // ---- 表示状態 ----

    pub fn hovered_item_id(&self) -> Option<&str> {
        self.hovered_item_id.as_deref()
    }

    /// ホバー対象を設定（同時に1件まで）
    pub fn set_hover(&mut self, id: Option<&str>) {
        self.hovered_item_id = id.map(str::to_string);
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
    }

    pub fn rotate(&mut self) {
        self.view.rotate();
    }

    /// 描画用の入力
    pub fn render_input(&self) -> RenderInput<'_> {
        RenderInput {
            items: &self.items,
            hovered_item_id: self.hovered_item_id.as_deref(),
            transform: self.view.transform(),
        }
    }

    // ---- 実行中フラグ ----

    pub fn processing(&self) -> &InFlight {
        &self.processing
    }

    pub fn exporting(&self) -> &InFlight {
        &self.exporting
    }
}
