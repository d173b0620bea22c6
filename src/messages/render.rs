//! Render state - data structure sent from App layer to UI for rendering

use chrono::{DateTime, Utc};

use crate::action::{ActionRunner, RenderedOutcome};
use crate::messages::ui_events::{AppTab, InputMode};
use crate::models::ReconciledAsset;

/// One form field as shown on a card
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub kind: String,
    pub value: String,
    pub placeholder: Option<String>,
    pub is_selection: bool,
}

/// One action card as shown on the Actions tab
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    pub description: Option<String>,
    pub label: String,
    pub fields: Vec<FieldView>,
    pub state: String,
    pub running: bool,
    pub output: Option<RenderedOutcome>,
}

impl CardView {
    pub fn from_runner(runner: &ActionRunner) -> Self {
        let fields = runner
            .schema()
            .fields()
            .iter()
            .map(|field| FieldView {
                id: field.id.clone(),
                label: field.display_label().to_string(),
                kind: field.kind.as_str().to_string(),
                value: runner.value(&field.id).unwrap_or_default().to_string(),
                placeholder: field.placeholder.clone(),
                is_selection: field.kind.is_selection(),
            })
            .collect();

        CardView {
            title: runner.title().to_string(),
            description: runner.description().map(str::to_string),
            label: runner.label().to_string(),
            fields,
            state: runner.current_outcome().as_str().to_string(),
            running: runner.is_running(),
            output: crate::action::render_outcome(runner.current_outcome()),
        }
    }
}

/// Progress of the balance query for the shown account
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BalanceStatus {
    #[default]
    Idle,
    Loading,
    Ready { updated_at: DateTime<Utc> },
    Failed(String),
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Tab
    pub active_tab: AppTab,

    // Actions
    pub cards: Vec<CardView>,
    pub selected_card: usize,
    pub selected_field: usize,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub output_scroll: u16,

    // Balances
    pub account_index: u32,
    pub balances: Vec<ReconciledAsset>,
    pub balance_status: BalanceStatus,
    pub selected_asset: usize,

    // Popups
    pub show_help: bool,
    pub status_message: Option<String>,
}
