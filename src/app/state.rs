//! App state - pure data structure with no I/O logic

use crate::action::{ActionRunner, FieldSpec};
use crate::balance::BalanceReconciler;
use crate::cards::{build_cards, CardContext};
use crate::error::SchemaError;
use crate::messages::render::{BalanceStatus, CardView};
use crate::messages::ui_events::{AppTab, InputMode};
use crate::messages::RenderState;
use crate::models::ReconciledAsset;

/// Main application state
pub struct AppState {
    // Tab navigation
    pub active_tab: AppTab,

    // Action cards
    pub card_context: CardContext,
    pub cards: Vec<ActionRunner>,
    pub selected_card: usize,
    pub selected_field: usize,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub output_scroll: u16,

    // Balances
    pub reconciler: BalanceReconciler,
    pub accounts: Vec<u32>,
    pub account_index: u32,
    pub balances: Vec<ReconciledAsset>,
    pub balance_status: BalanceStatus,
    /// Latest query the dashboard is waiting on
    pub pending_query: Option<u64>,
    /// Latest query whose snapshot or error is on screen
    pub applied_query: u64,
    pub selected_asset: usize,

    // Popups
    pub show_help: bool,
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(card_context: CardContext) -> Result<Self, SchemaError> {
        let cards = build_cards(&card_context)?;
        let reconciler = card_context.reconciler.clone();
        let accounts = card_context.config.account_indices();
        let account_index = accounts.first().copied().unwrap_or(0);
        // Every asset shows as pending until the first snapshot arrives
        let balances = reconciler.reconcile_snapshot(&[]);

        Ok(AppState {
            active_tab: AppTab::Actions,
            card_context,
            cards,
            selected_card: 0,
            selected_field: 0,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            output_scroll: 0,
            reconciler,
            accounts,
            account_index,
            balances,
            balance_status: BalanceStatus::Idle,
            pending_query: None,
            applied_query: 0,
            selected_asset: 0,
            show_help: false,
            status_message: None,
        })
    }

    pub fn selected_runner(&self) -> Option<&ActionRunner> {
        self.cards.get(self.selected_card)
    }

    pub fn selected_runner_mut(&mut self) -> Option<&mut ActionRunner> {
        self.cards.get_mut(self.selected_card)
    }

    /// Field under the cursor on the selected card
    pub fn current_field(&self) -> Option<&FieldSpec> {
        self.selected_runner()?
            .schema()
            .fields()
            .get(self.selected_field)
    }

    /// Current value of the field under the cursor
    pub fn current_input(&self) -> &str {
        match (self.selected_runner(), self.current_field()) {
            (Some(runner), Some(field)) => runner.value(&field.id).unwrap_or(""),
            _ => "",
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            active_tab: self.active_tab,
            cards: self.cards.iter().map(CardView::from_runner).collect(),
            selected_card: self.selected_card,
            selected_field: self.selected_field,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            output_scroll: self.output_scroll,
            account_index: self.account_index,
            balances: self.balances.clone(),
            balance_status: self.balance_status.clone(),
            selected_asset: self.selected_asset,
            show_help: self.show_help,
            status_message: self.status_message.clone(),
        }
    }
}
