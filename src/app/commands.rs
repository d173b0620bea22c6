//! Command handlers - business logic for processing UI events

use crate::action::{FieldKind, PendingRun, RunCompletion};
use crate::app::AppState;
use crate::cards::build_cards;
use crate::messages::render::BalanceStatus;
use crate::messages::ui_events::{AppTab, InputMode};
use crate::messages::BalanceResponse;
use crate::models::RefreshRequest;

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn switch_tab(&mut self, tab: AppTab) {
        self.active_tab = tab;
        self.input_mode = InputMode::Normal;
    }

    pub fn next_card(&mut self) {
        if !self.cards.is_empty() {
            self.selected_card = (self.selected_card + 1) % self.cards.len();
            self.selected_field = 0;
            self.output_scroll = 0;
        }
    }

    pub fn prev_card(&mut self) {
        if !self.cards.is_empty() {
            self.selected_card = self
                .selected_card
                .checked_sub(1)
                .unwrap_or(self.cards.len() - 1);
            self.selected_field = 0;
            self.output_scroll = 0;
        }
    }

    fn field_count(&self) -> usize {
        self.selected_runner().map(|r| r.schema().len()).unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        let count = self.field_count();
        if count > 0 {
            self.selected_field = (self.selected_field + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.field_count();
        if count > 0 {
            self.selected_field = self.selected_field.checked_sub(1).unwrap_or(count - 1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    // ========================
    // Field editing
    // ========================

    pub fn start_editing(&mut self) {
        let Some(field) = self.current_field() else {
            return;
        };
        if field.kind.is_selection() {
            self.cycle_option(true);
            return;
        }
        if self.selected_runner().is_some_and(|r| r.is_running()) {
            self.status_message = Some("Card is running; inputs are disabled".into());
            return;
        }
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Write a new value into the field under the cursor
    fn set_current_input(&mut self, value: String) -> bool {
        let Some(id) = self.current_field().map(|f| f.id.clone()) else {
            return false;
        };
        let Some(runner) = self.selected_runner_mut() else {
            return false;
        };
        match runner.update_field(&id, value) {
            Ok(()) => true,
            Err(e) => {
                self.status_message = Some(e.to_string());
                self.input_mode = InputMode::Normal;
                false
            }
        }
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = self.cursor_position;
        let mut input = self.current_input().to_string();
        if cursor_pos <= input.len() {
            input.insert(cursor_pos, c);
            if self.set_current_input(input) {
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let cursor_pos = self.cursor_position;
            let mut input = self.current_input().to_string();
            let prev_pos = input[..cursor_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            input.remove(prev_pos);
            if self.set_current_input(input) {
                self.cursor_position = prev_pos;
            }
        }
    }

    /// Step a network or option-select field through its choices
    pub fn cycle_option(&mut self, forward: bool) {
        let (Some(runner), Some(field)) = (self.selected_runner(), self.current_field()) else {
            return;
        };
        let choices: Vec<String> = match &field.kind {
            FieldKind::Network => runner.networks().to_vec(),
            FieldKind::OptionSelect { options } => {
                options.iter().map(|o| o.value.clone()).collect()
            }
            _ => return,
        };
        if choices.is_empty() {
            return;
        }

        let current = runner.value(&field.id).unwrap_or("");
        let next = match choices.iter().position(|c| c == current) {
            Some(i) if forward => (i + 1) % choices.len(),
            Some(i) => i.checked_sub(1).unwrap_or(choices.len() - 1),
            None => 0,
        };
        let value = choices[next].clone();
        self.set_current_input(value);
    }

    // ========================
    // Card actions
    // ========================

    /// Start the selected card; the caller drives the returned run
    pub fn run_selected_card(&mut self) -> Option<PendingRun> {
        self.stop_editing();
        self.output_scroll = 0;
        let runner = self.selected_runner_mut()?;
        let pending = runner.run();
        if pending.is_none() {
            self.status_message = Some("Card is already running".into());
        }
        pending
    }

    /// Rebuild every card; runs still in flight are orphaned
    pub fn reset_cards(&mut self) {
        match build_cards(&self.card_context) {
            Ok(cards) => {
                self.cards = cards;
                self.selected_card = self.selected_card.min(self.cards.len().saturating_sub(1));
                self.selected_field = 0;
                self.output_scroll = 0;
                self.input_mode = InputMode::Normal;
                self.status_message = Some("Cards reset".into());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to rebuild cards");
                self.status_message = Some(format!("Reset failed: {}", e));
            }
        }
    }

    /// Apply a finished run to the card that started it, if it still exists
    pub fn apply_completion(&mut self, completion: RunCompletion) {
        let runner_id = completion.ticket.runner;
        match self.cards.iter_mut().find(|card| card.id() == runner_id) {
            Some(card) => {
                card.complete(completion);
            }
            None => {
                tracing::debug!(
                    runner = runner_id,
                    "Discarding completion for a card that was reset"
                );
            }
        }
    }

    // ========================
    // Balances
    // ========================

    /// Query every configured asset of the shown account
    pub fn fetch_balances(&mut self) {
        let id = self.reconciler.fetch_wallet(self.account_index);
        self.pending_query = Some(id);
        self.balance_status = BalanceStatus::Loading;
    }

    pub fn next_account(&mut self) {
        if self.accounts.len() < 2 {
            return;
        }
        let position = self
            .accounts
            .iter()
            .position(|&a| a == self.account_index)
            .unwrap_or(0);
        self.account_index = self.accounts[(position + 1) % self.accounts.len()];
        self.balances = self.reconciler.reconcile_snapshot(&[]);
        self.selected_asset = 0;
        self.fetch_balances();
    }

    pub fn next_asset(&mut self) {
        if !self.balances.is_empty() {
            self.selected_asset = (self.selected_asset + 1) % self.balances.len();
        }
    }

    pub fn prev_asset(&mut self) {
        if !self.balances.is_empty() {
            self.selected_asset = self
                .selected_asset
                .checked_sub(1)
                .unwrap_or(self.balances.len() - 1);
        }
    }

    fn request_refresh(&mut self, request: RefreshRequest) {
        let id = self.reconciler.request_refresh(request);
        self.pending_query = Some(id);
        self.balance_status = BalanceStatus::Loading;
    }

    pub fn refresh_selected_asset(&mut self) {
        if let Some(entry) = self.balances.get(self.selected_asset) {
            let request = RefreshRequest::asset(
                self.account_index,
                entry.asset.network.clone(),
                Some(entry.asset.id.clone()),
            );
            self.request_refresh(request);
        }
    }

    pub fn refresh_selected_network(&mut self) {
        if let Some(entry) = self.balances.get(self.selected_asset) {
            let request =
                RefreshRequest::network(self.account_index, entry.asset.network.clone());
            self.request_refresh(request);
        }
    }

    pub fn refresh_wallet(&mut self) {
        self.request_refresh(RefreshRequest::wallet(self.account_index));
    }

    /// Process a response from the balance actor.
    ///
    /// Responses to queries older than the one awaited, or older than the
    /// one already shown, are dropped. Newer ones (a refresh started from a
    /// card) are applied.
    pub fn handle_balance_response(&mut self, response: BalanceResponse) {
        let id = response.id();
        if response.account_index() != self.account_index {
            tracing::debug!(
                id,
                account = response.account_index(),
                "Ignoring balances of another account"
            );
            return;
        }
        let floor = self.pending_query.unwrap_or(0).max(self.applied_query);
        if id < floor {
            tracing::debug!(id, latest = floor, "Dropping stale balance response");
            return;
        }
        if response.is_terminal() {
            self.applied_query = id;
            if self.pending_query.is_some_and(|pending| id >= pending) {
                self.pending_query = None;
            }
        }

        match response {
            BalanceResponse::Records { records, .. } => {
                self.balances = self.reconciler.reconcile_snapshot(&records);
                self.selected_asset = self
                    .selected_asset
                    .min(self.balances.len().saturating_sub(1));
                self.balance_status = BalanceStatus::Ready {
                    updated_at: chrono::Utc::now(),
                };
            }
            BalanceResponse::Refreshed {
                request,
                invalidated,
                ..
            } => {
                self.status_message = Some(format!(
                    "Refreshed {} scope ({} cached entries invalidated)",
                    request.scope.as_str(),
                    invalidated
                ));
                self.balance_status = BalanceStatus::Loading;
            }
            BalanceResponse::Error { message, .. } => {
                self.balance_status = BalanceStatus::Failed(message);
            }
        }
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Outcome;
    use crate::balance::{BalanceReconciler, FixtureBalanceSource};
    use crate::cards::CardContext;
    use crate::config::{AccountConfig, AppConfig};
    use crate::messages::BalanceCommand;
    use crate::models::BalanceRecord;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn state() -> (AppState, mpsc::UnboundedReceiver<BalanceCommand>) {
        let mut config = AppConfig::default();
        config.accounts.push(AccountConfig {
            index: 1,
            addresses: Default::default(),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = CardContext {
            reconciler: BalanceReconciler::new(&config, tx),
            config: Arc::new(config),
            source: Arc::new(FixtureBalanceSource::new(Duration::ZERO)),
        };
        (AppState::new(ctx).unwrap(), rx)
    }

    fn select_card(state: &mut AppState, title: &str) {
        state.selected_card = state.cards.iter().position(|c| c.title() == title).unwrap();
        state.selected_field = 0;
    }

    #[test]
    fn test_initial_balances_are_pending() {
        let (state, _rx) = state();
        assert_eq!(state.balances.len(), 4);
        assert!(state.balances.iter().all(|b| b.pending && b.balance == "0"));
        assert_eq!(state.to_render_state().cards.len(), state.cards.len());
    }

    #[test]
    fn test_editing_writes_through_to_card() {
        let (mut state, _rx) = state();
        select_card(&mut state, "Account Address");
        state.next_field();
        state.start_editing();
        assert_eq!(state.input_mode, InputMode::Editing);
        assert_eq!(state.cursor_position, 1);

        state.delete_char();
        state.enter_char('1');
        state.enter_char('2');
        state.move_cursor_left();
        state.enter_char('é');
        assert_eq!(state.current_input(), "1é2");
        state.stop_editing();
        assert_eq!(state.selected_runner().unwrap().value("index"), Some("1é2"));
    }

    #[test]
    fn test_selection_fields_cycle() {
        let (mut state, _rx) = state();
        select_card(&mut state, "Refresh Balances");
        assert_eq!(state.current_input(), "asset");

        state.start_editing();
        assert_eq!(state.input_mode, InputMode::Normal);
        assert_eq!(state.current_input(), "network");
        state.cycle_option(true);
        state.cycle_option(true);
        assert_eq!(state.current_input(), "asset");
        state.cycle_option(false);
        assert_eq!(state.current_input(), "wallet");
    }

    #[tokio::test]
    async fn test_reset_discards_late_completion() {
        let (mut state, _rx) = state();
        select_card(&mut state, "View Config");

        let pending = state.run_selected_card().unwrap();
        assert!(state.run_selected_card().is_none());
        assert_eq!(state.status_message.as_deref(), Some("Card is already running"));

        state.reset_cards();
        let completion = pending.resolve().await;
        state.apply_completion(completion);
        assert_eq!(state.selected_runner().unwrap().current_outcome(), &Outcome::Idle);

        let pending = state.run_selected_card().unwrap();
        state.apply_completion(pending.resolve().await);
        assert!(matches!(
            state.selected_runner().unwrap().current_outcome(),
            Outcome::Succeeded(_)
        ));
    }

    #[test]
    fn test_balance_snapshot_is_reconciled() {
        let (mut state, mut rx) = state();
        state.fetch_balances();
        let Ok(BalanceCommand::FetchWallet { id, account_index: 0 }) = rx.try_recv() else {
            panic!("expected a wallet query");
        };
        assert_eq!(state.balance_status, BalanceStatus::Loading);

        state.handle_balance_response(BalanceResponse::Records {
            id,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "1.5")],
        });
        assert!(matches!(state.balance_status, BalanceStatus::Ready { .. }));
        assert_eq!(state.pending_query, None);
        assert_eq!(state.balances[0].balance, "1.5");
        assert!(!state.balances[0].pending);
        assert!(state.balances[1].pending);
    }

    #[test]
    fn test_other_account_responses_are_ignored() {
        let (mut state, _rx) = state();
        state.handle_balance_response(BalanceResponse::Error {
            id: 1,
            account_index: 1,
            message: "boom".into(),
        });
        assert_eq!(state.balance_status, BalanceStatus::Idle);
    }

    #[test]
    fn test_error_keeps_previous_balances() {
        let (mut state, _rx) = state();
        state.handle_balance_response(BalanceResponse::Records {
            id: 1,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "2")],
        });
        state.handle_balance_response(BalanceResponse::Error {
            id: 2,
            account_index: 0,
            message: "ethereum-usdt: rpc unavailable".into(),
        });
        assert_eq!(
            state.balance_status,
            BalanceStatus::Failed("ethereum-usdt: rpc unavailable".into())
        );
        assert_eq!(state.balances[0].balance, "2");
    }

    #[test]
    fn test_late_error_of_older_query_is_dropped() {
        let (mut state, mut rx) = state();
        state.fetch_balances();
        state.fetch_balances();
        let Ok(BalanceCommand::FetchWallet { id: old, .. }) = rx.try_recv() else {
            panic!("expected a wallet query");
        };
        let Ok(BalanceCommand::FetchWallet { id: new, .. }) = rx.try_recv() else {
            panic!("expected a wallet query");
        };
        assert!(old < new);
        assert_eq!(state.pending_query, Some(new));

        state.handle_balance_response(BalanceResponse::Records {
            id: new,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "3")],
        });
        state.handle_balance_response(BalanceResponse::Error {
            id: old,
            account_index: 0,
            message: "stale".into(),
        });
        assert!(matches!(state.balance_status, BalanceStatus::Ready { .. }));
        assert_eq!(state.balances[0].balance, "3");
    }

    #[test]
    fn test_older_snapshot_does_not_replace_refresh_result() {
        let (mut state, mut rx) = state();
        state.fetch_balances();
        state.refresh_wallet();
        let Ok(BalanceCommand::FetchWallet { id: fetch_id, .. }) = rx.try_recv() else {
            panic!("expected a wallet query");
        };
        let Ok(BalanceCommand::Refresh { id: refresh_id, .. }) = rx.try_recv() else {
            panic!("expected a refresh");
        };
        assert_eq!(state.pending_query, Some(refresh_id));

        state.handle_balance_response(BalanceResponse::Records {
            id: fetch_id,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "1")],
        });
        assert_eq!(state.balance_status, BalanceStatus::Loading);
        assert!(state.balances[0].pending);

        state.handle_balance_response(BalanceResponse::Records {
            id: refresh_id,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "4")],
        });
        assert_eq!(state.balances[0].balance, "4");
        assert_eq!(state.pending_query, None);
    }

    #[test]
    fn test_card_refresh_results_reach_the_dashboard() {
        let (mut state, mut rx) = state();
        state.fetch_balances();
        let Ok(BalanceCommand::FetchWallet { id, .. }) = rx.try_recv() else {
            panic!("expected a wallet query");
        };
        state.handle_balance_response(BalanceResponse::Records {
            id,
            account_index: 0,
            records: vec![],
        });

        // A card refresh takes the next id without touching pending_query
        let card_id = state
            .card_context
            .reconciler
            .request_refresh(RefreshRequest::wallet(0));
        state.handle_balance_response(BalanceResponse::Records {
            id: card_id,
            account_index: 0,
            records: vec![BalanceRecord::new("ethereum", None, "7")],
        });
        assert_eq!(state.balances[0].balance, "7");
        assert_eq!(state.applied_query, card_id);
    }

    #[test]
    fn test_refresh_keys_send_scoped_requests() {
        let (mut state, mut rx) = state();
        state.selected_asset = 1;
        state.refresh_selected_asset();
        state.refresh_selected_network();
        state.next_account();
        state.refresh_wallet();

        let mut requests = Vec::new();
        while let Ok(command) = rx.try_recv() {
            requests.push(command);
        }
        assert_eq!(
            requests,
            vec![
                BalanceCommand::Refresh {
                    id: 1,
                    request: RefreshRequest::asset(0, "ethereum", Some("ethereum-usdt".into())),
                },
                BalanceCommand::Refresh {
                    id: 2,
                    request: RefreshRequest::network(0, "ethereum"),
                },
                BalanceCommand::FetchWallet { id: 3, account_index: 1 },
                BalanceCommand::Refresh {
                    id: 4,
                    request: RefreshRequest::wallet(1),
                },
            ]
        );
        assert_eq!(state.pending_query, Some(4));
    }
}
