//! App actor - message loop processing UI events, balance responses and
//! finished card runs

use tokio::sync::mpsc;

use crate::action::{PendingRun, RunCompletion};
use crate::app::state::AppState;
use crate::messages::{BalanceResponse, RenderState, UiEvent};

/// App actor that processes UI events and balance responses
pub struct AppActor {
    state: AppState,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(state: AppState, render_tx: mpsc::UnboundedSender<RenderState>) -> Self {
        AppActor { state, render_tx }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut balance_rx: mpsc::UnboundedReceiver<BalanceResponse>,
    ) {
        let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<RunCompletion>();

        self.state.fetch_balances();
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event, &completion_tx) {
                        // Quit signal received
                        self.state.reconciler.shutdown();
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = balance_rx.recv() => {
                    self.state.handle_balance_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(completion) = completion_rx.recv() => {
                    self.state.apply_completion(completion);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(
        &mut self,
        event: UiEvent,
        completion_tx: &mpsc::UnboundedSender<RunCompletion>,
    ) -> bool {
        self.state.status_message = None;

        match event {
            // Tab switching
            UiEvent::SwitchTab(tab) => self.state.switch_tab(tab),

            // Card navigation
            UiEvent::NextCard => self.state.next_card(),
            UiEvent::PrevCard => self.state.prev_card(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Field editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),
            UiEvent::NextOption => self.state.cycle_option(true),
            UiEvent::PrevOption => self.state.cycle_option(false),

            // Card actions
            UiEvent::RunCard => {
                if let Some(pending) = self.state.run_selected_card() {
                    spawn_run(pending, completion_tx);
                }
            }
            UiEvent::ResetCards => self.state.reset_cards(),

            // Balances
            UiEvent::NextAsset => self.state.next_asset(),
            UiEvent::PrevAsset => self.state.prev_asset(),
            UiEvent::NextAccount => self.state.next_account(),
            UiEvent::RefreshAsset => self.state.refresh_selected_asset(),
            UiEvent::RefreshNetwork => self.state.refresh_selected_network(),
            UiEvent::RefreshWallet => self.state.refresh_wallet(),
            UiEvent::Refetch => self.state.fetch_balances(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

/// Drive a card run on the runtime and report back when it settles
fn spawn_run(pending: PendingRun, completion_tx: &mpsc::UnboundedSender<RunCompletion>) {
    let completion_tx = completion_tx.clone();
    tokio::spawn(async move {
        let completion = pending.resolve().await;
        let _ = completion_tx.send(completion);
    });
}
