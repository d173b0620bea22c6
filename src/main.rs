//! WalletDeck TUI - Actor-based wallet SDK showcase
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Balance Layer (Tokio) - cached balance fetches and refreshes

use std::io;
use std::sync::Arc;
use std::time::Duration;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use tokio::sync::mpsc;

use walletdeck::app::{AppActor, AppState};
use walletdeck::balance::{source_from_config, BalanceActor, BalanceReconciler};
use walletdeck::cards::CardContext;
use walletdeck::config::AppConfig;
use walletdeck::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use walletdeck::messages::render::{BalanceStatus, CardView};
use walletdeck::messages::ui_events::{key_to_ui_event, AppTab, InputMode};
use walletdeck::messages::{BalanceCommand, BalanceResponse, RenderState, UiEvent};
use walletdeck::ui::{self, balance_color, field_kind_color, highlight_json, outcome_color};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = Arc::new(AppConfig::load()?);
    tracing::info!(
        version = APP_VERSION,
        source = ?config.balance_source,
        accounts = config.accounts.len(),
        "Starting"
    );

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (balance_cmd_tx, balance_cmd_rx) = mpsc::unbounded_channel::<BalanceCommand>();
    let (balance_resp_tx, balance_resp_rx) = mpsc::unbounded_channel::<BalanceResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn balance actor
    let source = source_from_config(&config);
    let balance_actor = BalanceActor::new(&config, Arc::clone(&source), balance_resp_tx);
    tokio::spawn(balance_actor.run(balance_cmd_rx));

    // Spawn app actor
    let card_context = CardContext {
        reconciler: BalanceReconciler::new(&config, balance_cmd_tx),
        config,
        source,
    };
    let app_actor = AppActor::new(AppState::new(card_context)?, render_tx);
    tokio::spawn(app_actor.run(ui_rx, balance_resp_rx));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _terminal_guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_tab,
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Tab bar
            Constraint::Min(0),     // Content
            Constraint::Length(1),  // Status bar
        ])
        .split(area);

    draw_tab_bar(f, state, main_chunks[0]);

    match state.active_tab {
        AppTab::Actions => draw_actions_tab(f, state, main_chunks[1]),
        AppTab::Balances => draw_balances_tab(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    let selected = match state.active_tab {
        AppTab::Actions => 0,
        AppTab::Balances => 1,
    };
    f.render_widget(ui::render_tabs(&[" 1:Actions ", " 2:Balances "], selected), chunks[0]);

    let title = Paragraph::new(format!("{} v{} ", APP_NAME, APP_VERSION))
        .style(Style::default().fg(Color::DarkGray))
        .right_aligned();
    f.render_widget(title, chunks[1]);
}

fn draw_actions_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(area);

    // Card list
    let items: Vec<ListItem> = state
        .cards
        .iter()
        .map(|card| {
            let badge = Span::styled(
                format!("{:9}", card.state),
                Style::default().fg(outcome_color(&card.state)),
            );
            ListItem::new(Line::from(vec![badge, Span::raw(card.title.clone())]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Cards (↑/↓) "))
        .highlight_style(Style::default().fg(Color::Yellow).bold());
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_card));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    match state.cards.get(state.selected_card) {
        Some(card) => draw_card(f, state, card, chunks[1]),
        None => {
            let empty = Paragraph::new("No cards configured.")
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, chunks[1]);
        }
    }
}

fn draw_card(f: &mut Frame, state: &RenderState, card: &CardView, area: Rect) {
    let form_height = card.fields.len() as u16 * 3 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Description
            Constraint::Length(form_height),  // Fields
            Constraint::Min(3),               // Output
        ])
        .split(area);

    let description = Paragraph::new(card.description.clone().unwrap_or_default())
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", card.title))
                .title_style(Style::default().fg(Color::Cyan).bold()),
        );
    f.render_widget(description, chunks[0]);

    // Fields
    let form_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" [{}] (r:run  x:reset) ", card.label));
    let form_area = form_block.inner(chunks[1]);
    f.render_widget(form_block, chunks[1]);

    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(card.fields.iter().map(|_| Constraint::Length(3)))
        .split(form_area);

    for (i, (field, field_area)) in card.fields.iter().zip(field_areas.iter()).enumerate() {
        let is_focused = i == state.selected_field;
        let editing = is_focused && state.input_mode == InputMode::Editing;
        let border_style = if editing {
            Style::default().fg(Color::Yellow)
        } else if is_focused {
            Style::default().fg(Color::Cyan)
        } else if card.running {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let title = Line::from(vec![
            Span::raw(format!(" {} ", field.label)),
            Span::styled(
                format!("<{}> ", field.kind),
                Style::default().fg(field_kind_color(&field.kind)),
            ),
        ]);
        let content = if field.value.is_empty() {
            Span::styled(
                field.placeholder.clone().unwrap_or_default(),
                Style::default().fg(Color::DarkGray),
            )
        } else if field.is_selection {
            Span::raw(format!("◀ {} ▶", field.value))
        } else {
            Span::raw(field.value.clone())
        };

        let input = Paragraph::new(Line::from(content)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );
        f.render_widget(input, *field_area);

        if editing {
            let max_x = field_area.x + field_area.width.saturating_sub(2);
            let cursor_x = (field_area.x + state.cursor_position as u16 + 1).min(max_x);
            f.set_cursor_position(Position::new(cursor_x, field_area.y + 1));
        }
    }

    // Output
    let (lines, border_color) = match &card.output {
        Some(output) if output.is_error => (
            vec![Line::from(Span::styled(output.text.clone(), Style::default().fg(Color::Red)))],
            Color::Red,
        ),
        Some(output) => (highlight_json(&output.text), Color::Green),
        None if card.running => (vec![Line::from("Running...")], Color::Yellow),
        None => (
            vec![Line::from(Span::styled("No output yet.", Style::default().fg(Color::DarkGray)))],
            Color::DarkGray,
        ),
    };

    let output = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Output (PgUp/PgDn) "),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.output_scroll, 0));
    f.render_widget(output, chunks[2]);
}

fn draw_balances_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let header = Row::new(vec!["Asset", "Symbol", "Network", "Balance", ""])
        .style(Style::default().fg(Color::Cyan).bold());

    let rows: Vec<Row> = state
        .balances
        .iter()
        .map(|entry| {
            let style = Style::default().fg(balance_color(entry.pending));
            Row::new(vec![
                Cell::from(entry.asset.name.clone()),
                Cell::from(entry.asset.symbol.clone()),
                Cell::from(entry.asset.network.clone()),
                Cell::from(entry.balance.clone()).style(style),
                Cell::from(if entry.pending { "pending" } else { "" }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Percentage(30),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Balances - account {} ", state.account_index)),
    )
    .row_highlight_style(Style::default().fg(Color::Yellow).bold());

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected_asset));
    f.render_stateful_widget(table, chunks[0], &mut table_state);

    let (status, color) = match &state.balance_status {
        BalanceStatus::Idle => ("Not loaded".to_string(), Color::DarkGray),
        BalanceStatus::Loading => ("Loading...".to_string(), Color::Yellow),
        BalanceStatus::Ready { updated_at } => (
            format!("Updated {}", updated_at.format("%H:%M:%S UTC")),
            Color::Green,
        ),
        BalanceStatus::Failed(message) => (format!("Error: {}", message), Color::Red),
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(status, chunks[1]);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let hint = if state.input_mode == InputMode::Editing {
        " ESC/Enter:stop editing | ←/→:move "
    } else {
        match state.active_tab {
            AppTab::Actions => {
                " ↑/↓:card | Tab:field | e:edit | ←/→:option | r:run | ?:help | q:quit "
            }
            AppTab::Balances => {
                " ↑/↓:asset | r:asset | n:network | w:wallet | a:account | f:fetch | q:quit "
            }
        }
    };

    let text = match &state.status_message {
        Some(message) => Span::styled(format!(" {} ", message), Style::default().fg(Color::Yellow)),
        None => Span::styled(hint, Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(Paragraph::new(Line::from(text)), area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = r#"
 WALLETDECK - Keyboard Shortcuts

 ACTIONS TAB
   ↑ / ↓              Select card
   Tab / Shift+Tab    Select field
   e / Enter          Edit field (cycles network/option fields)
   ← / →              Previous / next option
   r / s              Run card
   x                  Reset all cards
   PgUp / PgDn        Scroll output

 BALANCES TAB
   ↑ / ↓              Select asset
   r / Enter          Refresh selected asset
   n                  Refresh selected asset's network
   w                  Refresh whole wallet
   a                  Next account
   f                  Fetch again (cached entries are reused)

 GENERAL
   1 / 2              Switch tab
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
