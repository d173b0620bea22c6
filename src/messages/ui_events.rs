//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application tabs
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum AppTab {
    #[default]
    Actions,
    Balances,
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Tab navigation
    SwitchTab(AppTab),

    // Card navigation
    NextCard,
    PrevCard,
    NextField,
    PrevField,
    ScrollUp,
    ScrollDown,

    // Field editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,
    NextOption,
    PrevOption,

    // Card actions
    RunCard,
    ResetCards,

    // Balances
    NextAsset,
    PrevAsset,
    NextAccount,
    RefreshAsset,
    RefreshNetwork,
    RefreshWallet,
    Refetch,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_tab: AppTab,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    // Tab switching: 1 and 2 keys (only in normal mode, not editing)
    if input_mode == InputMode::Normal {
        match key.code {
            KeyCode::Char('1') => return Some(UiEvent::SwitchTab(AppTab::Actions)),
            KeyCode::Char('2') => return Some(UiEvent::SwitchTab(AppTab::Balances)),
            _ => {}
        }
    }

    match active_tab {
        AppTab::Actions => handle_actions_tab_keys(key, input_mode),
        AppTab::Balances => handle_balances_tab_keys(key),
    }
}

/// Handle keys for the Actions tab
fn handle_actions_tab_keys(key: KeyEvent, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevCard),
            KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextCard),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::BackTab => Some(UiEvent::PrevField),
            KeyCode::Left => Some(UiEvent::PrevOption),
            KeyCode::Right => Some(UiEvent::NextOption),
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Char('r') | KeyCode::Char('s') => Some(UiEvent::RunCard),
            KeyCode::Char('x') => Some(UiEvent::ResetCards),
            KeyCode::PageUp => Some(UiEvent::ScrollUp),
            KeyCode::PageDown => Some(UiEvent::ScrollDown),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        },
    }
}

/// Handle keys for the Balances tab
fn handle_balances_tab_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevAsset),
        KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextAsset),
        KeyCode::Char('a') => Some(UiEvent::NextAccount),
        KeyCode::Char('r') | KeyCode::Enter => Some(UiEvent::RefreshAsset),
        KeyCode::Char('n') => Some(UiEvent::RefreshNetwork),
        KeyCode::Char('w') => Some(UiEvent::RefreshWallet),
        KeyCode::Char('f') => Some(UiEvent::Refetch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_digits_switch_tabs_only_in_normal_mode() {
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('2')), AppTab::Actions, InputMode::Normal, false),
            Some(UiEvent::SwitchTab(AppTab::Balances))
        );
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('2')), AppTab::Actions, InputMode::Editing, false),
            Some(UiEvent::CharInput('2'))
        );
    }

    #[test]
    fn test_help_swallows_keys() {
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('r')), AppTab::Balances, InputMode::Normal, true),
            Some(UiEvent::CloseHelp)
        );
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            key_to_ui_event(key, AppTab::Actions, InputMode::Editing, false),
            Some(UiEvent::Quit)
        );
    }

    #[test]
    fn test_same_key_maps_per_tab() {
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('r')), AppTab::Actions, InputMode::Normal, false),
            Some(UiEvent::RunCard)
        );
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('r')), AppTab::Balances, InputMode::Normal, false),
            Some(UiEvent::RefreshAsset)
        );
    }
}
