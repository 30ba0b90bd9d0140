use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, FocusPane};
use crate::state::{EditableField, EditorInput};

pub enum Action {
    Quit,
    None,
    Redraw,
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // An open editor takes every key.
    if app.editor.is_some() {
        return handle_editor_input(app, key);
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
            return Action::Redraw;
        }
        return Action::None;
    }

    // Global keybindings
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Tab => {
            app.cycle_focus();
            return Action::Redraw;
        }
        KeyCode::BackTab => {
            app.cycle_focus_reverse();
            return Action::Redraw;
        }
        KeyCode::Esc => {
            app.clear_selection();
            return Action::Redraw;
        }
        KeyCode::Char('?') => {
            app.show_help = true;
            return Action::Redraw;
        }
        KeyCode::Char('c') => {
            app.clear_filters();
            return Action::Redraw;
        }
        KeyCode::Char('r') => {
            app.reload_conversations();
            return Action::Redraw;
        }
        KeyCode::Char('t') => {
            app.toggle_checkbox(EditableField::Template);
            return Action::Redraw;
        }
        KeyCode::Char('x') => {
            app.export_selected();
            return Action::Redraw;
        }
        _ => {}
    }

    // Pane-specific keybindings
    match app.focus {
        FocusPane::Filters => handle_filters_input(app, key),
        FocusPane::Conversations => handle_conversations_input(app, key),
        FocusPane::Messages => handle_messages_input(app, key),
        FocusPane::Details => handle_details_input(app, key),
    }
}

fn handle_editor_input(app: &mut App, key: KeyEvent) -> Action {
    let is_select = matches!(
        app.editor.as_ref().map(|e| &e.input),
        Some(EditorInput::Select { .. })
    );

    match key.code {
        KeyCode::Enter => app.confirm_edit(),
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Tab => app.cycle_focus(),
        KeyCode::BackTab => app.cycle_focus_reverse(),
        KeyCode::Down | KeyCode::Char('j') if is_select => {
            if let Some(editor) = app.editor.as_mut() {
                editor.move_selection(1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') if is_select => {
            if let Some(editor) = app.editor.as_mut() {
                editor.move_selection(-1);
            }
        }
        KeyCode::Backspace => {
            if let Some(editor) = app.editor.as_mut() {
                editor.pop_char();
            }
        }
        KeyCode::Char(c) => {
            if let Some(editor) = app.editor.as_mut() {
                editor.push_char(c);
            }
        }
        _ => return Action::None,
    }
    Action::Redraw
}

fn handle_filters_input(app: &mut App, key: KeyEvent) -> Action {
    let len = app.chip_count();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.filter_state.next(len);
            Action::Redraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.filter_state.previous(len);
            Action::Redraw
        }
        KeyCode::Char('g') => {
            app.filter_state.first();
            Action::Redraw
        }
        KeyCode::Char('G') => {
            app.filter_state.last(len);
            Action::Redraw
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.toggle_focused_chip();
            Action::Redraw
        }
        _ => Action::None,
    }
}

fn handle_conversations_input(app: &mut App, key: KeyEvent) -> Action {
    let len = app.conversations.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.list_state.next(len);
            app.select_highlighted();
            Action::Redraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.list_state.previous(len);
            app.select_highlighted();
            Action::Redraw
        }
        KeyCode::Char('g') => {
            app.list_state.first();
            app.select_highlighted();
            Action::Redraw
        }
        KeyCode::Char('G') => {
            app.list_state.last(len);
            app.select_highlighted();
            Action::Redraw
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.select_highlighted();
            app.focus = FocusPane::Details;
            Action::Redraw
        }
        _ => Action::None,
    }
}

fn handle_messages_input(app: &mut App, key: KeyEvent) -> Action {
    let viewport_height = app.viewport_height.unwrap_or(20);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.message_state.scroll_down(1, viewport_height);
            Action::Redraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.message_state.scroll_up(1);
            Action::Redraw
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.message_state
                .scroll_down(viewport_height / 2, viewport_height);
            Action::Redraw
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.message_state.scroll_up(viewport_height / 2);
            Action::Redraw
        }
        KeyCode::PageDown => {
            app.message_state
                .scroll_down(viewport_height, viewport_height);
            Action::Redraw
        }
        KeyCode::PageUp => {
            app.message_state.scroll_up(viewport_height);
            Action::Redraw
        }
        KeyCode::Char('g') => {
            app.message_state.scroll_to_top();
            Action::Redraw
        }
        KeyCode::Char('G') => {
            app.message_state.scroll_to_bottom(viewport_height);
            Action::Redraw
        }
        KeyCode::Char(' ') => {
            app.toggle_checkbox(EditableField::Template);
            Action::Redraw
        }
        _ => Action::None,
    }
}

fn handle_details_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_field_cursor(1);
            Action::Redraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_field_cursor(-1);
            Action::Redraw
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.activate_field();
            Action::Redraw
        }
        _ => Action::None,
    }
}
