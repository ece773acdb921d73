use arboard::Clipboard;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;

use crate::app::{App, Notice, Tab};
use crate::network::ActionGateway;

/// Applies one key press to the app. Remote calls it triggers are awaited
/// before returning, so the caller can render the result right away.
pub async fn handle_key<G: ActionGateway>(key: KeyEvent, app: &mut App, gateway: &G) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // a pending delete swallows the next key
    if app.confirm_delete.is_some() {
        let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
        app.confirm_delete(gateway, confirmed).await;
        return;
    }

    if app.config_panel.editing.is_none() {
        match key.code {
            KeyCode::Tab => {
                app.tab = app.tab.next();
                return;
            }
            KeyCode::BackTab => {
                app.tab = app.tab.prev();
                return;
            }
            _ => {}
        }
    }

    match app.tab {
        Tab::Dispatch => handle_dispatch_key(key, app, gateway).await,
        Tab::Manage => handle_manage_key(key, app, gateway).await,
        Tab::Configuration => handle_config_key(key, app),
    }
}

async fn handle_dispatch_key<G: ActionGateway>(key: KeyEvent, app: &mut App, gateway: &G) {
    let field = app.form_field;
    match key.code {
        KeyCode::Up => app.form_field = field.prev(),
        KeyCode::Down => app.form_field = field.next(),
        KeyCode::Enter => app.submit_dispatch(gateway).await,
        KeyCode::Esc => app.notice = None,
        KeyCode::Left | KeyCode::Char('-') if field.is_numeric() => app.adjust_numeric(field, |v| v - 1),
        KeyCode::Right | KeyCode::Char('+') if field.is_numeric() => app.adjust_numeric(field, |v| v + 1),
        KeyCode::Backspace if field.is_numeric() => app.adjust_numeric(field, |v| v / 10),
        KeyCode::Char(c) if field.is_numeric() => {
            if let Some(d) = c.to_digit(10) {
                app.adjust_numeric(field, |v| v.saturating_mul(10).saturating_add(i64::from(d)));
            }
        }
        KeyCode::Backspace => {
            if let Some(text) = app.draft_field_mut(field) {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = app.draft_field_mut(field) {
                text.push(c);
            }
        }
        _ => {}
    }
}

async fn handle_manage_key<G: ActionGateway>(key: KeyEvent, app: &mut App, gateway: &G) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor_down(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_page(),
        KeyCode::Right | KeyCode::Char('l') => app.next_page(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Enter | KeyCode::Char('v') => app.view_highlighted(),
        KeyCode::Char('a') => app.archive_highlighted(gateway).await,
        KeyCode::Char('c') => app.complete_highlighted(gateway).await,
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('t') => app.toggle_raw(),
        KeyCode::Char('y') => copy_highlighted_id(app),
        KeyCode::PageUp => app.detail_scroll = app.detail_scroll.saturating_sub(5),
        KeyCode::PageDown => app.detail_scroll = app.detail_scroll.saturating_add(5),
        KeyCode::Esc => app.notice = None,
        _ => {}
    }
}

fn handle_config_key(key: KeyEvent, app: &mut App) {
    if let Some(buffer) = app.config_panel.editing.as_mut() {
        match key.code {
            KeyCode::Enter => app.commit_config_edit(),
            KeyCode::Esc => app.config_panel.cancel(),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
        return;
    }

    let len = crate::config_panel::entries(&app.settings).len();
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.config_panel.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.config_panel.move_down(len),
        KeyCode::Enter => {
            if !app.config_panel.begin_edit(&app.settings) {
                app.notice = Some(Notice::info("This field is not editable here."));
            }
        }
        KeyCode::Esc => app.notice = None,
        _ => {}
    }
}

fn copy_highlighted_id(app: &mut App) {
    let Some(id) = app.highlighted_poll().map(|p| p.internal_poll_group_id.clone()) else {
        return;
    };
    let copied = Clipboard::new().and_then(|mut cb| cb.set_text(id.clone()));
    app.notice = Some(match copied {
        Ok(()) => Notice::info(format!("Copied {} to clipboard", id)),
        Err(err) => {
            warn!("clipboard unavailable: {}", err);
            Notice::info(format!("Clipboard unavailable, poll ID: {}", id))
        }
    });
}
