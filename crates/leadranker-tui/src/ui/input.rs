//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use leadranker_core::Route;

use crate::app::{App, AppState};
use crate::form::FormFocus;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = resting_state(app);
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = resting_state(app);
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::Editing => {
            handle_form_input(app, key);
            Ok(false)
        }
        AppState::Normal => {
            handle_screen_input(app, key);
            Ok(false)
        }
        AppState::Quitting => Ok(true),
    }
}

/// State to return to after an overlay closes.
fn resting_state(app: &App) -> AppState {
    if app.current_route().is_protected() {
        AppState::Normal
    } else {
        AppState::Editing
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    let route = app.current_route();

    if key.code == KeyCode::Esc {
        if route.is_protected() {
            app.state = AppState::Normal;
        } else if app.nav.history().len() > 1 {
            app.back();
        } else {
            app.state = AppState::ConfirmingQuit;
        }
        return;
    }

    let Some(form) = app.current_form_mut() else {
        app.state = resting_state(app);
        return;
    };

    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.insert(c),
        KeyCode::Enter => match form.focus() {
            FormFocus::Field(_) => form.focus_next(),
            FormFocus::Action(idx) => app.activate(idx),
        },
        _ => {}
    }
}

fn handle_screen_input(app: &mut App, key: KeyEvent) {
    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return;
        }
        KeyCode::Char(c @ '1'..='7') => {
            let idx = c as usize - '1' as usize;
            app.navigate(Route::PROTECTED[idx]);
            return;
        }
        KeyCode::Left => {
            app.prev_tab();
            return;
        }
        KeyCode::Right => {
            app.next_tab();
            return;
        }
        KeyCode::Char('r') => {
            app.refresh();
            return;
        }
        KeyCode::Esc | KeyCode::Char('b') => {
            app.back();
            return;
        }
        _ => {}
    }

    // Screen-specific keys
    match app.current_route() {
        Route::History => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => app.move_selection(false),
            KeyCode::Char('f') => app.cycle_history_filter(true),
            KeyCode::Char('F') => app.cycle_history_filter(false),
            KeyCode::Char('n') | KeyCode::PageDown => app.history_next_page(),
            KeyCode::Char('p') | KeyCode::PageUp => app.history_prev_page(),
            _ => {}
        },
        Route::Score => {
            if matches!(key.code, KeyCode::Char('e') | KeyCode::Enter) {
                app.state = AppState::Editing;
            }
        }
        Route::Billing => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => app.move_selection(false),
            KeyCode::Enter | KeyCode::Char('u') => app.start_checkout(),
            KeyCode::Char('e') => app.state = AppState::Editing,
            _ => {}
        },
        Route::Settings => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => app.state = AppState::Editing,
            KeyCode::Char('l') => app.logout(),
            _ => {}
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use leadranker_core::auth::{MemoryBackend, TokenStore};
    use leadranker_core::{ApiClient, Config, Session, SessionCredential};

    use super::*;
    use crate::app::{LOGIN_EMAIL, LOGIN_PASSWORD, SCORE_NAME};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c))).expect("input");
        }
    }

    // Requests go to a closed port; these tests never wait on them
    fn app(signed_in: bool) -> App {
        let backend = if signed_in {
            MemoryBackend::with_credential(SessionCredential::new("tok", None))
        } else {
            MemoryBackend::new()
        };
        let store = Arc::new(TokenStore::new(backend));
        let api = ApiClient::new("http://127.0.0.1:9", store).expect("client");
        let mut app = App::new(Config::default(), Session::new(api));
        app.save_config = false;
        app
    }

    // ------------------------------------------------------------------------
    // Auth screens
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_form_typing_and_focus() {
        let mut app = app(false);
        app.start(Route::Dashboard);

        type_text(&mut app, "agent@example.com");
        handle_input(&mut app, key(KeyCode::Tab)).expect("input");
        type_text(&mut app, "pw");

        assert_eq!(app.login.value(LOGIN_EMAIL), "agent@example.com");
        assert_eq!(app.login.value(LOGIN_PASSWORD), "pw");
    }

    #[tokio::test]
    async fn test_login_link_actions_navigate() {
        let mut app = app(false);
        app.start(Route::Login);

        // Email, password, then Sign In, Google, Create account
        for _ in 0..4 {
            handle_input(&mut app, key(KeyCode::Tab)).expect("input");
        }
        handle_input(&mut app, key(KeyCode::Enter)).expect("input");
        assert_eq!(app.current_route(), Route::Register);

        handle_input(&mut app, key(KeyCode::Esc)).expect("input");
        assert_eq!(app.current_route(), Route::Login);
    }

    #[tokio::test]
    async fn test_esc_on_root_login_asks_to_quit() {
        let mut app = app(false);
        app.start(Route::Login);

        handle_input(&mut app, key(KeyCode::Esc)).expect("input");
        assert_eq!(app.state, AppState::ConfirmingQuit);

        handle_input(&mut app, key(KeyCode::Char('n'))).expect("input");
        assert_eq!(app.state, AppState::Editing);

        handle_input(&mut app, key(KeyCode::Esc)).expect("input");
        let quit = handle_input(&mut app, key(KeyCode::Char('y'))).expect("input");
        assert!(quit);
    }

    #[tokio::test]
    async fn test_number_keys_are_guarded_when_signed_out() {
        let mut app = app(false);
        app.start(Route::Login);
        app.state = AppState::Normal;

        handle_input(&mut app, key(KeyCode::Char('5'))).expect("input");
        assert_eq!(app.current_route(), Route::Login);
    }

    // ------------------------------------------------------------------------
    // Protected screens
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_number_keys_switch_screens() {
        let mut app = app(true);
        app.start(Route::Dashboard);

        handle_input(&mut app, key(KeyCode::Char('5'))).expect("input");
        assert_eq!(app.current_route(), Route::Billing);

        handle_input(&mut app, key(KeyCode::Right)).expect("input");
        assert_eq!(app.current_route(), Route::Settings);

        handle_input(&mut app, key(KeyCode::Esc)).expect("input");
        assert_eq!(app.current_route(), Route::Billing);
    }

    #[tokio::test]
    async fn test_tab_cycling_wraps() {
        let mut app = app(true);
        app.start(Route::Dashboard);

        handle_input(&mut app, key(KeyCode::Left)).expect("input");
        assert_eq!(app.current_route(), Route::Connections);
        handle_input(&mut app, key(KeyCode::Right)).expect("input");
        assert_eq!(app.current_route(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_score_form_needs_edit_mode() {
        let mut app = app(true);
        app.start(Route::Score);

        // Commands, not text, while browsing
        handle_input(&mut app, key(KeyCode::Char('a'))).expect("input");
        assert_eq!(app.score.form.value(SCORE_NAME), "");

        handle_input(&mut app, key(KeyCode::Char('e'))).expect("input");
        assert_eq!(app.state, AppState::Editing);
        type_text(&mut app, "q1");
        assert_eq!(app.score.form.value(SCORE_NAME), "q1");
        assert_eq!(app.state, AppState::Editing);

        handle_input(&mut app, key(KeyCode::Esc)).expect("input");
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.current_route(), Route::Score);
    }

    #[tokio::test]
    async fn test_help_overlay_toggles() {
        let mut app = app(true);
        app.start(Route::Dashboard);

        handle_input(&mut app, key(KeyCode::Char('?'))).expect("input");
        assert_eq!(app.state, AppState::ShowingHelp);
        handle_input(&mut app, key(KeyCode::Char('?'))).expect("input");
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_settings_logout_key() {
        let mut app = app(true);
        app.start(Route::Settings);

        handle_input(&mut app, key(KeyCode::Char('l'))).expect("input");
        assert_eq!(app.current_route(), Route::Login);
        assert!(app.session.current().is_none());
    }
}
