use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use crate::app::{App, AppState};
use crate::ui::screens::{field_line, placeholder, render_box, render_form};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    render_account(frame, app, chunks[0]);

    let editing = app.state == AppState::Editing;
    let title = if editing {
        "Preferences"
    } else {
        "Preferences - [e] to edit"
    };
    render_form(frame, chunks[1], title, &app.settings, editing);

    render_box(
        frame,
        chunks[2],
        "Session",
        vec![Line::from(vec![
            Span::styled("[l] ", styles::help_key_style()),
            Span::styled("Log out of this device", styles::help_desc_style()),
        ])],
    );
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![field_line(
        "Signed in",
        app.signed_in_as().unwrap_or_else(|| "-".to_string()),
    )];

    match placeholder(&app.connections, "connections") {
        Some(placeholder_lines) => lines.extend(placeholder_lines),
        None => {
            if let Some(connections) = app.connections.ready() {
                lines.push(field_line("Forward to", connections.email_forwarding.clone()));
                lines.push(field_line("Webhook", connections.webhook_url.clone()));
            }
        }
    }

    render_box(frame, area, "Account", lines);
}
