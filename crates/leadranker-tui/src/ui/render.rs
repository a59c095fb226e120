use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use leadranker_core::Route;

use crate::app::{App, AppState};

use super::screens::{analytics, auth, billing, connections, dashboard, history, score, settings};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  LeadRanker";
    let right = match app.signed_in_as() {
        Some(email) => format!("{}  [?] Help", email),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + right.chars().count() as u16 + 4)
                as usize,
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.current_route();
    let mut spans = vec![Span::raw(" ")];

    if current.is_protected() {
        for (i, route) in Route::PROTECTED.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let label = format!("[{}] {}", i + 1, route.title());
            if *route == current {
                spans.push(Span::styled(label, styles::tab_style(true)));
            } else {
                spans.push(Span::styled(label, styles::muted_style()));
            }
        }
    } else {
        spans.push(Span::styled(current.title(), styles::tab_style(true)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_route() {
        Route::Login
        | Route::Register
        | Route::ForgotPassword
        | Route::ResetPassword
        | Route::OAuthCallback => auth::render(frame, app, area),
        Route::Dashboard => dashboard::render(frame, app, area),
        Route::History => history::render(frame, app, area),
        Route::Score => score::render(frame, app, area),
        Route::Analytics => analytics::render(frame, app, area),
        Route::Billing => billing::render(frame, app, area),
        Route::Settings => settings::render(frame, app, area),
        Route::Connections => connections::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if !app.current_route().is_protected() {
        "[Tab] next field | [Enter] select | [Esc] back"
    } else if app.state == AppState::Editing {
        "[Tab] next field | [Enter] select | [Esc] done"
    } else {
        "[r]efresh | [?] help | [q]uit"
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.current_route().path()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 27, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  LeadRanker", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-7", "Switch screens"),
        help_line("←/→", "Prev/next screen"),
        help_line("Esc/b", "Go back"),
        help_line("↑/↓", "Move selection"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("e/Enter", "Edit the screen's form"),
        help_line("r", "Refresh"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" History", styles::highlight_style())),
        help_line("f/F", "Next/prev category"),
        help_line("n/p", "Next/prev page"),
        Line::from(""),
        Line::from(Span::styled(" Billing", styles::highlight_style())),
        help_line("Enter", "Upgrade to selected plan"),
        help_line("e", "Invite or verify payment"),
        Line::from(""),
        Line::from(Span::styled(" Settings", styles::highlight_style())),
        help_line("l", "Log out"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
