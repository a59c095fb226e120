use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use crate::app::App;
use crate::ui::screens::{field_line, placeholder, render_box, render_lead_table};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(5)])
        .split(area);

    render_status(frame, app, chunks[0]);
    render_activity(frame, app, chunks[1]);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.connections, "connections") {
        render_box(frame, area, "Lead sources", lines);
        return;
    }
    let Some(connections) = app.connections.ready() else {
        return;
    };

    // A source counts as verified once any lead has arrived through it
    let verified = app.recent.ready().is_some_and(|leads| !leads.is_empty());

    let status = if verified {
        Span::styled("● Receiving leads", styles::success_style())
    } else if connections.is_connected() {
        Span::styled("● Connected, waiting for the first lead", styles::highlight_style())
    } else {
        Span::styled("○ Not connected", styles::muted_style())
    };

    let lines = vec![
        Line::from(status),
        Line::from(""),
        Line::from(Span::styled("Email forwarding", styles::highlight_style())),
        Line::from("Forward lead emails from your inbox to:"),
        field_line("Address", connections.email_forwarding.clone()),
        Line::from(""),
        Line::from(Span::styled("Webhook", styles::highlight_style())),
        field_line("POST to", connections.webhook_url.clone()),
    ];

    render_box(frame, area, "Lead sources", lines);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.recent, "recent leads") {
        render_box(frame, area, "Latest arrivals", lines);
        return;
    }
    let leads: Vec<_> = app.recent.ready().map(|l| l.iter().collect()).unwrap_or_default();
    if leads.is_empty() {
        render_box(
            frame,
            area,
            "Latest arrivals",
            vec![Line::from(Span::styled(
                "Nothing received yet. Send a test email to the address above.",
                styles::muted_style(),
            ))],
        );
        return;
    }
    render_lead_table(frame, area, "Latest arrivals", &leads, None);
}
