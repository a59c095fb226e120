use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use leadranker_core::models::HistoryFilter;
use leadranker_core::utils::{format_phone, format_score, format_timestamp};

use crate::app::App;
use crate::ui::screens::{field_line, placeholder, render_box, render_lead_table};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    render_filters(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_list(frame, app, body[0]);
    render_detail(frame, app, body[1]);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, filter) in HistoryFilter::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *filter == app.history.filter {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(filter.title(), style));
    }
    spans.push(Span::styled("   [f] next category", styles::muted_style()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.history.page, "history") {
        render_box(frame, area, "History", lines);
        return;
    }

    let visible = app.history.visible();
    let more = if app.history.has_next_page() { " [n]ext" } else { "" };
    let prev = if app.history.offset > 0 { " [p]rev" } else { "" };
    let title = format!(
        "History - page {} ({} shown){}{}",
        app.history.page_number(),
        visible.len(),
        prev,
        more
    );

    if visible.is_empty() {
        let message = if app.history.filter == HistoryFilter::All {
            "No leads on this page."
        } else {
            "No leads in this category on this page."
        };
        render_box(
            frame,
            area,
            &title,
            vec![Line::from(Span::styled(message, styles::muted_style()))],
        );
        return;
    }

    render_lead_table(frame, area, &title, &visible, Some(app.history.selection));
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(lead) = app.history.selected() else {
        render_box(frame, area, "Lead", vec![]);
        return;
    };

    let bucket = lead.bucket_or_cold();
    let mut lines = vec![
        Line::from(Span::styled(lead.display_name().to_string(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Score"), styles::muted_style()),
            Span::raw(format!("{}  ", format_score(lead.score_or_zero()))),
            Span::styled(bucket.label(), styles::bucket_style(bucket)),
        ]),
    ];

    if let Some(ref email) = lead.email {
        lines.push(field_line("Email", email.clone()));
    }
    if let Some(ref phone) = lead.phone {
        lines.push(field_line("Phone", format_phone(phone)));
    }
    lines.push(field_line("Source", lead.source_or_default()));
    if let Some(ref campaign) = lead.campaign {
        lines.push(field_line("Campaign", campaign.clone()));
    }
    if let Some(ref sentiment) = lead.sentiment {
        lines.push(field_line("Sentiment", sentiment.clone()));
    }
    if let Some(ref created) = lead.created_at {
        lines.push(field_line("Received", format_timestamp(created)));
    }

    if let Some(ref recommendation) = lead.recommendation {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Next step", styles::highlight_style())));
        lines.push(Line::from(recommendation.clone()));
    }
    if let Some(ref message) = lead.message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Message", styles::highlight_style())));
        lines.push(Line::from(message.clone()));
    }

    render_box(frame, area, "Lead", lines);
}
