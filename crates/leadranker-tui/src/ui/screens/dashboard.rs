use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
    Frame,
};

use leadranker_core::models::{LeadBucket, Usage};
use leadranker_core::utils::format_count;
use leadranker_core::Slot;

use crate::app::App;
use crate::ui::screens::{placeholder, render_box, render_lead_table, titled_block};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stat cards
            Constraint::Length(6), // Usage
            Constraint::Min(5),    // Recent leads
        ])
        .split(area);

    render_stats(frame, app, chunks[0]);
    render_usage_panel(frame, &app.usage, chunks[1]);
    render_recent(frame, app, chunks[2]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.stats, "stats") {
        render_box(frame, area, "Leads", lines);
        return;
    }
    let Some(stats) = app.stats.ready() else {
        return;
    };

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let values = [
        ("Total Leads", stats.total, styles::title_style()),
        ("Hot", stats.hot, styles::bucket_style(LeadBucket::Hot)),
        ("Warm", stats.warm, styles::bucket_style(LeadBucket::Warm)),
        ("Cold", stats.cold, styles::bucket_style(LeadBucket::Cold)),
    ];

    for (card, (label, value, style)) in cards.iter().zip(values) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!(" {}", format_count(value)), style)),
        ];
        let paragraph = Paragraph::new(lines).block(titled_block(label, false));
        frame.render_widget(paragraph, *card);
    }
}

/// Plan, usage gauge and alerts. Shared with the billing screen.
pub(crate) fn render_usage_panel(frame: &mut Frame, usage: &Slot<Usage>, area: Rect) {
    if let Some(lines) = placeholder(usage, "usage") {
        render_box(frame, area, "Usage", lines);
        return;
    }
    let Some(usage) = usage.ready() else {
        return;
    };

    let block = titled_block(&format!("{} · {}", usage.plan_label(), usage.status_label()), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let label = format!(
        "{} / {} leads this month",
        format_count(usage.usage),
        format_count(usage.limit)
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(styles::usage_color(usage.percent, usage.blocked)))
        .ratio(usage.ratio())
        .label(label);
    frame.render_widget(gauge, rows[0]);

    let summary = if usage.blocked {
        Line::from(Span::styled(
            " Monthly limit reached. Upgrade to keep scoring.",
            styles::error_style(),
        ))
    } else {
        Line::from(vec![
            Span::styled(
                format!(" {} remaining", format_count(usage.remaining)),
                styles::muted_style(),
            ),
            Span::styled(format!("  {}", usage.plan_tagline()), styles::muted_style()),
        ])
    };
    frame.render_widget(Paragraph::new(summary), rows[1]);

    let alerts: Vec<Line> = usage
        .alerts
        .iter()
        .map(|a| Line::from(Span::styled(format!(" {}", a.message), styles::alert_style(a.level))))
        .collect();
    frame.render_widget(Paragraph::new(alerts), rows[2]);
}

fn render_recent(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.recent, "recent leads") {
        render_box(frame, area, "Recent Leads", lines);
        return;
    }
    let leads: Vec<_> = app.recent.ready().map(|l| l.iter().collect()).unwrap_or_default();
    if leads.is_empty() {
        render_box(
            frame,
            area,
            "Recent Leads",
            vec![Line::from(Span::styled(
                "No leads yet. Score one with [3] or connect a source with [7].",
                styles::muted_style(),
            ))],
        );
        return;
    }
    render_lead_table(frame, area, "Recent Leads", &leads, None);
}
