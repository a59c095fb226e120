use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use leadranker_core::models::{LeadBucket, LeadSummary};
use leadranker_core::utils::format_score;

use crate::app::App;
use crate::ui::screens::{field_line, placeholder, render_box};
use crate::ui::styles;

/// Width of the longest bar in the source breakdown.
const BAR_WIDTH: usize = 30;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.analytics, "analytics") {
        render_box(frame, area, "Analytics", lines);
        return;
    }
    let Some(summary) = app.analytics.ready() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_overview(frame, summary, chunks[0]);
    render_sources(frame, summary, chunks[1]);
}

fn render_overview(frame: &mut Frame, summary: &LeadSummary, area: Rect) {
    let count = |label: &'static str, n: usize, bucket: LeadBucket| {
        Line::from(vec![
            Span::styled(format!("{:<12}", label), styles::muted_style()),
            Span::styled(n.to_string(), styles::bucket_style(bucket)),
        ])
    };

    let lines = vec![
        field_line("Leads", summary.total.to_string()),
        count("Hot", summary.hot, LeadBucket::Hot),
        count("Warm", summary.warm, LeadBucket::Warm),
        count("Cold", summary.cold, LeadBucket::Cold),
        count("Ignored", summary.ignored, LeadBucket::Ignore),
        Line::from(""),
        field_line(
            "Avg score",
            summary
                .average_score
                .map(format_score)
                .unwrap_or_else(|| "-".to_string()),
        ),
        field_line("Top source", summary.top_source.clone()),
    ];

    render_box(frame, area, "Recent leads at a glance", lines);
}

fn render_sources(frame: &mut Frame, summary: &LeadSummary, area: Rect) {
    let max = summary.sources.first().map(|(_, n)| *n).unwrap_or(0);
    let mut lines = vec![];

    for (source, n) in &summary.sources {
        let width = if max == 0 { 0 } else { (n * BAR_WIDTH).div_ceil(max) };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14}", source), styles::list_item_style()),
            Span::styled("█".repeat(width), styles::highlight_style()),
            Span::styled(format!(" {}", n), styles::muted_style()),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("No leads yet.", styles::muted_style())));
    }

    render_box(frame, area, "Leads by source", lines);
}
