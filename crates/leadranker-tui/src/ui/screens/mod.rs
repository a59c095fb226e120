//! Per-route content rendering.
//!
//! Each screen renders into the main content area. Shared pieces (form
//! boxes, lead tables, loading/error placeholders) live here.

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod connections;
pub mod dashboard;
pub mod history;
pub mod score;
pub mod settings;

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use leadranker_core::models::Lead;
use leadranker_core::utils::{format_score, format_timestamp, truncate};
use leadranker_core::Slot;

use crate::form::{Form, FormFocus};
use crate::ui::styles;

/// Lines to show in place of data that is not ready. `None` once it is.
pub(crate) fn placeholder<T>(slot: &Slot<T>, what: &str) -> Option<Vec<Line<'static>>> {
    match slot {
        Slot::Ready(_) => None,
        Slot::Idle | Slot::Loading => Some(vec![Line::from(Span::styled(
            format!("Loading {}...", what),
            styles::muted_style(),
        ))]),
        Slot::Failed(message) => Some(vec![
            Line::from(Span::styled(
                format!("Could not load {}", what),
                styles::error_style(),
            )),
            Line::from(Span::styled(message.clone(), styles::muted_style())),
            Line::from(""),
            Line::from(Span::styled("Press [r] to retry", styles::muted_style())),
        ]),
    }
}

pub(crate) fn titled_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

/// Render `lines` in a bordered box.
pub(crate) fn render_box(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'_>>) {
    let paragraph = Paragraph::new(lines)
        .block(titled_block(title, false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Label/value line used in detail panels.
pub(crate) fn field_line<'a>(label: &'a str, value: impl Into<String>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), styles::muted_style()),
        Span::raw(value.into()),
    ])
}

/// Lines for a form: labelled inputs, then actions, then error or notice.
pub(crate) fn form_lines(form: &Form, active: bool) -> Vec<Line<'static>> {
    let focus = form.focus();
    let mut lines = vec![];

    for (i, field) in form.fields.iter().enumerate() {
        let focused = active && focus == FormFocus::Field(i);
        let cursor = if focused { "▌" } else { "" };
        lines.push(Line::from(Span::styled(
            format!(" {}", field.label),
            styles::muted_style(),
        )));
        lines.push(Line::from(vec![
            Span::styled(" [", styles::muted_style()),
            Span::styled(
                format!("{}{}", field.display(), cursor),
                styles::input_style(focused),
            ),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let mut actions = vec![Span::raw(" ")];
    for (i, action) in form.actions.iter().enumerate() {
        if i > 0 {
            actions.push(Span::styled("  ", Style::default()));
        }
        let focused = active && focus == FormFocus::Action(i);
        let label = if i == 0 {
            format!("[ {} ]", action)
        } else {
            action.to_string()
        };
        actions.push(Span::styled(label, styles::action_style(focused)));
    }
    lines.push(Line::from(actions));

    if form.busy {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Working...", styles::muted_style())));
    }
    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }
    if let Some(ref notice) = form.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", notice),
            styles::success_style(),
        )));
    }
    lines
}

pub(crate) fn render_form(frame: &mut Frame, area: Rect, title: &str, form: &Form, active: bool) {
    let paragraph = Paragraph::new(form_lines(form, active))
        .block(titled_block(title, active))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Table of leads with score and bucket columns.
pub(crate) fn render_lead_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    leads: &[&Lead],
    selection: Option<usize>,
) {
    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Score"),
        Cell::from("Bucket"),
        Cell::from("Source"),
        Cell::from("Received"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = leads
        .iter()
        .enumerate()
        .map(|(i, lead)| {
            let style = if Some(i) == selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let bucket = lead.bucket_or_cold();
            let received = lead
                .created_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(truncate(lead.display_name(), 28)),
                Cell::from(format_score(lead.score_or_zero())),
                Cell::from(Span::styled(bucket.label(), styles::bucket_style(bucket))),
                Cell::from(lead.source_or_default().to_string()),
                Cell::from(received),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),    // Name
        Constraint::Length(6),  // Score
        Constraint::Length(7),  // Bucket
        Constraint::Length(14), // Source
        Constraint::Length(19), // "Jan 05, 2025 14:30"
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(titled_block(title, selection.is_some()))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(selection);
    frame.render_stateful_widget(table, area, &mut state);
}
