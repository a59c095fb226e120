use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use leadranker_core::utils::{format_count, format_score};
use leadranker_core::Slot;

use crate::app::{App, AppState};
use crate::ui::screens::{field_line, render_box, render_form};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let editing = app.state == AppState::Editing;
    let title = if editing {
        "Score a lead"
    } else {
        "Score a lead - [e] to edit"
    };
    render_form(frame, chunks[0], title, &app.score.form, editing);
    render_result(frame, app, chunks[1]);
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match &app.score.result {
        Slot::Idle => lines.push(Line::from(Span::styled(
            "Paste a lead's message and submit to see its score.",
            styles::muted_style(),
        ))),
        Slot::Loading => lines.push(Line::from(Span::styled("Scoring...", styles::muted_style()))),
        Slot::Failed(message) => {
            lines.push(Line::from(Span::styled("Scoring failed", styles::error_style())));
            lines.push(Line::from(Span::styled(message.clone(), styles::muted_style())));
        }
        Slot::Ready(result) => {
            lines.push(Line::from(vec![
                Span::styled(format_score(result.score), styles::title_style()),
                Span::raw("  "),
                Span::styled(result.bucket.label(), styles::bucket_style(result.bucket)),
            ]));
            lines.push(Line::from(""));
            if let Some(ref sentiment) = result.sentiment {
                lines.push(field_line("Sentiment", sentiment.clone()));
            }
            if let Some(ref recommendation) = result.recommendation {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Next step", styles::highlight_style())));
                lines.push(Line::from(recommendation.clone()));
            }
        }
    }

    if let Some(usage) = app.usage.ready() {
        lines.push(Line::from(""));
        let style = if usage.blocked {
            styles::error_style()
        } else {
            styles::muted_style()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{} of {} leads left this month",
                format_count(usage.remaining),
                format_count(usage.limit)
            ),
            style,
        )));
    }

    render_box(frame, area, "Result", lines);
}
