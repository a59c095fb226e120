use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use leadranker_core::models::UPGRADE_PLANS;
use leadranker_core::utils::{format_count, format_timestamp};
use leadranker_core::Slot;

use crate::app::{App, AppState};
use crate::ui::screens::dashboard::render_usage_panel;
use crate::ui::screens::{placeholder, render_box, render_form};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(6)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(12)])
        .split(columns[1]);

    render_usage_panel(frame, &app.usage, left[0]);
    render_plans(frame, app, left[1]);
    render_referrals(frame, app, right[0]);

    let editing = app.state == AppState::Editing;
    let title = if editing {
        "Invite / verify"
    } else {
        "Invite / verify - [e] to edit"
    };
    render_form(frame, right[1], title, &app.billing.form, editing);
}

fn render_plans(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    let current = app.usage.ready().map(|u| u.plan.as_str());

    for (i, plan) in UPGRADE_PLANS.iter().enumerate() {
        let selected = i == app.billing.plan_selection;
        let marker = if selected { "▶ " } else { "  " };
        let terms = app
            .billing
            .plans
            .ready()
            .and_then(|plans| plans.get(*plan))
            .map(|info| format!("{} · {} leads/mo", info.amount, format_count(info.limit)))
            .unwrap_or_default();
        let style = if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let mut spans = vec![
            Span::styled(format!("{}{:<10}", marker, plan), style),
            Span::styled(terms, styles::muted_style()),
        ];
        if current == Some(*plan) {
            spans.push(Span::styled("  current", styles::success_style()));
        }
        lines.push(Line::from(spans));
    }

    if let Some(error) = app.billing.plans.error() {
        lines.push(Line::from(Span::styled(error.to_string(), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[↑/↓] choose plan  [Enter] upgrade",
        styles::muted_style(),
    )));

    match &app.billing.checkout {
        Slot::Idle => {}
        Slot::Loading => lines.push(Line::from(Span::styled(
            "Creating checkout...",
            styles::muted_style(),
        ))),
        Slot::Failed(message) => {
            lines.push(Line::from(Span::styled(message.clone(), styles::error_style())))
        }
        Slot::Ready(checkout) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Open this link to pay:",
                styles::muted_style(),
            )));
            lines.push(Line::from(Span::styled(
                checkout.checkout_url.clone(),
                styles::highlight_style(),
            )));
            if let Some(ref id) = checkout.session_id {
                lines.push(Line::from(Span::styled(
                    format!("Session {}", id),
                    styles::muted_style(),
                )));
            }
        }
    }

    if let Some(verified) = app.billing.verified.ready() {
        lines.push(Line::from(""));
        let plan = verified.plan.as_deref().unwrap_or("your plan");
        lines.push(Line::from(Span::styled(
            format!("Payment {} for {}", verified.status, plan),
            styles::success_style(),
        )));
    }

    render_box(frame, area, "Upgrade", lines);
}

fn render_referrals(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(lines) = placeholder(&app.billing.referrals, "referrals") {
        render_box(frame, area, "Referrals", lines);
        return;
    }
    let Some(referrals) = app.billing.referrals.ready() else {
        return;
    };

    let mut lines = vec![];
    if let Some(ref stats) = referrals.stats {
        lines.push(Line::from(vec![
            Span::styled(
                format!("Earned ${:.2}", stats.total_earned_usd),
                styles::success_style(),
            ),
            Span::styled(
                format!(
                    "  ·  {} pending · {} qualified · {} rewarded",
                    stats.pending, stats.qualified, stats.rewarded
                ),
                styles::muted_style(),
            ),
        ]));
        if stats.credit_per_referral > 0.0 {
            lines.push(Line::from(Span::styled(
                format!(
                    "${:.2} credit once a referral stays {} days",
                    stats.credit_per_referral, stats.qualify_days
                ),
                styles::muted_style(),
            )));
        }
        lines.push(Line::from(""));
    }

    if referrals.referrals.is_empty() {
        lines.push(Line::from(Span::styled(
            "No referrals yet. Invite a colleague below.",
            styles::muted_style(),
        )));
    }
    for referral in &referrals.referrals {
        let when = referral
            .submitted_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default();
        let mut spans = vec![
            Span::styled(format!("{:<30}", referral.referee_email), styles::list_item_style()),
            Span::styled(format!("{:<10}", referral.status.label()), styles::highlight_style()),
            Span::styled(when, styles::muted_style()),
        ];
        if let Some(days) = referral.days_remaining {
            spans.push(Span::styled(format!("  {}d left", days), styles::muted_style()));
        }
        lines.push(Line::from(spans));
    }

    render_box(frame, area, "Referrals", lines);
}
