//! Sign-in, registration, password recovery and Google callback screens.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use leadranker_core::Route;

use crate::app::App;
use crate::form::Form;
use crate::ui::render::centered_rect_fixed;
use crate::ui::screens::form_lines;
use crate::ui::styles;

const DIALOG_WIDTH: u16 = 60;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_route() {
        Route::Register => render_dialog(
            frame,
            area,
            "Create your account",
            "Start scoring leads in minutes.",
            &app.register,
            vec![],
        ),
        Route::ForgotPassword => render_dialog(
            frame,
            area,
            "Forgot password",
            "We'll email you a link to reset it.",
            &app.forgot,
            vec![],
        ),
        Route::ResetPassword => render_dialog(
            frame,
            area,
            "Reset password",
            "Paste the link from your email, then choose a new password.",
            &app.reset,
            vec![],
        ),
        Route::OAuthCallback => {
            let mut intro = vec![];
            if let Some(ref url) = app.oauth_url {
                intro.push(Line::from(Span::styled(
                    " Open this link in your browser:",
                    styles::muted_style(),
                )));
                intro.push(Line::from(Span::styled(
                    format!(" {}", url),
                    styles::highlight_style(),
                )));
                intro.push(Line::from(""));
            }
            render_dialog(
                frame,
                area,
                "Continue with Google",
                "After signing in, paste the address you were sent to.",
                &app.oauth,
                intro,
            )
        }
        _ => render_dialog(
            frame,
            area,
            "Welcome back",
            "Sign in to see your scored leads.",
            &app.login,
            vec![],
        ),
    }
}

fn render_dialog(
    frame: &mut Frame,
    area: Rect,
    heading: &str,
    subtitle: &str,
    form: &Form,
    intro: Vec<Line<'static>>,
) {
    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", heading), styles::title_style())),
        Line::from(Span::styled(format!(" {}", subtitle), styles::muted_style())),
        Line::from(""),
    ];
    lines.extend(intro);
    lines.extend(form_lines(form, true));

    let height = (lines.len() as u16 + 2).max(10);
    let dialog = centered_rect_fixed(DIALOG_WIDTH, height, area);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, dialog);
}
