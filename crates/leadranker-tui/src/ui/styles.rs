use ratatui::style::{Color, Modifier, Style};

use leadranker_core::models::{AlertLevel, LeadBucket};

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Bucket colors, matching the web dashboard's badges
pub const HOT: Color = Color::Rgb(220, 80, 60);
pub const WARM: Color = Color::Rgb(230, 170, 50);
pub const COLD: Color = Color::Rgb(80, 150, 220);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

/// Text input box, brighter while it has the cursor.
pub fn input_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::White)
    }
}

/// Form action: buttons are filled, links are plain.
pub fn action_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(PRIMARY)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(PRIMARY)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn bucket_color(bucket: LeadBucket) -> Color {
    match bucket {
        LeadBucket::Hot => HOT,
        LeadBucket::Warm => WARM,
        LeadBucket::Cold => COLD,
        LeadBucket::Ignore | LeadBucket::Unknown => MUTED,
    }
}

pub fn bucket_style(bucket: LeadBucket) -> Style {
    Style::default()
        .fg(bucket_color(bucket))
        .add_modifier(Modifier::BOLD)
}

pub fn alert_style(level: AlertLevel) -> Style {
    match level {
        AlertLevel::Error => error_style().add_modifier(Modifier::BOLD),
        AlertLevel::Warning => highlight_style(),
        AlertLevel::Info | AlertLevel::Other => Style::default().fg(PRIMARY),
    }
}

/// Gauge color for monthly usage: green, then amber past 80%, red when blocked.
pub fn usage_color(percent: u32, blocked: bool) -> Color {
    if blocked || percent >= 100 {
        ERROR
    } else if percent >= 80 {
        ACCENT
    } else {
        SECONDARY
    }
}
