pub mod dashboard;
pub mod overlay;
pub mod screen;

use gymbro::celebration::Celebration;
use gymbro::tracker::{Feedback, Severity};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const CONFETTI_COLORS: [Color; 6] = [
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightBlue,
];

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.session.page()).render(app, f);

    if app.celebration.is_active() {
        let area = f.area();
        render_celebration(&app.celebration, area, f.buffer_mut());
    }
}

/// Title row, body, key hints row
pub fn page_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

pub fn title(text: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
}

pub fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::default().fg(Color::White),
        Severity::Success => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Severity::Warning => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    }
}

pub fn feedback_paragraph(feedback: &Feedback) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        feedback.text.clone(),
        severity_style(feedback.severity),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
}

/// `key description` pairs rendered as a dim legend
pub fn key_hints(hints: &[(&str, &str)]) -> Paragraph<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let spans = hints
        .iter()
        .enumerate()
        .flat_map(|(i, (key, what))| {
            let sep = if i == 0 { "" } else { "   " };
            [
                Span::styled(format!("{sep}{key}"), key_style),
                Span::styled(format!(" {what}"), dim),
            ]
        })
        .collect::<Vec<_>>();

    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

pub fn format_secs(secs: f64) -> String {
    if secs >= 60.0 {
        format!("{}m {:02}s", (secs / 60.0).floor() as u64, (secs % 60.0).floor() as u64)
    } else {
        format!("{secs:.1}s")
    }
}

fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    for piece in &celebration.confetti {
        if piece.x < 0.0 || piece.y < 0.0 {
            continue;
        }
        let (x, y) = (area.x + piece.x as u16, area.y + piece.y as u16);
        if x >= area.right() || y >= area.bottom() {
            continue;
        }
        let color = CONFETTI_COLORS[piece.color_index % CONFETTI_COLORS.len()];
        buf[(x, y)]
            .set_char(piece.symbol)
            .set_style(Style::default().fg(color));
    }

    let banner = format!("  {}  ", celebration.banner);
    let width = (banner.width() as u16).min(area.width);
    let banner_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height / 3,
        width,
        height: 1,
    };
    buf.set_string(
        banner_area.x,
        banner_area.y,
        &banner[..width as usize],
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
}
