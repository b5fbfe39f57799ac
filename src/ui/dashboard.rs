use gymbro::exercise::TargetKind;
use gymbro::session::ExerciseResult;
use gymbro::stats::ExerciseSummary;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{
    ui::{format_secs, key_hints, title},
    App,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Pure presenter for one row of the per-exercise summary table
pub fn present_summary_row(summary: &ExerciseSummary) -> Row<'static> {
    let rate = summary.completion_rate();
    let rate_color = if rate >= 80.0 {
        Color::Green
    } else if rate >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let volume = match (summary.total_reps, summary.total_hold_secs) {
        (0, secs) if secs > 0.0 => format_secs(secs),
        (reps, secs) if secs > 0.0 => format!("{reps} reps + {}", format_secs(secs)),
        (reps, _) => format!("{reps} reps"),
    };

    Row::new(vec![
        Cell::from(summary.exercise.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}/{}", summary.completed, summary.attempts)),
        Cell::from(format!("{rate:.0}%")).style(Style::default().fg(rate_color)),
        Cell::from(volume),
        Cell::from(
            summary
                .last_done
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ])
}

/// Pure presenter for one recent result
pub fn present_result_row(result: &ExerciseResult) -> Row<'static> {
    let done = match result.kind {
        TargetKind::Reps => format!("{}/{} reps", result.reps, result.target),
        TargetKind::Time => format!("{} / {}s", format_secs(result.hold_secs), result.target),
    };
    let (status, style) = if result.skipped {
        ("skipped", Style::default().fg(Color::Yellow))
    } else {
        ("done", Style::default().fg(Color::Green))
    };

    Row::new(vec![
        Cell::from(result.finished_at.format(TIMESTAMP_FORMAT).to_string()),
        Cell::from(result.name.clone()),
        Cell::from(done),
        Cell::from(status).style(style),
    ])
}

pub fn render_dashboard(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(app.dashboard.summary.len().clamp(1, 8) as u16 + 3),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(title("Workout history"), chunks[0]);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    if app.dashboard.summary.is_empty() {
        f.render_widget(
            Paragraph::new("No workouts recorded yet. Finish a session to see it here.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title(" Totals ")),
            chunks[1],
        );
    } else {
        let rows: Vec<Row> = app
            .dashboard
            .summary
            .iter()
            .map(present_summary_row)
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Length(20),
                Constraint::Min(16),
            ],
        )
        .header(
            Row::new(vec!["Exercise", "Done", "Rate", "Volume", "Last"]).style(header_style),
        )
        .block(Block::default().borders(Borders::ALL).title(" Totals "))
        .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let table_height = chunks[2].height.saturating_sub(3) as usize;
    let recent: Vec<Row> = app
        .dashboard
        .recent
        .iter()
        .skip(app.dashboard.scroll_offset)
        .take(table_height)
        .map(present_result_row)
        .collect();
    let table = Table::new(
        recent,
        [
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Min(8),
        ],
    )
    .header(Row::new(vec!["When", "Exercise", "Result", "Status"]).style(header_style))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Recent ({}) ", app.dashboard.recent.len())),
    )
    .column_spacing(2);
    f.render_widget(table, chunks[2]);

    f.render_widget(
        key_hints(&[("Up/Down", "scroll"), ("Home", "top"), ("Enter/Esc", "back")]),
        chunks[3],
    );
}
