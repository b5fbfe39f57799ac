use gymbro::exercise::TargetKind;
use gymbro::planner::PlanSource;
use gymbro::session::Page;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::{
    ui::{
        dashboard::render_dashboard, feedback_paragraph, format_secs, key_hints,
        overlay::SkeletonOverlay, page_layout, title,
    },
    App, FormField,
};

/// A UI Screen boundary: renders one session page
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct WelcomeScreen;

impl Screen for WelcomeScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        f.render_widget(title("GYM BRO - your terminal workout coach"), header);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(FormField::ALL.len() as u16 * 3),
                Constraint::Min(1),
            ])
            .split(body);

        f.render_widget(feedback_paragraph(app.session.feedback()), rows[0]);

        let fields = Layout::default()
            .direction(Direction::Vertical)
            .constraints(FormField::ALL.map(|_| Constraint::Length(3)))
            .split(rows[1]);
        for (field, area) in FormField::ALL.iter().zip(fields.iter()) {
            let focused = app.form.focus == *field;
            let border_style = if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let cursor = if focused { "_" } else { "" };
            let input = Paragraph::new(format!("{}{cursor}", app.form.value(*field))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" {} ", field.label())),
            );
            f.render_widget(input, *area);
        }

        if let Some(error) = &app.form.error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
                rows[2],
            );
        }

        f.render_widget(
            key_hints(&[
                ("Tab", "next field"),
                ("Enter", "make my plan"),
                ("F2", "history"),
                ("Esc", "quit"),
            ]),
            footer,
        );
    }
}

pub struct PlanScreen;

impl Screen for PlanScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        f.render_widget(title("Your workout plan"), header);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(5),
            ])
            .split(body);

        f.render_widget(feedback_paragraph(app.session.feedback()), rows[0]);

        let mut lines = Vec::new();
        if let Some(plan) = app.session.plan() {
            for (i, item) in plan.iter().enumerate() {
                let mut spans = vec![
                    Span::styled(
                        format!("{:>2}. ", i + 1),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::styled(
                        item.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  {}", item.target_label())),
                ];
                if item.exercise().is_none() {
                    spans.push(Span::styled(
                        "  (can't track this one, skip with s)",
                        Style::default().fg(Color::Yellow),
                    ));
                }
                lines.push(Line::from(spans));
            }
        }
        if app.session.plan_source() == Some(PlanSource::Fallback) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Starter plan",
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            )));
        }
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Plan ")),
            rows[1],
        );

        let advice = app.session.advice().unwrap_or_default().to_string();
        f.render_widget(
            Paragraph::new(advice)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Nutrition tip "),
                ),
            rows[2],
        );

        f.render_widget(
            key_hints(&[
                ("Enter", "start workout"),
                ("r", "back"),
                ("h", "history"),
                ("Esc", "quit"),
            ]),
            footer,
        );
    }
}

pub struct WorkoutScreen;

impl Screen for WorkoutScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        let session = &app.session;
        let total = session.plan().map_or(0, |p| p.len());

        let heading = match session.current_item() {
            Some(item) => format!(
                "{} - exercise {} of {}",
                item.name,
                session.current_index() + 1,
                total
            ),
            None => "Workout".to_string(),
        };
        f.render_widget(title(&heading), header);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(body);

        let stats = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(2),
            ])
            .split(columns[0]);

        if let Some(tracker) = session.tracker() {
            let item = tracker.item();
            let (label, done, ratio) = match item.kind {
                TargetKind::Reps => (
                    format!("Reps {} / {}", tracker.rep_count(), item.target),
                    f64::from(tracker.rep_count()),
                    f64::from(tracker.rep_count()) / f64::from(item.target.max(1)),
                ),
                TargetKind::Time => (
                    format!(
                        "Hold {} / {}s",
                        format_secs(tracker.elapsed_hold_time()),
                        item.target
                    ),
                    tracker.elapsed_hold_time(),
                    tracker.elapsed_hold_time() / f64::from(item.target.max(1)),
                ),
            };

            f.render_widget(
                Paragraph::new(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
                stats[0],
            );
            f.render_widget(
                Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title(" Progress "))
                    .gauge_style(Style::default().fg(Color::Green))
                    .ratio(ratio.clamp(0.0, 1.0))
                    .label(format!("{:.0}", done)),
                stats[1],
            );
            f.render_widget(
                Paragraph::new(format!("Stage: {}", tracker.state().stage))
                    .alignment(Alignment::Center)
                    .style(Style::default().add_modifier(Modifier::DIM)),
                stats[2],
            );
        }

        if session.is_awaiting_ready() {
            f.render_widget(
                Paragraph::new(Span::styled(
                    "Get into position, then press Enter when you're ready",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
                stats[3],
            );
        } else {
            f.render_widget(feedback_paragraph(session.feedback()), stats[3]);
        }

        let required = session
            .tracker()
            .map(|t| t.required_joints())
            .unwrap_or_default();
        f.render_widget(
            SkeletonOverlay::new(session.last_pose(), session.config().gate).highlight(required),
            columns[1],
        );

        let mut hints = vec![("s", "skip"), ("r", "start over"), ("Esc", "quit")];
        if session.is_awaiting_ready() {
            hints.insert(0, ("Enter", "ready"));
        }
        f.render_widget(key_hints(&hints), footer);
    }
}

pub struct RestScreen;

impl Screen for RestScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        let session = &app.session;
        f.render_widget(title("Rest"), header);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(2),
            ])
            .split(body);

        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{}s", session.rest_remaining()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            rows[0],
        );

        let rest_total = session.config().rest_ticks.max(1);
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio((f64::from(session.rest_remaining()) / f64::from(rest_total)).clamp(0.0, 1.0))
                .label(""),
            rows[1],
        );
        f.render_widget(feedback_paragraph(session.feedback()), rows[2]);
        f.render_widget(key_hints(&[("r", "start over"), ("Esc", "quit")]), footer);
    }
}

pub struct FinishedScreen;

impl Screen for FinishedScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        f.render_widget(title("Workout complete"), header);

        let mut lines = vec![
            Line::from(Span::styled(
                app.session.feedback().text.clone(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        if let Some(plan) = app.session.plan() {
            lines.extend(plan.iter().map(|item| Line::from(format!("  {item}"))));
        }
        if let Some(goal) = app.session.profile().map(|p| p.goal.as_str()) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("One step closer to: {goal}"),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        f.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            body,
        );
        f.render_widget(
            key_hints(&[("Enter", "new workout"), ("h", "history"), ("Esc", "quit")]),
            footer,
        );
    }
}

pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_dashboard(app, f);
    }
}

pub struct CaptureFailedScreen;

impl Screen for CaptureFailedScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let (header, body, footer) = page_layout(f.area());
        f.render_widget(title("Camera problem"), header);

        let reason = app
            .session
            .capture_error()
            .unwrap_or("the pose stream stopped");
        let lines = vec![
            Line::from(Span::styled(
                "I lost the camera feed.",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(reason.to_string()),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            body,
        );
        f.render_widget(
            key_hints(&[("Enter", "retry"), ("r", "start over"), ("Esc", "quit")]),
            footer,
        );
    }
}

/// Helper to construct the appropriate screen for the current page
pub fn current_screen(page: Page) -> Box<dyn Screen> {
    match page {
        Page::Welcome => Box::new(WelcomeScreen),
        Page::Plan => Box::new(PlanScreen),
        Page::Workout => Box::new(WorkoutScreen),
        Page::Rest => Box::new(RestScreen),
        Page::Finished => Box::new(FinishedScreen),
        Page::Dashboard => Box::new(DashboardScreen),
        Page::CaptureFailed => Box::new(CaptureFailedScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{key, test_app};
    use crate::ui::{draw, tests::buffer_text};
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_welcome_shows_form() {
        let app = test_app(vec![], 1);
        let text = screen_text(&app);
        assert!(text.contains("Fitness goal"));
        assert!(text.contains("Height cm (optional)"));
        assert!(text.contains("What's your fitness goal today?"));
    }

    #[test]
    fn test_plan_lists_fallback_items() {
        let mut app = test_app(vec![], 1);
        app.form.goal = "get fit".into();
        app.submit_form();
        let text = screen_text(&app);
        assert!(text.contains("Your workout plan"));
        assert!(text.contains("Bodyweight Squats"));
        assert!(text.contains("30s hold"));
        assert!(text.contains("Starter plan"));
        assert!(text.contains("Nutrition tip"));
    }

    #[test]
    fn test_workout_and_rest_pages() {
        let mut app = test_app(vec![], 5);
        app.form.goal = "get fit".into();
        app.submit_form();
        app.on_key(key(KeyCode::Enter));

        let text = screen_text(&app);
        assert!(text.contains("exercise 1 of 3"));
        assert!(text.contains("Reps 0 / 10"));
        assert!(text.contains("No body detected"));

        app.on_key(key(KeyCode::Char('s')));
        let text = screen_text(&app);
        assert!(text.contains("5s"));
        assert!(text.contains("Next up: Jumping Jacks"));
    }

    #[test]
    fn test_capture_failure_page() {
        let mut app = test_app(vec![], 1);
        app.form.goal = "get fit".into();
        app.submit_form();
        app.on_key(key(KeyCode::Enter));
        app.sample_frame();

        let text = screen_text(&app);
        assert!(text.contains("Camera problem"));
        assert!(text.contains("pose stream ended"));
    }

    #[test]
    fn test_empty_dashboard() {
        let mut app = test_app(vec![], 1);
        app.on_key(key(KeyCode::F(2)));
        let text = screen_text(&app);
        assert!(text.contains("Workout history"));
        assert!(text.contains("No workouts recorded yet"));
    }
}
