use gymbro::pose::{Joint, PoseSnapshot, SKELETON};
use gymbro::visibility::VisibilityGate;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders, Widget,
    },
};
use unicode_width::UnicodeWidthStr;

const NO_BODY: &str = "No body detected";

/// Stick figure of the latest pose frame, drawn in normalized image space
pub struct SkeletonOverlay<'a> {
    pose: Option<&'a PoseSnapshot>,
    gate: VisibilityGate,
    highlight: Vec<Joint>,
}

impl<'a> SkeletonOverlay<'a> {
    pub fn new(pose: Option<&'a PoseSnapshot>, gate: VisibilityGate) -> Self {
        Self {
            pose,
            gate,
            highlight: Vec::new(),
        }
    }

    /// Joints the current exercise depends on
    pub fn highlight(mut self, joints: Vec<Joint>) -> Self {
        self.highlight = joints;
        self
    }

    fn joint_color(&self, pose: &PoseSnapshot, joint: Joint) -> Color {
        if !self.gate.is_visible(pose, &[joint]) {
            Color::Red
        } else if self.highlight.contains(&joint) {
            Color::Yellow
        } else {
            Color::Green
        }
    }
}

/// Image y grows downwards, canvas y grows upwards
fn to_canvas((x, y): (f64, f64)) -> (f64, f64) {
    (x.clamp(0.0, 1.0), 1.0 - y.clamp(0.0, 1.0))
}

impl Widget for SkeletonOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(" Camera ");

        let pose = match self.pose {
            Some(pose) if !pose.is_empty() => pose,
            _ => {
                Canvas::default()
                    .block(block)
                    .x_bounds([0.0, 1.0])
                    .y_bounds([0.0, 1.0])
                    .paint(|ctx| {
                        ctx.print(
                            0.5 - NO_BODY.width() as f64 / 2.0 / f64::from(area.width.max(1)),
                            0.5,
                            Span::styled(NO_BODY, Style::default().fg(Color::DarkGray)),
                        )
                    })
                    .render(area, buf);
                return;
            }
        };

        let edges: Vec<(CanvasLine, bool)> = SKELETON
            .iter()
            .filter_map(|&(a, b)| {
                let (x1, y1) = to_canvas(pose.point(a)?);
                let (x2, y2) = to_canvas(pose.point(b)?);
                let solid = self.gate.is_visible(pose, &[a, b]);
                let color = if solid { Color::White } else { Color::DarkGray };
                Some((CanvasLine::new(x1, y1, x2, y2, color), solid))
            })
            .collect();

        let joints: Vec<((f64, f64), Color)> = pose
            .iter()
            .map(|(joint, landmark)| (to_canvas(landmark.point()), self.joint_color(pose, joint)))
            .collect();

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, 1.0])
            .y_bounds([0.0, 1.0])
            .paint(|ctx| {
                for (edge, _) in edges.iter().filter(|(_, solid)| !solid) {
                    ctx.draw(edge);
                }
                for (edge, _) in edges.iter().filter(|(_, solid)| *solid) {
                    ctx.draw(edge);
                }
                ctx.layer();
                for (point, color) in &joints {
                    ctx.draw(&Points {
                        coords: std::slice::from_ref(point),
                        color: *color,
                    });
                }
            })
            .render(area, buf);
    }
}
