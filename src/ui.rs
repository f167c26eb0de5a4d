use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, SetupField};
use sesh::celebration::Celebration;
use sesh::engine::format_mmss;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Remaining seconds below which the countdown turns red.
const WARN_SECS: u64 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Setup => render_setup(self, area, buf),
            AppState::Running => render_running(self, area, buf),
            AppState::Summary => render_summary(self, area, buf),
        }

        if self.celebration.is_active {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

fn centered_rows(area: Rect, rows: u16) -> std::rc::Rc<[Rect]> {
    let pad = area.height.saturating_sub(rows + VERTICAL_MARGIN * 2) / 2;
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            std::iter::once(Constraint::Length(pad))
                .chain((0..rows).map(|_| Constraint::Length(1)))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(area)
}

fn render_setup(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let focus_style = Style::default()
        .patch(bold_style)
        .fg(Color::Yellow);

    // title, blank, 3 fields, blank, sound, warning, blank, legend
    let chunks = centered_rows(area, 10);

    let title = Paragraph::new(Span::styled("sesh / interval training", bold_style))
        .alignment(Alignment::Center);
    title.render(chunks[1], buf);

    let field = |label: &str, value: String, focused: bool| -> Line<'static> {
        let marker = if focused { "▸ " } else { "  " };
        let value_style = if focused { focus_style } else { bold_style };
        Line::from(vec![
            Span::styled(format!("{marker}{label:<10}"), dim_style),
            Span::styled(value, value_style),
        ])
    };

    let name_row = field(
        "name",
        app.setup.name.clone(),
        app.setup.focus == SetupField::Name,
    );
    let sessions_row = field(
        "sessions",
        app.setup.sessions.to_string(),
        app.setup.focus == SetupField::Sessions,
    );
    let duration_row = field(
        "duration",
        format!("{}s", app.setup.duration_secs),
        app.setup.focus == SetupField::Duration,
    );

    for (i, row) in [name_row, sessions_row, duration_row].into_iter().enumerate() {
        Paragraph::new(row)
            .alignment(Alignment::Center)
            .render(chunks[3 + i], buf);
    }

    let sound = Paragraph::new(Span::styled(
        format!("sound: {}", app.sound_label()),
        dim_style,
    ))
    .alignment(Alignment::Center);
    sound.render(chunks[7], buf);

    if let Some(warning) = &app.warning {
        let warn = Paragraph::new(Span::styled(
            warning.clone(),
            Style::default().fg(Color::Yellow).patch(italic_style),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        warn.render(chunks[8], buf);
    }

    let legend = Paragraph::new(Span::styled(
        "(enter) start / (tab) field / (←/→) adjust / (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center);
    legend.render(chunks[10], buf);
}

fn render_running(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let engine = &app.engine;
    let name = engine.plan().map(|p| p.name().to_string()).unwrap_or_default();
    let total = engine.plan().map(|p| p.total_sessions()).unwrap_or_default();

    // name, blank, countdown, session, total, blank, gauge, blank, legend
    let chunks = centered_rows(area, 9);

    let max_width = usize::from(area.width.saturating_sub(HORIZONTAL_MARGIN * 2));
    let title = Paragraph::new(Span::styled(name.clone(), bold_style))
        .alignment(if name.width() <= max_width {
            Alignment::Center
        } else {
            // too wide to center on one line, wrap from the left instead
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    title.render(chunks[1], buf);

    let countdown_style = if engine.remaining_secs() < WARN_SECS {
        Style::default().patch(bold_style).fg(Color::Red)
    } else {
        bold_style
    };
    let countdown = Paragraph::new(Span::styled(engine.remaining_formatted(), countdown_style))
        .alignment(Alignment::Center);
    countdown.render(chunks[3], buf);

    let session = Paragraph::new(Span::styled(
        format!("session {} of {}", engine.current_session(), total),
        Style::default(),
    ))
    .alignment(Alignment::Center);
    session.render(chunks[4], buf);

    let total_left = Paragraph::new(Span::styled(
        format!("total left {}", format_mmss(engine.total_remaining())),
        dim_style,
    ))
    .alignment(Alignment::Center);
    total_left.render(chunks[5], buf);

    render_progress(engine.progress_percent(), chunks[7], buf);

    let legend = Paragraph::new(Span::styled("(s)top / (esc)ape", italic_style))
        .alignment(Alignment::Center);
    legend.render(chunks[9], buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    // headline, detail, blank, gauge, blank, legend
    let chunks = centered_rows(area, 6);

    let (headline, detail) = match &app.summary {
        Some(plan) => (
            format!("{} complete!", plan.name()),
            format!(
                "{} sessions x {}s ({} total)",
                plan.total_sessions(),
                plan.session_duration_secs(),
                format_mmss(plan.total_planned_secs()),
            ),
        ),
        None => ("training complete!".to_string(), String::new()),
    };

    let headline = Paragraph::new(Span::styled(
        headline,
        Style::default().patch(bold_style).fg(Color::Green),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    headline.render(chunks[1], buf);

    let detail = Paragraph::new(Span::styled(detail, Style::default()))
        .alignment(Alignment::Center);
    detail.render(chunks[2], buf);

    render_progress(100.0, chunks[4], buf);

    let legend = Paragraph::new(Span::styled("(r)estart / (esc)ape", italic_style))
        .alignment(Alignment::Center);
    legend.render(chunks[6], buf);
}

fn render_progress(percent: f64, area: Rect, buf: &mut Buffer) {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!("{percent:.0}%"));
    gauge.render(area, buf);
}

/// Render celebration particles on top of the summary screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(Style::default().fg(color));
            }
        }
    }
}
