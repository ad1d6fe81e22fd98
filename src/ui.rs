pub mod charting;
pub mod history;
pub mod screen;

use flinch::{celebration::Celebration, Signal};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use webbrowser::Browser;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn ui(app: &mut App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Intro => render_intro(self, area, buf),
            AppState::Playing => render_game(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::Profile => render_profile(self, area, buf),
            // drawn by the history screen
            AppState::History => {}
        }

        if self.celebration.is_active {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn legend_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn results_legend() -> &'static str {
    if Browser::is_available() {
        "(r)etry / (p)rofile / (h)istory / (t)weet / (b)ack / (esc)ape"
    } else {
        "(r)etry / (p)rofile / (h)istory / (b)ack / (esc)ape"
    }
}

fn render_intro(app: &App, area: Rect, buf: &mut Buffer) {
    let labels = &app.content.labels;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(2), // title
            Constraint::Length(2), // tagline
            Constraint::Length(3), // instructions
            Constraint::Length(1), // best
            Constraint::Fill(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        labels.title.to_uppercase(),
        bold().fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(&labels.tagline, bold()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(labels.instructions.as_str())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    if let Some(best) = app.best_ms {
        Paragraph::new(Span::styled(
            app.content.best(best),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(&labels.start_hint, legend_style())).render(chunks[6], buf);
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let labels = &app.content.labels;
    let rounds = app.sequencer.config().rounds();

    let (message, color) = match &app.last_signal {
        Some(Signal::Armed { .. }) => (labels.go.clone(), Color::Green),
        Some(Signal::Recorded { latency_ms, .. }) => (format!("{latency_ms}ms"), Color::Gray),
        Some(Signal::TooEarly { .. }) => (labels.too_early.clone(), Color::Yellow),
        Some(Signal::Finished { .. }) => (labels.results.clone(), Color::Blue),
        Some(Signal::Waiting { .. }) | None => (labels.waiting.clone(), Color::Red),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // round counter
            Constraint::Min(3),    // signal area
            Constraint::Length(1), // recorded so far
            Constraint::Length(1), // legend
        ])
        .split(area);

    let round = app.sequencer.round_index();
    Paragraph::new(Span::styled(
        format!("{} {round}/{rounds}", labels.round),
        bold().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let signal_area = chunks[1];
    let text_row = signal_area.height.saturating_sub(2) / 2;
    let mut lines = vec![Line::default(); text_row as usize];
    lines.push(Line::from(Span::styled(
        message,
        bold().fg(Color::Black).bg(color),
    )));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().bg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(signal_area, buf);

    let so_far = app
        .sequencer
        .latencies()
        .iter()
        .map(|ms| format!("{ms}ms"))
        .join("  ");
    Paragraph::new(Span::styled(so_far, bold()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(space) react / (r)estart / (b)ack / (esc)ape",
        legend_style(),
    ))
    .render(chunks[3], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(report) = app.report() else {
        return;
    };
    let labels = &app.content.labels;
    let grade = app.content.grade(report.grade);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(5),    // chart
            Constraint::Length(1), // average
            Constraint::Length(1), // grade and percentile
            Constraint::Length(1), // best
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let latencies = app.sequencer.latencies();
    let bars = charting::latency_bars(latencies);
    BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(labels.results.as_str()),
        )
        .data(bars)
        .bar_width(charting::bar_width(chunks[0].width, latencies.len()))
        .bar_gap(1)
        .max(charting::chart_ceiling(latencies))
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(bold().fg(Color::Black).bg(Color::Magenta))
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!("{}ms {}", report.mean_ms, labels.average),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} {}", grade.icon, grade.name), bold().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(
            app.content.top_percent(&report),
            Style::default().fg(Color::Cyan),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(best) = app.best_ms {
        let (text, style) = if app.new_best {
            (
                format!("{}  {}", labels.new_best, app.content.best(best)),
                bold().fg(Color::Yellow),
            )
        } else {
            (
                app.content.best(best),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )
        };
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(results_legend(), legend_style())).render(chunks[5], buf);
}

fn render_profile(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(report) = app.report() else {
        return;
    };
    let labels = &app.content.labels;
    let grade = app.content.grade(report.grade);
    let profile = &grade.profile;

    let heading = |text: &str| Line::from(Span::styled(text.to_string(), bold().fg(Color::Yellow)));
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|item| Line::from(format!("  • {item}")))
            .collect::<Vec<_>>()
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", grade.icon, profile.title),
            bold().fg(Color::Cyan),
        )),
        Line::from(Span::styled(
            format!("{}: {}", labels.reaction_type, grade.name),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::default(),
        Line::from(profile.description.as_str()),
        Line::default(),
        heading(&labels.traits),
    ];
    lines.extend(bullets(&profile.traits));
    lines.push(Line::default());
    lines.push(heading(&labels.careers));
    lines.extend(bullets(&profile.careers));

    if let Some(tip) = app.content.improvement_tip(&report) {
        lines.push(Line::default());
        lines.push(heading(&labels.improvement));
        lines.push(Line::from(Span::styled(
            tip.to_string(),
            Style::default().fg(Color::Green),
        )));
    }

    lines.push(Line::default());
    lines.push(heading(&labels.data_analysis));
    lines.push(Line::from(format!(
        "  {}: {}ms",
        labels.average_time, report.mean_ms
    )));
    lines.push(Line::from(format!(
        "  {}: {}ms",
        labels.std_dev, report.std_dev_ms
    )));
    lines.push(Line::from(format!(
        "  {}: {}",
        labels.consistency,
        app.content.consistency(report.consistency)
    )));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(labels.profile.as_str()),
        )
        .wrap(Wrap { trim: false })
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(results_legend(), legend_style())).render(chunks[1], buf);
}

/// Render celebration particles on top of the results screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for spark in &celebration.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let x = spark.x as u16;
        let y = spark.y as u16;

        if x < area.width && y < area.height {
            let color = colors[spark.color_index % colors.len()];
            let brightness = spark.brightness();

            let style = if spark.is_text {
                if brightness > 0.4 {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                }
            } else if brightness > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if brightness > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&spark.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}
