use flinch::clock::Millis;
use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{ui::charting::bar_color, App};

pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let labels = &app.content.labels;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Sessions table
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let title_text = match app.best_ms {
        Some(best) => format!("{}  ({})", labels.history, app.content.best(best)),
        None => labels.history.clone(),
    };
    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let rows = &app.history_state.rows;
    if rows.is_empty() {
        let no_data = Paragraph::new(labels.no_history.as_str())
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[1]);
    } else {
        // borders and header
        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let total_rows = rows.len();
        let max_scroll = total_rows.saturating_sub(table_height);
        if app.history_state.scroll_offset > max_scroll {
            app.history_state.scroll_offset = max_scroll;
        }
        let offset = app.history_state.scroll_offset;

        let header = Row::new(vec![
            Cell::from("When"),
            Cell::from(labels.average.as_str()),
            Cell::from("sd"),
            Cell::from("Grade"),
            Cell::from("Rounds (ms)"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = rows
            .iter()
            .skip(offset)
            .take(table_height)
            .map(|record| {
                let grade = app.content.grade(record.grade);
                let mean_style = if Some(record.mean_ms) == app.best_ms {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(bar_color(record.mean_ms))
                };

                Row::new(vec![
                    Cell::from(record.played_at.format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(format!("{}ms", record.mean_ms)).style(mean_style),
                    Cell::from(format!("{}ms", record.std_dev_ms)),
                    Cell::from(format!("{} {}", grade.icon, grade.name)),
                    Cell::from(format_latencies(&record.latencies)),
                ])
            })
            .collect();

        let scroll_info = if total_rows > table_height {
            format!(
                " ({}/{} rows)",
                offset + visible_rows.len().min(table_height),
                total_rows
            )
        } else {
            String::new()
        };

        let table = Table::new(
            visible_rows,
            &[
                Constraint::Length(17), // When
                Constraint::Length(9),  // Mean
                Constraint::Length(8),  // Sd
                Constraint::Length(14), // Grade
                Constraint::Min(10),    // Rounds
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}{}", labels.history, scroll_info)),
        );

        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("↑/↓ PgUp/PgDn Home | (r)etry (b)ack (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

fn format_latencies(latencies: &[Millis]) -> String {
    latencies.iter().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{play, test_app};
    use crate::AppState;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render_history(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_empty_history_message() {
        let (mut app, _) = test_app(5, 1_000);
        app.show_history();
        assert_eq!(app.state, AppState::History);

        let text = draw(&mut app, 80, 24);
        assert!(text.contains("No sessions yet"));
    }

    #[test]
    fn test_history_lists_sessions() {
        let (mut app, clock) = test_app(2, 1_000);
        play(&mut app, &clock, 1_000, &[180, 220]);
        app.show_history();

        let text = draw(&mut app, 100, 24);
        assert!(text.contains("180 220"));
        assert!(text.contains("200ms"));
        assert!(text.contains("Best: 200ms"));
    }

    #[test]
    fn test_scroll_offset_is_clamped() {
        let (mut app, clock) = test_app(1, 1_000);
        for _ in 0..3 {
            play(&mut app, &clock, 1_000, &[250]);
        }
        app.show_history();
        assert_eq!(app.history_state.rows.len(), 3);

        app.history_state.scroll_offset = 50;
        draw(&mut app, 100, 30);
        assert_eq!(app.history_state.scroll_offset, 0);
    }

    #[test]
    fn test_format_latencies() {
        assert_eq!(format_latencies(&[]), "");
        assert_eq!(format_latencies(&[120, 5_000]), "120 5000");
    }
}
