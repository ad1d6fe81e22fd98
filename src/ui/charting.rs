use flinch::clock::Millis;
use ratatui::{
    style::{Color, Style},
    widgets::{Bar, BarGroup},
};

const CHART_STEP_MS: Millis = 100;
const MIN_BAR_WIDTH: u16 = 3;
const MAX_BAR_WIDTH: u16 = 12;

/// One bar per round, labelled with its number
pub fn latency_bars(latencies: &[Millis]) -> BarGroup<'static> {
    let bars: Vec<Bar> = latencies
        .iter()
        .enumerate()
        .map(|(i, &ms)| {
            Bar::default()
                .value(ms)
                .text_value(format_label(ms))
                .label(format!("#{}", i + 1).into())
                .style(Style::default().fg(bar_color(ms)))
        })
        .collect();

    BarGroup::default().bars(&bars)
}

/// Top of the value axis: the slowest round rounded up to the next 100ms
pub fn chart_ceiling(latencies: &[Millis]) -> u64 {
    let slowest = latencies.iter().copied().max().unwrap_or(0);
    (slowest.div_ceil(CHART_STEP_MS)).max(1) * CHART_STEP_MS
}

/// Widest bar that still fits every round inside `width` columns
pub fn bar_width(width: u16, bars: usize) -> u16 {
    if bars == 0 {
        return MIN_BAR_WIDTH;
    }
    // borders plus one column of gap per bar
    let usable = width.saturating_sub(2) as usize;
    let per_bar = (usable / bars).saturating_sub(1) as u16;
    per_bar.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

/// Same thresholds as the grades, coloured from green to red
pub fn bar_color(ms: Millis) -> Color {
    match ms {
        0..=200 => Color::Green,
        201..=250 => Color::Cyan,
        251..=350 => Color::Yellow,
        _ => Color::Red,
    }
}

/// Format a latency label consistently
pub fn format_label(ms: Millis) -> String {
    format!("{ms}ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_ceiling() {
        assert_eq!(chart_ceiling(&[]), 100);
        assert_eq!(chart_ceiling(&[0]), 100);
        assert_eq!(chart_ceiling(&[180, 250]), 300);
        assert_eq!(chart_ceiling(&[300]), 300);
        assert_eq!(chart_ceiling(&[120, 5_000]), 5_000);
    }

    #[test]
    fn test_bar_width_fits_and_clamps() {
        assert_eq!(bar_width(80, 5), MAX_BAR_WIDTH);
        assert_eq!(bar_width(40, 5), 6);
        assert_eq!(bar_width(10, 5), MIN_BAR_WIDTH);
        assert_eq!(bar_width(80, 0), MIN_BAR_WIDTH);
    }

    #[test]
    fn test_bar_color() {
        assert_eq!(bar_color(150), Color::Green);
        assert_eq!(bar_color(200), Color::Green);
        assert_eq!(bar_color(201), Color::Cyan);
        assert_eq!(bar_color(351), Color::Red);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(0), "0ms");
        assert_eq!(format_label(1_234), "1234ms");
    }

    #[test]
    fn test_latency_bars_renders_each_round() {
        use ratatui::{buffer::Buffer, layout::Rect, widgets::BarChart, widgets::Widget};

        let area = Rect::new(0, 0, 40, 10);
        let mut buffer = Buffer::empty(area);
        BarChart::default()
            .data(latency_bars(&[120, 180, 300]))
            .bar_width(6)
            .max(chart_ceiling(&[120, 180, 300]))
            .render(area, &mut buffer);

        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("#1"));
        assert!(text.contains("#3"));
        assert!(text.contains("300ms"));
    }
}
