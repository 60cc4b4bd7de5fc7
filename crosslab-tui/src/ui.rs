//! Top-level layout: header, chart, two window sliders and a key hint bar.
//!
//! The chart area shows either the line chart or the candlestick view.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crosslab_core::engine::control_range;
use crosslab_core::WindowRole;

use crate::app::{App, ChartView, ErrorView};
use crate::candles::CandleChart;
use crate::chart::SignalChart;
use crate::theme::Theme;

const HINTS: &str =
    " ←/→ h/l: ±1  PgUp/PgDn: ±10  Tab: switch slider  c: candles/lines  r: reset  q: quit";

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &App) {
    let theme = Theme::default();
    let [header, body, sliders, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(4),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, app, &theme);
    match app.outcome() {
        Ok(report) => match app.view {
            ChartView::Lines => f.render_widget(SignalChart::new(report, &theme), body),
            ChartView::Candles => f.render_widget(CandleChart::new(report, &theme), body),
        },
        Err(err) => render_error(f, body, err, &theme),
    }
    render_sliders(f, sliders, app, &theme);
    f.render_widget(
        Paragraph::new(Span::styled(HINTS, Style::default().fg(theme.muted))),
        footer,
    );
}

fn render_header(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let request = app.request();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", request.symbol),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} → {}", request.start, request.end),
            Style::default().fg(theme.text_primary),
        ),
    ];
    if let Ok(report) = app.outcome() {
        if let (Some(last), Some(date)) = (report.summary().last, report.summary().last_date) {
            spans.push(Span::raw(" | last: "));
            spans.push(Span::styled(
                format!("{} on {date}", last.label()),
                Style::default().fg(theme.signal_color(last)),
            ));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_error(f: &mut Frame, area: Rect, err: &ErrorView, theme: &Theme) {
    let color = theme.error_color(err.category);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} error ", err.category));
    let para = Paragraph::new(err.message.as_str())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(para, area);
}

fn render_sliders(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.muted))
        .title(" Windows ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Name, brackets, value and range take about 30 columns.
    let width = usize::from(inner.width).saturating_sub(30).max(10);
    let lines: Vec<Line> = [WindowRole::Short, WindowRole::Long]
        .into_iter()
        .map(|role| slider_line(app, role, width, theme))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn slider_line(app: &App, role: WindowRole, width: usize, theme: &Theme) -> Line<'static> {
    let value = app.window(role);
    let range = control_range(role);
    let (name, line_color) = match role {
        WindowRole::Short => ("Short MA", theme.short_ma_line()),
        WindowRole::Long => ("Long MA", theme.long_ma_line()),
    };

    let focused = app.focus == role;
    let label_style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(theme.muted)
    };
    let bar_style = if focused {
        Style::default().fg(line_color)
    } else {
        Style::default().fg(theme.muted)
    };

    Line::from(vec![
        Span::styled(format!(" {name:>8} "), label_style),
        Span::raw(" "),
        Span::styled(
            render_slider_inline(value, *range.start(), *range.end(), width),
            bar_style,
        ),
        Span::styled(format!(" {value:>3}"), label_style),
        Span::styled(
            format!("  ({}-{})", range.start(), range.end()),
            Style::default().fg(theme.text_secondary),
        ),
    ])
}

fn render_slider_inline(value: usize, min: usize, max: usize, width: usize) -> String {
    if max <= min {
        return format!("[{}]", "=".repeat(width));
    }
    let frac = ((value.saturating_sub(min)) as f64 / (max - min) as f64).clamp(0.0, 1.0);
    let filled = (frac * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "=".repeat(filled), " ".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslab_core::data::DataError;
    use crosslab_core::{Bar, Series, SignalRequest};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request() -> SignalRequest {
        SignalRequest::new("TEST", d(2024, 1, 1), d(2024, 1, 5), 2, 3).unwrap()
    }

    fn series() -> Series {
        let bars = [10.0, 12.0, 14.0, 12.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: d(2024, 1, 1) + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1,
            })
            .collect();
        Series::new("TEST", bars).unwrap()
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let area = buf.area;
        let mut content = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                content.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            content.push('\n');
        }
        content
    }

    #[test]
    fn draws_header_chart_and_sliders() {
        let app = App::new(request(), Ok(series()));
        let screen = render(&app);
        assert!(screen.contains("TEST"));
        assert!(screen.contains("last: SELL on 2024-01-05"));
        assert!(screen.contains("Short MA"));
        assert!(screen.contains("(1-100)"));
        assert!(screen.contains("(1-200)"));
        assert!(screen.contains('▲'));
    }

    #[test]
    fn c_key_swaps_in_candles() {
        let mut app = App::new(request(), Ok(series()));
        app.toggle_view();
        let screen = render(&app);
        assert!(screen.contains("TEST | 5 bars | 5 up 0 down | 2 buy 1 sell"));
        assert!(screen.contains('\u{2588}'));
        assert!(screen.contains("Long MA(3)"));
        assert!(screen.contains("c: candles/lines"));
        // Sliders and header stay in place.
        assert!(screen.contains("(1-100)"));
        assert!(screen.contains("last: SELL on 2024-01-05"));

        app.toggle_view();
        assert!(!render(&app).contains("5 up 0 down"));
    }

    #[test]
    fn slider_fill_tracks_value() {
        assert_eq!(render_slider_inline(1, 1, 101, 10), "[          ]");
        assert_eq!(render_slider_inline(51, 1, 101, 10), "[=====     ]");
        assert_eq!(render_slider_inline(101, 1, 101, 10), "[==========]");
        assert_eq!(render_slider_inline(5, 5, 5, 4), "[====]");
    }

    #[test]
    fn draws_error_in_place_of_chart() {
        let app = App::new(
            request(),
            Err(DataError::SymbolNotFound { symbol: "TEST".into() }.into()),
        );
        let screen = render(&app);
        assert!(screen.contains("DATA error"));
        assert!(screen.contains("symbol not found"));
        assert!(!screen.contains('▲'));
    }
}
