//! Candlestick view: one column per bar with both moving averages on top.
//!
//! Drawn straight into the buffer. Bodies are green when close >= open and
//! red otherwise, wicks run to the high and low. The short and long MA are a
//! dot per column in their line colours. Buy (▲) sits under the candle, Sell
//! (▼) over it. When there are more bars than columns the newest are shown.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crosslab_core::{Signal, SignalReport};

use crate::theme::Theme;

const LABEL_WIDTH: u16 = 8;
const SHORT_DOT: &str = "•";
const LONG_DOT: &str = "·";

pub struct CandleChart<'a> {
    report: &'a SignalReport,
    theme: &'a Theme,
}

impl<'a> CandleChart<'a> {
    pub fn new(report: &'a SignalReport, theme: &'a Theme) -> Self {
        Self { report, theme }
    }
}

/// Map a price to a row of the plot area (0 = top).
fn price_to_y(price: f64, y_min: f64, y_max: f64, plot_height: u16) -> u16 {
    if (y_max - y_min).abs() < 1e-9 || plot_height == 0 {
        return 0;
    }
    let last = plot_height.saturating_sub(1) as f64;
    let frac = (price - y_min) / (y_max - y_min);
    (last * (1.0 - frac)).round().clamp(0.0, last) as u16
}

impl<'a> Widget for CandleChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let symbol = self.report.symbol();
        let rows: Vec<_> = self.report.visible_rows().collect();
        if rows.is_empty() {
            Block::default()
                .title(format!(" {symbol} [No Data] "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.muted))
                .style(Style::default().bg(self.theme.background))
                .render(area, buf);
            return;
        }

        let summary = self.report.summary();
        let up = rows.iter().filter(|(r, _)| r.bar.close >= r.bar.open).count();
        let title = format!(
            " {symbol} | {} bars | {up} up {} down | {} buy {} sell ",
            rows.len(),
            rows.len() - up,
            summary.buy,
            summary.sell
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);

        // Label column on the left, legend row at the bottom.
        let plot_left = inner.x + LABEL_WIDTH;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let plot_height = inner.height.saturating_sub(1);
        if plot_width == 0 || plot_height == 0 {
            return;
        }

        let shown = &rows[rows.len().saturating_sub(plot_width as usize)..];

        let (lo, hi) = shown.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (r, _)| {
            (
                lo.min(r.bar.low).min(r.short_ma).min(r.long_ma),
                hi.max(r.bar.high).max(r.short_ma).max(r.long_ma),
            )
        });
        let range = hi - lo;
        let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
        let (y_lower, y_upper) = (lo - pad, hi + pad);
        let to_y = |price: f64| price_to_y(price, y_lower, y_upper, plot_height);

        let labels = [y_upper, (y_upper + y_lower) / 2.0, y_lower];
        let label_rows = [0, plot_height / 2, plot_height.saturating_sub(1)];
        for (value, row) in labels.iter().zip(label_rows) {
            buf.set_string(
                inner.x,
                plot_top + row,
                format!("{value:>7.1}"),
                Style::default().fg(self.theme.muted),
            );
        }

        for (i, (row, _)) in shown.iter().enumerate() {
            let x = plot_left + i as u16;
            let bar = &row.bar;
            let is_up = bar.close >= bar.open;
            let style = Style::default().fg(if is_up { self.theme.positive } else { self.theme.negative });

            let high_y = to_y(bar.high);
            let low_y = to_y(bar.low);
            let body_top = to_y(bar.open.max(bar.close));
            let body_bottom = to_y(bar.open.min(bar.close));

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "|", style);
            }
            let body = if is_up { "\u{2588}" } else { "\u{2593}" };
            for y in body_top..=body_bottom {
                buf.set_string(x, plot_top + y, body, style);
            }
            for y in (body_bottom + 1)..=low_y {
                buf.set_string(x, plot_top + y, "|", style);
            }
        }

        // Long first so the short MA wins where they meet.
        for (i, (row, _)) in shown.iter().enumerate() {
            let x = plot_left + i as u16;
            buf.set_string(
                x,
                plot_top + to_y(row.long_ma),
                LONG_DOT,
                Style::default().fg(self.theme.long_ma_line()),
            );
            buf.set_string(
                x,
                plot_top + to_y(row.short_ma),
                SHORT_DOT,
                Style::default().fg(self.theme.short_ma_line()),
            );
        }

        let last_row = plot_height.saturating_sub(1);
        for (i, (row, signal)) in shown.iter().enumerate() {
            let (glyph, y) = match signal {
                Signal::Buy => ("▲", (to_y(row.bar.low) + 1).min(last_row)),
                Signal::Sell => ("▼", to_y(row.bar.high).saturating_sub(1)),
                Signal::Hold => continue,
            };
            let style = Style::default()
                .fg(self.theme.signal_color(*signal))
                .add_modifier(Modifier::BOLD);
            buf.set_string(plot_left + i as u16, plot_top + y, glyph, style);
        }

        let params = self.report.params();
        let legend_y = plot_top + plot_height;
        let short = format!("{SHORT_DOT} Short MA({})  ", params.short_window);
        buf.set_stringn(
            plot_left,
            legend_y,
            &short,
            plot_width as usize,
            Style::default().fg(self.theme.short_ma_line()),
        );
        let used = short.chars().count() as u16;
        if used < plot_width {
            buf.set_stringn(
                plot_left + used,
                legend_y,
                format!("{LONG_DOT} Long MA({})", params.long_window),
                (plot_width - used) as usize,
                Style::default().fg(self.theme.long_ma_line()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslab_core::{Bar, Series, SignalEngine, SignalParams};

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    /// Three up candles then two down; signals are Hold Hold Buy Buy Sell.
    fn report() -> SignalReport {
        let bars = [(9.0, 10.0), (11.0, 12.0), (13.0, 14.0), (13.0, 12.0), (11.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| Bar {
                date: day(i),
                open,
                high: f64::max(open, close) + 0.5,
                low: f64::min(open, close) - 0.5,
                close,
                volume: 1,
            })
            .collect();
        SignalEngine::new(SignalParams::new(2, 3).unwrap())
            .run(&Series::new("TEST", bars).unwrap())
            .unwrap()
    }

    fn render(report: &SignalReport, area: Rect) -> String {
        let theme = Theme::default();
        let mut buf = Buffer::empty(area);
        CandleChart::new(report, &theme).render(area, &mut buf);
        let mut content = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                content.push_str(buf.cell((x, y)).unwrap().symbol());
            }
        }
        content
    }

    #[test]
    fn title_counts_candles_and_signals() {
        let content = render(&report(), Rect::new(0, 0, 80, 24));
        assert!(content.contains("TEST | 5 bars | 3 up 2 down | 2 buy 1 sell"));
    }

    #[test]
    fn draws_bodies_averages_and_markers() {
        let content = render(&report(), Rect::new(0, 0, 80, 24));
        assert!(content.contains('\u{2588}'));
        assert!(content.contains('\u{2593}'));
        assert!(content.contains("Short MA(2)"));
        assert!(content.contains("Long MA(3)"));
        assert!(content.matches(SHORT_DOT).count() >= 2);
        assert!(content.matches(LONG_DOT).count() >= 2);
        assert_eq!(content.matches('▲').count(), 2);
        assert_eq!(content.matches('▼').count(), 1);
    }

    #[test]
    fn follows_visible_range() {
        let report = report().with_visible_range(day(3), day(4));
        let content = render(&report, Rect::new(0, 0, 80, 24));
        assert!(content.contains("2 bars | 0 up 2 down | 1 buy 1 sell"));
        assert_eq!(content.matches('▲').count(), 1);
    }

    #[test]
    fn empty_visible_range_shows_no_data() {
        let report = report().with_visible_range(day(10), day(20));
        let content = render(&report, Rect::new(0, 0, 80, 24));
        assert!(content.contains("TEST [No Data]"));
    }

    #[test]
    fn narrow_area_keeps_newest_bars() {
        // Two plot columns: only the last two candles (both down) fit.
        let content = render(&report(), Rect::new(0, 0, 2 + LABEL_WIDTH + 2, 12));
        assert!(!content.contains('\u{2588}'));
        assert!(content.contains('\u{2593}'));
    }

    #[test]
    fn tiny_area_renders_without_panic() {
        render(&report(), Rect::new(0, 0, 6, 3));
    }

    #[test]
    fn price_maps_top_to_bottom() {
        assert_eq!(price_to_y(110.0, 100.0, 110.0, 11), 0);
        assert_eq!(price_to_y(100.0, 100.0, 110.0, 11), 10);
        assert_eq!(price_to_y(105.0, 100.0, 110.0, 11), 5);
        assert_eq!(price_to_y(105.0, 105.0, 105.0, 11), 0);
    }
}
