//! Signal chart: close, short MA and long MA with crossover markers.
//!
//! X is the bar index within the visible range; dates are shown as labels.
//! Buy (▲) and Sell (▼) glyphs are written straight into the buffer after the
//! chart renders, at the short MA of their bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};

use crosslab_core::{Signal, SignalReport};

use crate::theme::Theme;

/// Width reserved for y-axis labels when placing markers.
const Y_LABEL_WIDTH: u16 = 9;

pub struct SignalChart<'a> {
    report: &'a SignalReport,
    theme: &'a Theme,
}

/// Plot series for the visible range.
#[derive(Debug, Default, PartialEq)]
pub struct ChartData {
    pub close: Vec<(f64, f64)>,
    pub short_ma: Vec<(f64, f64)>,
    pub long_ma: Vec<(f64, f64)>,
    pub buys: Vec<(f64, f64)>,
    pub sells: Vec<(f64, f64)>,
    pub first_date: String,
    pub last_date: String,
}

impl ChartData {
    pub fn from_report(report: &SignalReport) -> Self {
        let mut data = ChartData::default();
        for (i, (row, signal)) in report.visible_rows().enumerate() {
            let x = i as f64;
            data.close.push((x, row.bar.close));
            data.short_ma.push((x, row.short_ma));
            data.long_ma.push((x, row.long_ma));
            match signal {
                Signal::Buy => data.buys.push((x, row.short_ma)),
                Signal::Sell => data.sells.push((x, row.short_ma)),
                Signal::Hold => {}
            }
            if i == 0 {
                data.first_date = row.bar.date.to_string();
            }
            data.last_date = row.bar.date.to_string();
        }
        data
    }

    pub fn x_max(&self) -> f64 {
        (self.close.len().saturating_sub(1)).max(1) as f64
    }

    /// Padded `[min, max]` over every plotted value.
    pub fn y_bounds(&self) -> [f64; 2] {
        let values = self
            .close
            .iter()
            .chain(&self.short_ma)
            .chain(&self.long_ma)
            .map(|&(_, v)| v);
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() || !hi.is_finite() {
            return [0.0, 1.0];
        }
        let range = hi - lo;
        let pad = if range > 0.0 { range * 0.05 } else { lo.abs() * 0.05 + 1.0 };
        [lo - pad, hi + pad]
    }
}

impl<'a> SignalChart<'a> {
    pub fn new(report: &'a SignalReport, theme: &'a Theme) -> Self {
        Self { report, theme }
    }
}

impl<'a> Widget for SignalChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let data = ChartData::from_report(self.report);
        let params = self.report.params();
        let summary = self.report.summary();
        let x_max = data.x_max();
        let [y_lower, y_upper] = data.y_bounds();

        let title = format!(
            " {} | {} bars | ▲ {} buy  ▼ {} sell ",
            self.report.symbol(),
            summary.bars,
            summary.buy,
            summary.sell
        );

        let short_name = format!("Short MA({})", params.short_window);
        let long_name = format!("Long MA({})", params.long_window);
        let datasets = vec![
            Dataset::default()
                .name("Close")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.close_line()))
                .data(&data.close),
            Dataset::default()
                .name(short_name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.short_ma_line()))
                .data(&data.short_ma),
            Dataset::default()
                .name(long_name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.long_ma_line()))
                .data(&data.long_ma),
            Dataset::default()
                .name("Buy")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(self.theme.signal_color(Signal::Buy)))
                .data(&data.buys),
            Dataset::default()
                .name("Sell")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(self.theme.signal_color(Signal::Sell)))
                .data(&data.sells),
        ];

        let y_mid = (y_lower + y_upper) / 2.0;
        let x_labels = vec![
            Span::raw(data.first_date.clone()),
            Span::raw(data.last_date.clone()),
        ];
        let y_labels = vec![
            Span::raw(format!("{y_lower:.2}")),
            Span::raw(format!("{y_mid:.2}")),
            Span::raw(format!("{y_upper:.2}")),
        ];

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent))
                    .style(Style::default().bg(self.theme.background)),
            )
            .x_axis(
                Axis::default()
                    .title(Span::styled("Date", Style::default().fg(self.theme.text_secondary)))
                    .style(Style::default().fg(self.theme.muted))
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled("Price", Style::default().fg(self.theme.text_secondary)))
                    .style(Style::default().fg(self.theme.muted))
                    .bounds([y_lower, y_upper])
                    .labels(y_labels),
            );

        chart.render(area, buf);

        // The plot area is approximated as the block interior minus the
        // y-label column and the two x-axis rows.
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let plot_left = inner.x + Y_LABEL_WIDTH;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(Y_LABEL_WIDTH);
        let plot_height = inner.height.saturating_sub(2);

        if plot_width == 0 || plot_height == 0 {
            return;
        }

        let markers = data
            .buys
            .iter()
            .map(|&p| (p, Signal::Buy))
            .chain(data.sells.iter().map(|&p| (p, Signal::Sell)));

        for ((x, price), signal) in markers {
            let x_frac = x / x_max;
            let y_frac = (price - y_lower) / (y_upper - y_lower);

            let px = plot_left + (x_frac * plot_width.saturating_sub(1) as f64) as u16;
            // Y is inverted (0 = top of screen)
            let py = plot_top + plot_height.saturating_sub(1)
                - (y_frac * plot_height.saturating_sub(1) as f64) as u16;

            if px < area.right().saturating_sub(1) && py >= plot_top && py < plot_top + plot_height {
                let glyph = if signal == Signal::Buy { "▲" } else { "▼" };
                let style = Style::default()
                    .fg(self.theme.signal_color(signal))
                    .add_modifier(Modifier::BOLD);
                buf.set_string(px, py, glyph, style);
            }
        }
    }
}
