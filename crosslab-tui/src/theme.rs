//! Parrot/neon theme tokens for the CrossLab TUI.
//!
//! # Color Palette
//! - **Background**: Near-black / deep charcoal (base layer)
//! - **Accent**: Electric cyan (focus, close price line)
//! - **Positive**: Neon green (Buy markers)
//! - **Negative**: Hot pink (Sell markers, errors)
//! - **Warning**: Neon orange (long MA, data errors)
//! - **Neutral**: Cool purple (short MA, Hold)
//! - **Muted**: Steel blue (axes, unfocused sliders)

use ratatui::style::Color;

use crosslab_core::Signal;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    pub fn close_line(&self) -> Color {
        self.accent
    }

    pub fn short_ma_line(&self) -> Color {
        self.neutral
    }

    pub fn long_ma_line(&self) -> Color {
        self.warning
    }

    pub fn signal_color(&self, signal: Signal) -> Color {
        match signal {
            Signal::Buy => self.positive,
            Signal::Sell => self.negative,
            Signal::Hold => self.text_secondary,
        }
    }

    /// Border color for an error panel, by error category.
    pub fn error_color(&self, category: &str) -> Color {
        match category {
            "DATA" => self.warning,
            _ => self.negative,
        }
    }
}
